//! Option enumeration and path resolution.
//!
//! Every call takes the caller's `TaxonomyPath` by reference; the taxonomy
//! itself holds no selection state.

use serde::Serialize;

use crate::taxonomy::node::{NodeId, SystemGroup};
use crate::taxonomy::tree::Taxonomy;
use crate::types::{Level, TaxonomyPath};

/// A successfully resolved selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Base code of the selected node
    pub code: String,
    pub label: String,
    pub level: Level,
    /// Trimmed labels as selected
    pub path: Vec<String>,
}

/// Valid choices for the next step of a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelOptions {
    pub level: Level,
    pub choices: Vec<String>,
}

impl Taxonomy {
    /// System labels, sorted.
    pub fn systems(&self) -> Vec<String> {
        self.systems.keys().cloned().collect()
    }

    /// Subsystem labels under a system, sorted, with the synthetic "Other"
    /// bucket appended when the system has orphan components.
    pub fn subsystems(&self, system: &str) -> Vec<String> {
        let Some(group) = self.group(system) else {
            return Vec::new();
        };

        let mut labels = self.sorted_labels(&group.subsystems);
        if !group.orphans.is_empty() && !labels.iter().any(|l| *l == self.other_label) {
            labels.push(self.other_label.clone());
        }
        labels
    }

    /// Component labels under a subsystem, sorted.
    ///
    /// For the "Other" bucket these are the system's orphan components only.
    pub fn components(&self, system: &str, subsystem: &str) -> Vec<String> {
        let Some(group) = self.group(system) else {
            return Vec::new();
        };
        self.sorted_labels(&self.component_ids(group, subsystem))
    }

    /// Choices for the step after `path`.
    pub fn options(&self, system: Option<&str>, subsystem: Option<&str>) -> LevelOptions {
        match (system.map(str::trim), subsystem.map(str::trim)) {
            (Some(system), Some(subsystem)) if !system.is_empty() && !subsystem.is_empty() => {
                LevelOptions {
                    level: Level::Component,
                    choices: self.components(system, subsystem),
                }
            }
            (Some(system), _) if !system.is_empty() => LevelOptions {
                level: Level::Subsystem,
                choices: self.subsystems(system),
            },
            _ => LevelOptions {
                level: Level::System,
                choices: self.systems(),
            },
        }
    }

    /// Resolves a 1-3 level selection to its code.
    ///
    /// `None` means "code not found". Selecting only the synthetic "Other"
    /// subsystem never resolves; one of its components must be chosen.
    pub fn resolve(&self, path: &TaxonomyPath) -> Option<Resolution> {
        let segments = path.segments();
        let group = self.group(&segments[0])?;

        let id = match path.depth() {
            Level::System => group.node?,
            Level::Subsystem => {
                let subsystem = &segments[1];
                self.find_label(&group.subsystems, subsystem)?
            }
            Level::Component => {
                let (subsystem, component) = (&segments[1], &segments[2]);
                self.find_label(&self.component_ids(group, subsystem), component)?
            }
        };

        let node = self.node(id);
        tracing::debug!(path = %path, code = %node.code, "resolved taxonomy path");
        Some(Resolution {
            code: node.code.clone(),
            label: node.label.clone(),
            level: node.level,
            path: segments,
        })
    }

    fn group(&self, system: &str) -> Option<&SystemGroup> {
        self.systems.get(system.trim())
    }

    /// Components under every subsystem with this label, or the orphans for "Other".
    ///
    /// A child whose row names a different `componente_nivel2` is left out;
    /// a child with a blank one is kept through its code link.
    fn component_ids(&self, group: &SystemGroup, subsystem: &str) -> Vec<NodeId> {
        let subsystem = subsystem.trim();
        let mut ids: Vec<NodeId> = group
            .subsystems
            .iter()
            .filter(|&&id| self.node(id).label == subsystem)
            .flat_map(|&id| self.node(id).children().iter().copied())
            .filter(|&id| {
                self.node(id)
                    .parent_level2_label
                    .as_deref()
                    .is_none_or(|label| label == subsystem)
            })
            .collect();

        if subsystem == self.other_label {
            ids.extend(group.orphans.iter().copied());
        }
        ids
    }

    /// First node (in table order) with this label.
    fn find_label(&self, ids: &[NodeId], label: &str) -> Option<NodeId> {
        let label = label.trim();
        ids.iter()
            .copied()
            .filter(|&id| self.node(id).label == label)
            .min()
    }

    fn sorted_labels(&self, ids: &[NodeId]) -> Vec<String> {
        let mut labels: Vec<String> = ids
            .iter()
            .map(|&id| self.node(id).label.clone())
            .filter(|label| !label.is_empty())
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }
}

//! Building the taxonomy tree from the flat hierarchy table.
//!
//! The table only encodes hierarchy through code prefixes and parent labels.
//! Links are resolved once here so that every later lookup walks the tree.
//!
//! - A system is identified by its label. A row's system is its
//!   `componente_nivel1`, or for a level-1 row without one, its own label.
//! - A level-2 node hangs under the level-1 node of its system.
//! - A level-3 node hangs under the level-2 node of the same system whose
//!   code is its longest proper prefix. Without one it is an orphan of the
//!   system and only reachable through the synthetic "Other" subsystem.
//!
//! A prefix only counts when it ends on a segment boundary: the next
//! character is a separator, or the prefix is a full fixed-width level-2
//! code. `100.2` is a parent of `100.2.1` but not of `100.21.5`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::LoadResult;
use crate::table::{Table, cell};
use crate::taxonomy::node::{NodeId, SystemGroup, TaxonomyNode};
use crate::types::{Level, is_blank, non_blank};

pub const CODE_COLUMN: &str = "clavero";
pub const LABEL_COLUMN: &str = "componente";
pub const LEVEL_COLUMN: &str = "nivel";
pub const LEVEL1_LABEL_COLUMN: &str = "componente_nivel1";
pub const LEVEL2_LABEL_COLUMN: &str = "componente_nivel2";

/// Width of a level-2 code in the fixed-width production scheme.
pub const LEVEL2_CODE_WIDTH: usize = 7;

/// Whether `prefix` is the code of an ancestor of `code`.
pub(crate) fn is_ancestor_code(prefix: &str, code: &str) -> bool {
    if prefix.is_empty() || prefix.len() >= code.len() || !code.starts_with(prefix) {
        return false;
    }
    let next = code.as_bytes()[prefix.len()];
    !next.is_ascii_alphanumeric() || prefix.len() == LEVEL2_CODE_WIDTH
}

/// The component taxonomy, immutable after construction.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    pub(crate) nodes: Vec<TaxonomyNode>,
    pub(crate) systems: BTreeMap<String, SystemGroup>,
    pub(crate) by_code: HashMap<String, NodeId>,
    pub(crate) other_label: String,
}

impl Taxonomy {
    /// Loads the hierarchy table.
    pub fn load(path: impl AsRef<Path>, other_label: &str) -> LoadResult<Self> {
        let table = Table::read(path)?;
        Self::from_table(&table, other_label)
    }

    /// `clavero`, `componente` and `nivel` are required; the parent label
    /// columns are optional. Rows with a blank code or an unknown level are skipped.
    pub fn from_table(table: &Table, other_label: &str) -> LoadResult<Self> {
        let code = table.require(CODE_COLUMN)?;
        let label = table.require(LABEL_COLUMN)?;
        let level = table.require(LEVEL_COLUMN)?;
        let level1 = table.column(LEVEL1_LABEL_COLUMN);
        let level2 = table.column(LEVEL2_LABEL_COLUMN);

        let mut skipped = 0usize;
        let mut nodes = Vec::with_capacity(table.len());
        for row in table.rows() {
            let (raw_code, raw_level) = (cell(row, code), cell(row, level));
            let Ok(parsed_level) = raw_level.parse::<Level>() else {
                skipped += 1;
                continue;
            };
            if is_blank(raw_code) {
                skipped += 1;
                continue;
            }

            let mut node = TaxonomyNode::new(raw_code, cell(row, label), parsed_level);
            node.parent_level1_label = level1.and_then(|i| non_blank(cell(row, i)));
            node.parent_level2_label = level2.and_then(|i| non_blank(cell(row, i)));
            nodes.push(node);
        }

        if skipped > 0 {
            tracing::warn!(
                path = %table.path().display(),
                skipped,
                "skipped taxonomy rows without a code or a valid level"
            );
        }

        let taxonomy = Self::from_nodes(nodes, other_label);
        tracing::info!(
            path = %table.path().display(),
            nodes = taxonomy.nodes.len(),
            systems = taxonomy.systems.len(),
            "loaded taxonomy"
        );
        Ok(taxonomy)
    }

    /// Links free-standing nodes into a tree. Node order is preserved.
    pub fn from_nodes(nodes: impl IntoIterator<Item = TaxonomyNode>, other_label: &str) -> Self {
        let mut taxonomy = Self {
            nodes: nodes
                .into_iter()
                .map(|mut node| {
                    node.parent = None;
                    node.children.clear();
                    node
                })
                .collect(),
            systems: BTreeMap::new(),
            by_code: HashMap::new(),
            other_label: other_label.trim().to_string(),
        };
        taxonomy.link();
        taxonomy
    }

    fn link(&mut self) {
        for (index, node) in self.nodes.iter().enumerate() {
            self.by_code
                .entry(node.code.clone())
                .or_insert(NodeId(index as u32));
        }

        self.link_systems();

        let mut unattached = 0usize;
        for index in self.ids_at(Level::Subsystem) {
            let Some(system) = self.system_of(index) else {
                unattached += 1;
                continue;
            };
            let group = self
                .systems
                .entry(system.clone())
                .or_insert_with(|| SystemGroup::new(system));
            group.subsystems.push(index);
            if let Some(parent) = group.node {
                self.attach(index, parent);
            }
        }

        for index in self.ids_at(Level::Component) {
            let Some(system) = self.system_of(index) else {
                unattached += 1;
                continue;
            };
            let code = self.nodes[index.index()].code.clone();
            let group = self
                .systems
                .entry(system.clone())
                .or_insert_with(|| SystemGroup::new(system));

            let parent = group
                .subsystems
                .iter()
                .copied()
                .filter(|&sub| is_ancestor_code(&self.nodes[sub.index()].code, &code))
                .max_by_key(|&sub| (self.nodes[sub.index()].code.len(), std::cmp::Reverse(sub)));

            match parent {
                Some(parent) => self.attach(index, parent),
                None => group.orphans.push(index),
            }
        }

        if unattached > 0 {
            tracing::warn!(unattached, "taxonomy nodes without a system");
        }
    }

    /// Level-1 rows open their own system group; the first row per label wins.
    fn link_systems(&mut self) {
        for index in self.ids_at(Level::System) {
            let node = &self.nodes[index.index()];
            let system = node
                .parent_level1_label
                .clone()
                .unwrap_or_else(|| node.label.clone());
            if system.is_empty() {
                continue;
            }
            let group = self
                .systems
                .entry(system.clone())
                .or_insert_with(|| SystemGroup::new(system));
            if group.node.is_none() && group.label == node.label {
                group.node = Some(index);
            }
        }
    }

    /// System label of a level-2 or level-3 node.
    ///
    /// Falls back to the level-1 node whose code is the longest prefix when
    /// the row carries no level-1 label.
    fn system_of(&self, id: NodeId) -> Option<String> {
        let node = &self.nodes[id.index()];
        if let Some(label) = &node.parent_level1_label {
            return Some(label.clone());
        }
        self.systems
            .values()
            .filter_map(|group| group.node.map(|n| (group, &self.nodes[n.index()].code)))
            .filter(|(_, prefix)| is_ancestor_code(prefix, &node.code))
            .max_by_key(|(_, prefix)| prefix.len())
            .map(|(group, _)| group.label.clone())
    }

    fn ids_at(&self, level: Level) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.level == level)
            .map(|(index, _)| NodeId(index as u32))
            .collect()
    }

    fn attach(&mut self, child: NodeId, parent: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &TaxonomyNode {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn other_label(&self) -> &str {
        &self.other_label
    }

    /// The first node with this code.
    #[must_use]
    pub fn find_code(&self, code: &str) -> Option<&TaxonomyNode> {
        self.by_code.get(code.trim()).map(|&id| self.node(id))
    }

    /// Labels from the system down to the node with `code`.
    ///
    /// Orphan components go through the synthetic subsystem.
    #[must_use]
    pub fn label_path(&self, code: &str) -> Option<Vec<String>> {
        let &id = self.by_code.get(code.trim())?;
        let node = self.node(id);

        let mut labels = vec![node.label.clone()];
        let mut current = node.parent;
        while let Some(parent) = current {
            let parent_node = self.node(parent);
            labels.push(parent_node.label.clone());
            current = parent_node.parent;
        }

        if node.level == Level::Component && node.parent.is_none() {
            labels.push(self.other_label.clone());
        }
        if node.level != Level::System && labels.len() < node.level.number() as usize {
            if let Some(system) = self.system_of(id) {
                labels.push(system);
            }
        }

        labels.reverse();
        Some(labels)
    }

    /// Human-readable description of a component code.
    #[must_use]
    pub fn describe(&self, code: &str) -> Option<String> {
        self.label_path(code).map(|labels| labels.join(" > "))
    }
}

//! Arena-allocated taxonomy nodes.

use serde::Serialize;

use crate::types::Level;

/// Index of a node in its taxonomy arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One taxonomy row, linked into the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyNode {
    pub code: String,
    pub label: String,
    pub level: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_level1_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_level2_label: Option<String>,
    #[serde(skip)]
    pub(crate) parent: Option<NodeId>,
    #[serde(skip)]
    pub(crate) children: Vec<NodeId>,
}

impl TaxonomyNode {
    pub fn new(code: impl Into<String>, label: impl Into<String>, level: Level) -> Self {
        Self {
            code: code.into().trim().to_string(),
            label: label.into().trim().to_string(),
            level,
            parent_level1_label: None,
            parent_level2_label: None,
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_level1(mut self, label: impl Into<String>) -> Self {
        self.parent_level1_label = crate::types::non_blank(&label.into());
        self
    }

    #[must_use]
    pub fn with_level2(mut self, label: impl Into<String>) -> Self {
        self.parent_level2_label = crate::types::non_blank(&label.into());
        self
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Components of one system that have no level-2 parent.
///
/// Presented as a synthetic subsystem; never stored as a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemGroup {
    pub label: String,
    /// The level-1 row with this label, if the table has one
    pub node: Option<NodeId>,
    pub subsystems: Vec<NodeId>,
    pub orphans: Vec<NodeId>,
}

impl SystemGroup {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

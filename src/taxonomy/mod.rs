//! Hierarchical component taxonomy (system > subsystem > component).
//!
//! Built once from the hierarchy table into an explicit tree, then queried
//! with caller-owned `TaxonomyPath` selections.

mod node;
mod resolver;
mod tree;

pub use node::{NodeId, SystemGroup, TaxonomyNode};
pub use resolver::{LevelOptions, Resolution};
pub use tree::Taxonomy;

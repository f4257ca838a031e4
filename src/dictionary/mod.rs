//! Action dictionary: definitions of action codes and the actions available
//! for each component code.

mod resolver;
mod schema;

pub use resolver::{ActionDictionary, ActionOption, compose_key};
pub use schema::{ColumnAdapter, ColumnCandidate, ColumnKind, DictionarySchema, HeaderPattern};

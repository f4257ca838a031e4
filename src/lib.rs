//! Failure-report retrieval and component key resolution.
//!
//! A free-text failure description is matched against historical work orders
//! through precomputed sentence embeddings; the component codes of the nearest
//! records are aggregated into candidates. A hierarchical component taxonomy
//! and an action dictionary turn a manual selection into a final key.

pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod display;
pub mod error;
pub mod fleet;
pub mod io;
pub mod retrieval;
pub mod session;
pub mod table;
pub mod taxonomy;
pub mod types;
pub mod vector;
pub mod workbench;

// Explicit exports for better API clarity
pub use config::Settings;
pub use corpus::{Corpus, HistoricalRecord};
pub use dictionary::{ActionDictionary, ActionOption, compose_key};
pub use error::{LoadError, LoadResult, SearchError};
pub use fleet::Fleet;
pub use retrieval::{AggregationPolicy, CodeCandidate, CodeFrequency, Decision, QueryResult, RankedRecord, SearchEngine};
pub use session::{SessionId, SessionSelection, SessionStore};
pub use taxonomy::{LevelOptions, Resolution, Taxonomy};
pub use types::{Level, RecordId, TaxonomyPath};
pub use vector::{FastEmbedEncoder, TextEncoder, VectorStore, VectorStoreWriter};
pub use workbench::{DataSet, KeySelection, RecordExplanation, Workbench};

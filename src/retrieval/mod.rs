//! Similarity retrieval: nearest historical records and their component codes.

mod aggregate;
mod engine;

pub use aggregate::{AggregationPolicy, CodeCandidate, CodeFrequency, Decision, RankedRecord};
pub use engine::{QueryResult, SearchEngine};

//! Vector layer for similarity retrieval.
//!
//! Holds the immutable store of pre-computed record embeddings, the text
//! encoder that maps queries into the same space, and the exhaustive ranker.
//!
//! # Architecture
//! Row `n` of the store is the embedding of corpus record `n`. The store is
//! produced offline (or by `clavero embed`) and never mutated online; only
//! the query vector is computed per request.

mod embedding;
mod ranker;
mod storage;
mod types;

#[cfg(test)]
pub use embedding::MockEncoder;
pub use embedding::{
    FastEmbedEncoder, SUPPORTED_MODELS, TextEncoder, normalize, parse_embedding_model,
};
pub use ranker::{Ranked, dot, rank};
pub use storage::{VectorStore, VectorStoreWriter};
pub use types::{
    EncoderError, Score, VECTOR_DIMENSION_384, VectorDimension, VectorStoreError,
};

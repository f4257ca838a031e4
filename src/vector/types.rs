//! Type-safe wrappers and error types for the vector layer.
//!
//! Dimensions and similarity scores get their own newtypes so a row length is
//! never confused with a row count, and scores always order totally.

use std::cmp::Ordering;
use thiserror::Error;

/// Output dimension of the multilingual MiniLM paraphrase model.
pub const VECTOR_DIMENSION_384: usize = 384;

/// Type-safe wrapper for vector dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension`, rejecting zero.
    pub fn new(dim: usize) -> Result<Self, EncoderError> {
        if dim == 0 {
            return Err(EncoderError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        Ok(Self(dim))
    }

    /// Creates a standard 384-dimensional vector dimension.
    #[must_use]
    pub const fn dimension_384() -> Self {
        Self(VECTOR_DIMENSION_384)
    }

    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), EncoderError> {
        if vector.len() != self.0 {
            return Err(EncoderError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Cosine similarity between a query and a stored vector.
///
/// Ordered with `f32::total_cmp`, so sorting never panics on NaN.
/// `-0.0` is stored as `0.0` so equal similarities compare equal.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Score(f32);

impl Score {
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(if value == 0.0 { 0.0 } else { value })
    }

    #[must_use]
    pub fn get(&self) -> f32 {
        self.0
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Errors raised while producing embeddings.
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error(
        "Failed to initialize embedding model: {0}\nSuggestion: Ensure you have internet connection for first-time model download"
    )]
    ModelInit(String),

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),

    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure the vector store was generated with the configured model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unknown embedding model '{0}'\nSuggestion: Use one of {1}")]
    UnknownModel(String, &'static str),
}

/// Errors raised while reading or writing a vector store file.
#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid vector store format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported array dtype '{0}', expected little-endian float32 ('<f4')")]
    UnsupportedDtype(String),

    #[error("Invalid storage version: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    #[error("Row {row} has dimension {actual}, store dimension is {expected}")]
    RowDimension {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

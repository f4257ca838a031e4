//! Error types for the retrieval workbench
//!
//! Only load-time failures are errors. Query-time misses (blank queries,
//! unknown taxonomy paths, codes absent from the dictionary) are represented
//! as empty results or sentinel strings by the components themselves.

use std::path::PathBuf;
use thiserror::Error;

use crate::vector::{EncoderError, VectorStoreError};

/// Fatal errors raised while loading the process-wide read-only state
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed table '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Table '{path}' has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Failed to load vector store '{path}': {source}")]
    VectorStore {
        path: PathBuf,
        source: VectorStoreError,
    },

    /// The corpus and the vector store are not row-aligned
    #[error(
        "Data integrity violation: corpus has {records} records but the vector store has {vectors} vectors"
    )]
    DataIntegrity { records: usize, vectors: usize },

    #[error(
        "Vector store dimension {store} does not match encoder dimension {encoder}"
    )]
    DimensionMismatch { store: usize, encoder: usize },

    #[error(transparent)]
    Encoder(#[from] EncoderError),
}

impl LoadError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::Csv { .. } => "CSV_ERROR",
            Self::MissingColumn { .. } => "MISSING_COLUMN",
            Self::VectorStore { .. } => "VECTOR_STORE_ERROR",
            Self::DataIntegrity { .. } => "DATA_INTEGRITY_ERROR",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::Encoder(_) => "ENCODER_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::FileRead { .. } => vec![
                "Check the paths in the [data] section of .clavero/settings.toml",
                "Ensure the file exists and you have read permissions",
            ],
            Self::Csv { .. } => vec![
                "Verify the file is comma-separated UTF-8 with a header row",
                "Re-export the table from the source spreadsheet",
            ],
            Self::MissingColumn { .. } => vec![
                "Adjust the column names in the [corpus] section of the settings",
                "Check the header row of the table",
            ],
            Self::VectorStore { .. } => vec![
                "Regenerate the vectors with 'clavero embed'",
                "Check that data.vectors_path points at a .npy or CLVS file",
            ],
            Self::DataIntegrity { .. } => vec![
                "The corpus changed without regenerating its vectors",
                "Run 'clavero embed' to rebuild the vector store from the current corpus",
            ],
            Self::DimensionMismatch { .. } | Self::Encoder(EncoderError::DimensionMismatch { .. }) => {
                vec![
                    "search.model must be the model that produced the vector store",
                    "Run 'clavero embed' after changing the model",
                ]
            }
            Self::Encoder(_) => vec![
                "Ensure you have internet connection for first-time model download",
                "Check that models_dir is writable",
            ],
        }
    }

    /// `true` for failures caused by inconsistent inputs rather than I/O
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Self::DataIntegrity { .. } | Self::DimensionMismatch { .. }
        )
    }
}

/// Errors raised while serving a query
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to encode query: {0}")]
    Encoding(#[from] EncoderError),
}

impl SearchError {
    pub fn status_code(&self) -> String {
        match self {
            Self::Encoding(_) => "ENCODING_ERROR".to_string(),
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Encoding(_) => vec!["Retry the query; restart if the model failed to load"],
        }
    }
}

/// Result type alias for load operations
pub type LoadResult<T> = Result<T, LoadError>;

/// Helper trait for attaching a path to I/O and CSV errors
pub trait ErrorContext<T> {
    fn with_path(self, path: &std::path::Path) -> LoadResult<T>;
}

impl<T> ErrorContext<T> for Result<T, std::io::Error> {
    fn with_path(self, path: &std::path::Path) -> LoadResult<T> {
        self.map_err(|source| LoadError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<T> ErrorContext<T> for Result<T, csv::Error> {
    fn with_path(self, path: &std::path::Path) -> LoadResult<T> {
        self.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<T> ErrorContext<T> for Result<T, VectorStoreError> {
    fn with_path(self, path: &std::path::Path) -> LoadResult<T> {
        self.map_err(|source| LoadError::VectorStore {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_and_suggestions() {
        let err = LoadError::DataIntegrity {
            records: 10,
            vectors: 9,
        };
        assert_eq!(err.status_code(), "DATA_INTEGRITY_ERROR");
        assert!(err.is_integrity());
        assert!(err.to_string().contains("10 records"));
        assert!(
            err.recovery_suggestions()
                .iter()
                .any(|s| s.contains("clavero embed"))
        );

        let err = LoadError::MissingColumn {
            path: PathBuf::from("ots.csv"),
            column: "clavero".to_string(),
        };
        assert_eq!(err.status_code(), "MISSING_COLUMN");
        assert!(!err.is_integrity());
    }

    #[test]
    fn test_error_context() {
        let io: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = io.with_path(std::path::Path::new("x.csv")).unwrap_err();
        assert!(matches!(err, LoadError::FileRead { ref path, .. } if path == std::path::Path::new("x.csv")));
    }
}

//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - operation completed and produced a result
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - inputs are inconsistent, nothing can be served
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::{LoadError, SearchError};
use crate::vector::VectorStoreError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Critical error that should halt automation (code 2)
    BlockingError = 2,

    /// Nothing matched, the command itself ran fine (code 3)
    NotFound = 3,

    /// A table could not be parsed (code 4)
    ParseError = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// `Success` if there is a result, `NotFound` otherwise.
    pub fn from_lookup<T>(result: &Option<T>) -> Self {
        match result {
            Some(_) => ExitCode::Success,
            None => ExitCode::NotFound,
        }
    }

    /// `Success` for a non-empty list, `NotFound` for an empty one.
    pub fn from_items<T>(items: &[T]) -> Self {
        if items.is_empty() {
            ExitCode::NotFound
        } else {
            ExitCode::Success
        }
    }

    /// Maps a load error to the code scripts can act on.
    pub fn from_load_error(error: &LoadError) -> Self {
        match error {
            // Misaligned inputs would serve wrong answers
            LoadError::DataIntegrity { .. } | LoadError::DimensionMismatch { .. } => {
                ExitCode::BlockingError
            }

            LoadError::FileRead { .. }
            | LoadError::VectorStore {
                source: VectorStoreError::Io(_),
                ..
            } => ExitCode::IoError,

            LoadError::Csv { .. } | LoadError::VectorStore { .. } => ExitCode::ParseError,
            LoadError::MissingColumn { .. } => ExitCode::ConfigError,
            LoadError::Encoder(crate::vector::EncoderError::UnknownModel(..)) => {
                ExitCode::ConfigError
            }
            LoadError::Encoder(_) => ExitCode::GeneralError,
        }
    }

    pub fn from_search_error(error: &SearchError) -> Self {
        match error {
            SearchError::Encoding(_) => ExitCode::GeneralError,
        }
    }

    /// Check if this exit code indicates a blocking error.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::NotFound => "Not found",
            ExitCode::ParseError => "Parse error",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
        }
    }
}

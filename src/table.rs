//! Header-addressed CSV tables.
//!
//! Every input table (corpus, taxonomy, dictionary, work orders) is read once
//! into memory through this type. Headers are trimmed; cells are kept raw.

use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use crate::error::{ErrorContext, LoadError, LoadResult};

#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Table {
    /// Reads a comma-separated file with a header row.
    pub fn read(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).with_path(path)?;
        Self::from_reader(path, file)
    }

    /// Reads from any source; `path` is only used for error messages.
    pub fn from_reader<R: Read>(path: impl AsRef<Path>, reader: R) -> LoadResult<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader
            .headers()
            .with_path(path)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .with_path(path)?;

        tracing::debug!(path = %path.display(), rows = rows.len(), "read table");

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column with exactly this (trimmed) header.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h == name)
    }

    /// Like `column`, but a missing header is a load error.
    pub fn require(&self, name: &str) -> LoadResult<usize> {
        self.column(name).ok_or_else(|| LoadError::MissingColumn {
            path: self.path.clone(),
            column: name.to_string(),
        })
    }
}

/// Cell `index` of a row, empty when the row is short.
#[must_use]
pub fn cell(row: &StringRecord, index: usize) -> &str {
    row.get(index).unwrap_or("")
}

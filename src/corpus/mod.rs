//! Historical failure-report corpus.
//!
//! Rows are kept in file order; row `n` is `RecordId(n)` and lines up with
//! row `n` of the vector store. Rows are never filtered on load, since
//! dropping one would shift every vector after it.

use std::path::Path;

use serde::Serialize;

use crate::config::CorpusColumns;
use crate::error::LoadResult;
use crate::table::{Table, cell};
use crate::types::{RecordId, non_blank};

/// One historical work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoricalRecord {
    pub id: RecordId,
    /// Free text as entered by the operator
    pub description: String,
    /// Taxonomy leaf code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_code: Option<String>,
    /// Repair action performed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_description: Option<String>,
}

/// The immutable record set.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<HistoricalRecord>,
}

impl Corpus {
    /// Loads the corpus table.
    ///
    /// `description` and `component_code` columns are required; the other two
    /// are optional and read as absent when the header is missing.
    pub fn load(path: impl AsRef<Path>, columns: &CorpusColumns) -> LoadResult<Self> {
        let table = Table::read(path)?;
        Self::from_table(&table, columns)
    }

    pub fn from_table(table: &Table, columns: &CorpusColumns) -> LoadResult<Self> {
        let description = table.require(&columns.description)?;
        let component_code = table.require(&columns.component_code)?;
        let action_code = table.column(&columns.action_code);
        let failure_description = table.column(&columns.failure_description);

        if action_code.is_none() {
            tracing::warn!(
                column = %columns.action_code,
                "corpus has no action code column, records will not be explainable"
            );
        }

        let optional = |row: &csv::StringRecord, index: Option<usize>| {
            index.and_then(|i| non_blank(cell(row, i)))
        };

        let records: Vec<HistoricalRecord> = table
            .rows()
            .iter()
            .enumerate()
            .map(|(index, row)| HistoricalRecord {
                id: RecordId::from(index),
                description: cell(row, description).trim().to_string(),
                component_code: non_blank(cell(row, component_code)),
                action_code: optional(row, action_code),
                failure_description: optional(row, failure_description),
            })
            .collect();

        let uncoded = records.iter().filter(|r| r.component_code.is_none()).count();
        tracing::info!(
            path = %table.path().display(),
            records = records.len(),
            uncoded,
            "loaded corpus"
        );

        Ok(Self { records })
    }

    /// Builds a corpus from records, renumbering ids by position.
    pub fn from_records(records: impl IntoIterator<Item = HistoricalRecord>) -> Self {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(index, mut record)| {
                record.id = RecordId::from(index);
                record
            })
            .collect();
        Self { records }
    }

    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&HistoricalRecord> {
        self.records.get(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoricalRecord> {
        self.records.iter()
    }

    /// Descriptions in row order, the text the vector store was built from.
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.description.as_str())
    }
}

impl HistoricalRecord {
    pub fn new(description: impl Into<String>, component_code: Option<&str>) -> Self {
        Self {
            id: RecordId::new(0),
            description: description.into(),
            component_code: component_code.and_then(non_blank),
            action_code: None,
            failure_description: None,
        }
    }

    #[must_use]
    pub fn with_action(mut self, action_code: &str) -> Self {
        self.action_code = non_blank(action_code);
        self
    }

    #[must_use]
    pub fn with_failure(mut self, failure_description: &str) -> Self {
        self.failure_description = non_blank(failure_description);
        self
    }
}

//! Action dictionary lookups.

use std::path::Path;

use csv::StringRecord;
use serde::Serialize;

use crate::config::DictionaryConfig;
use crate::dictionary::schema::{ColumnAdapter, DictionarySchema};
use crate::error::LoadResult;
use crate::table::{Table, cell};
use crate::types::{NO_ACTION_REGISTERED, is_blank, non_blank};

/// Position of the component code in every dictionary export.
const BASE_CODE_COLUMN: usize = 0;
/// Position of the action code suffix.
const ACTION_CODE_COLUMN: usize = 1;
/// Position of the action description in the wide export.
const ACTION_DESCRIPTION_COLUMN: usize = 3;

/// An action that can be appended to a base code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOption {
    pub action_code: String,
    pub description: String,
}

impl std::fmt::Display for ActionOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.action_code, self.description)
    }
}

/// The action reference table, bound to its schema at load.
#[derive(Debug, Clone)]
pub struct ActionDictionary {
    rows: Vec<StringRecord>,
    schema: DictionarySchema,
    description_column: usize,
}

impl ActionDictionary {
    pub fn load(path: impl AsRef<Path>, config: &DictionaryConfig) -> LoadResult<Self> {
        let table = Table::read(path)?;
        Ok(Self::from_table(&table, config))
    }

    /// Binds the table. Never fails: an unrecognized schema only makes every
    /// lookup return the sentinel.
    pub fn from_table(table: &Table, config: &DictionaryConfig) -> Self {
        let schema = ColumnAdapter::from_config(config).bind(table.headers());

        if schema.code_columns.is_empty() {
            tracing::warn!(
                path = %table.path().display(),
                "no known action code column, definitions will be unavailable"
            );
        }
        match schema.definition {
            Some(index) => tracing::debug!(
                column = %table.headers()[index],
                "definition column resolved"
            ),
            None => tracing::warn!(
                path = %table.path().display(),
                "no definition column recognized"
            ),
        }

        let description_column = if table.headers().len() > ACTION_DESCRIPTION_COLUMN {
            ACTION_DESCRIPTION_COLUMN
        } else {
            ACTION_CODE_COLUMN
        };

        Self {
            rows: table.rows().to_vec(),
            schema,
            description_column,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &DictionarySchema {
        &self.schema
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Definition of an action code, if one is registered.
    ///
    /// Code columns are tried in priority order and the first column with a
    /// matching row wins. Only that first row is consulted; a blank definition
    /// there counts as unregistered.
    #[must_use]
    pub fn lookup_definition(&self, action_code: &str) -> Option<&str> {
        if is_blank(action_code) {
            return None;
        }
        let code = action_code.trim();

        let row = self.schema.code_columns.iter().find_map(|&column| {
            self.rows
                .iter()
                .find(|row| cell(row, column).trim() == code)
        })?;

        let text = cell(row, self.schema.definition?);
        (!is_blank(text)).then(|| text.trim())
    }

    /// Definition text, or the "no action registered" sentinel.
    #[must_use]
    pub fn resolve_definition(&self, action_code: &str) -> String {
        self.lookup_definition(action_code)
            .unwrap_or(NO_ACTION_REGISTERED)
            .to_string()
    }

    /// Actions registered for a base code, excluding those without a description.
    #[must_use]
    pub fn actions_for(&self, base_code: &str) -> Vec<ActionOption> {
        let base = base_code.trim();
        if base.is_empty() {
            return Vec::new();
        }

        self.rows
            .iter()
            .filter(|row| cell(row, BASE_CODE_COLUMN).trim() == base)
            .filter_map(|row| {
                let description = non_blank(cell(row, self.description_column))?;
                Some(ActionOption {
                    action_code: cell(row, ACTION_CODE_COLUMN).trim().to_string(),
                    description,
                })
            })
            .collect()
    }
}

/// `base_code + action_code`, the composite key.
#[must_use]
pub fn compose_key(base_code: &str, action_code: &str) -> String {
    format!("{}{}", base_code.trim(), action_code.trim())
}

//! Failure history by train model.
//!
//! Equipment ids that end in `-XX` belong to model `XX`; ids without such a
//! suffix belong to no model and are what an empty model selection shows.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;

use crate::error::LoadResult;
use crate::table::{Table, cell};
use crate::types::non_blank;

const EQUIPMENT_COLUMN: &str = "equipo";
const CODE_COLUMN: &str = "clavero";
const CREATED_COLUMN: &str = "fecha_creacion";
const DESCRIPTION_COLUMN: &str = "descripcion_ot";
const FAILURE_COLUMN: &str = "descripcion_averia";
const REPAIR_COLUMN: &str = "descripcion_reparacion";

/// One historical work order with its equipment id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkOrder {
    pub equipment: String,
    pub code: String,
    pub created: String,
    pub description: String,
    pub failure_description: String,
    pub repair_description: String,
}

impl WorkOrder {
    /// Model suffix of the equipment id, if it has one.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        model_suffix(&self.equipment)
    }

    fn belongs_to(&self, model: Option<&str>) -> bool {
        match model {
            None => self.model().is_none(),
            Some(model) => last_chars(&self.equipment, 2) == model,
        }
    }
}

/// A component code with how often it appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeCount {
    pub code: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Fleet {
    orders: Vec<WorkOrder>,
}

impl Fleet {
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let table = Table::read(path)?;
        Self::from_table(&table)
    }

    /// `equipo` and `clavero` are required; text columns default to empty.
    pub fn from_table(table: &Table) -> LoadResult<Self> {
        let equipment = table.require(EQUIPMENT_COLUMN)?;
        let code = table.require(CODE_COLUMN)?;
        let optional = |name| table.column(name);
        let (created, description, failure, repair) = (
            optional(CREATED_COLUMN),
            optional(DESCRIPTION_COLUMN),
            optional(FAILURE_COLUMN),
            optional(REPAIR_COLUMN),
        );
        let text = |row: &csv::StringRecord, index: Option<usize>| {
            index
                .and_then(|i| non_blank(cell(row, i)))
                .unwrap_or_default()
        };

        let orders: Vec<WorkOrder> = table
            .rows()
            .iter()
            .map(|row| WorkOrder {
                equipment: cell(row, equipment).trim().to_string(),
                code: cell(row, code).trim().to_string(),
                created: text(row, created),
                description: text(row, description),
                failure_description: text(row, failure),
                repair_description: text(row, repair),
            })
            .collect();

        tracing::info!(path = %table.path().display(), orders = orders.len(), "loaded work orders");
        Ok(Self { orders })
    }

    pub fn from_orders(orders: Vec<WorkOrder>) -> Self {
        Self { orders }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Every model suffix present, sorted.
    pub fn models(&self) -> Vec<String> {
        self.orders
            .iter()
            .filter_map(WorkOrder::model)
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Code frequencies for a model, count descending then code ascending.
    ///
    /// `None` counts the orders whose equipment has no model suffix.
    pub fn code_counts(&self, model: Option<&str>) -> Vec<CodeCount> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for order in self.orders.iter().filter(|o| o.belongs_to(model)) {
            if !order.code.is_empty() {
                *counts.entry(order.code.as_str()).or_insert(0) += 1;
            }
        }

        let mut counts: Vec<CodeCount> = counts
            .into_iter()
            .map(|(code, count)| CodeCount {
                code: code.to_string(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
        counts
    }

    /// Orders with this code for a model, in file order.
    pub fn work_orders(&self, code: &str, model: Option<&str>) -> Vec<&WorkOrder> {
        let code = code.trim();
        self.orders
            .iter()
            .filter(|o| o.code == code && o.belongs_to(model))
            .collect()
    }
}

/// `XX` for an id ending in `-XX`.
#[must_use]
pub fn model_suffix(equipment: &str) -> Option<&str> {
    let chars: Vec<(usize, char)> = equipment.char_indices().collect();
    if chars.len() < 3 || chars[chars.len() - 3].1 != '-' {
        return None;
    }
    Some(&equipment[chars[chars.len() - 2].0..])
}

/// Turns a presented model label into a model code.
///
/// A leading `"Modelo "` is stripped; short tokens are kept, longer ones
/// reduced to their last two characters.
#[must_use]
pub fn normalize_model_choice(choice: &str) -> String {
    let mut s = choice.trim();
    if s.len() >= 7 && s.is_char_boundary(7) && s[..7].eq_ignore_ascii_case("modelo ") {
        s = s[7..].trim();
    }
    if s.chars().count() <= 3 {
        return s.to_string();
    }
    last_chars(s, 2).to_string()
}

fn last_chars(s: &str, n: usize) -> &str {
    let start = s
        .char_indices()
        .rev()
        .nth(n.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}

//! Table formatting for search results and browsing output.

use comfy_table::{
    Attribute, Cell, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};

use crate::dictionary::ActionOption;
use crate::fleet::{CodeCount, WorkOrder};
use crate::retrieval::{CodeCandidate, RankedRecord};
use crate::types::NO_ACTION_CODE;

/// Width past which long descriptions are cut.
const DESCRIPTION_WIDTH: usize = 80;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Add a row of already styled cells.
    pub fn add_cells(mut self, row: Vec<Cell>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Grouped candidates, the most probable one highlighted.
pub fn candidate_table(candidates: &[CodeCandidate]) -> String {
    let mut builder =
        TableBuilder::new().set_headers(vec!["", "Code", "Votes", "Share", "Component"]);
    for candidate in candidates {
        let marker = if candidate.most_probable {
            Cell::new("★").fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            Cell::new("")
        };
        builder = builder.add_cells(vec![
            marker,
            Cell::new(&candidate.code),
            Cell::new(candidate.count),
            Cell::new(format!("{:.0}%", candidate.share * 100.0)),
            Cell::new(&candidate.description),
        ]);
    }
    builder.build()
}

/// Nearest records with their scores.
pub fn record_table(records: &[RankedRecord]) -> String {
    let mut builder =
        TableBuilder::new().set_headers(vec!["#", "Score", "Code", "Action", "Description"]);
    for ranked in records {
        let record = &ranked.record;
        builder = builder.add_row(vec![
            record.id.to_string(),
            format!("{:.3}", ranked.score.get()),
            record.component_code.clone().unwrap_or_default(),
            record
                .action_code
                .clone()
                .unwrap_or_else(|| NO_ACTION_CODE.to_string()),
            truncate(&record.description, DESCRIPTION_WIDTH),
        ]);
    }
    builder.build()
}

/// Numbered choices for one taxonomy level.
pub fn option_list(choices: &[String]) -> String {
    choices
        .iter()
        .enumerate()
        .map(|(i, choice)| format!("{:>3}. {choice}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn action_table(base_code: &str, actions: &[ActionOption]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec!["Action", "Description", "Final code"]);
    for action in actions {
        builder = builder.add_row(vec![
            action.action_code.clone(),
            action.description.clone(),
            crate::dictionary::compose_key(base_code, &action.action_code),
        ]);
    }
    builder.build()
}

pub fn code_count_table(counts: &[CodeCount]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec!["Code", "Work orders"]);
    for count in counts {
        builder = builder.add_row(vec![count.code.clone(), count.count.to_string()]);
    }
    builder.build()
}

pub fn work_order_table(orders: &[&WorkOrder]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec![
        "Equipment",
        "Created",
        "Description",
        "Failure",
        "Repair",
    ]);
    for order in orders {
        builder = builder.add_row(vec![
            order.equipment.clone(),
            order.created.clone(),
            truncate(&order.description, DESCRIPTION_WIDTH),
            truncate(&order.failure_description, DESCRIPTION_WIDTH),
            truncate(&order.repair_description, DESCRIPTION_WIDTH),
        ]);
    }
    builder.build()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{cut}…")
}

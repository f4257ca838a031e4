//! Terminal rendering for the CLI.
//!
//! Provides styled tables, progress bars, and a shared color theme.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{create_progress_bar, create_spinner, with_spinner};
pub use tables::{
    TableBuilder, action_table, candidate_table, code_count_table, option_list, record_table,
    work_order_table,
};
pub use theme::{THEME, Theme};

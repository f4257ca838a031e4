//! Color theme for terminal output.
//!
//! Colors are dropped when `NO_COLOR` is set or stdout is not a terminal, so
//! piped output stays plain.

use console::Style;
use owo_colors::OwoColorize;
use std::sync::LazyLock;

pub static THEME: LazyLock<Theme> = LazyLock::new(Theme::default);

#[derive(Debug, Clone)]
pub struct Theme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    /// Section titles such as the decision mode
    pub header: Style,
    pub dim: Style,
    /// Component and action codes
    pub code: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: Style::new().green().bright(),
            warning: Style::new().yellow().bright(),
            error: Style::new().red().bright(),
            header: Style::new().cyan().bold(),
            dim: Style::new().dim(),
            code: Style::new().yellow(),
        }
    }
}

impl Theme {
    pub fn success_with_icon(&self, text: &str) -> String {
        if Self::should_disable_colors() {
            format!("✓ {text}")
        } else {
            format!("{} {}", "✓".green(), self.success.apply_to(text))
        }
    }

    pub fn warning_with_icon(&self, text: &str) -> String {
        if Self::should_disable_colors() {
            format!("⚠ {text}")
        } else {
            format!("{} {}", "⚠".yellow(), self.warning.apply_to(text))
        }
    }

    pub fn error_with_icon(&self, text: &str) -> String {
        if Self::should_disable_colors() {
            format!("✗ {text}")
        } else {
            format!("{} {}", "✗".red(), self.error.apply_to(text))
        }
    }

    /// `Label: value` with the value styled as a code.
    pub fn labelled_code(&self, label: &str, code: &str) -> String {
        format!("{}: {}", self.apply(&self.dim, label), self.apply(&self.code, code))
    }

    pub fn should_disable_colors() -> bool {
        use is_terminal::IsTerminal;
        std::env::var("NO_COLOR").is_ok() || !std::io::stdout().is_terminal()
    }

    /// Apply a style unless colors are disabled.
    pub fn apply<T: std::fmt::Display>(&self, style: &Style, text: T) -> String {
        if Self::should_disable_colors() {
            text.to_string()
        } else {
            style.apply_to(text).to_string()
        }
    }
}

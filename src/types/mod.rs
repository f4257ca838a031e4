use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned whenever an action code has no usable definition.
pub const NO_ACTION_REGISTERED: &str = "No action registered in the manual.";

/// Returned when a historical record carries no action code at all.
pub const NO_ACTION_CODE: &str = "No action code on record.";

/// Placeholder for a component code with no taxonomy entry.
pub const NO_DESCRIPTION: &str = "(no description)";

/// Placeholder for a record without a failure description.
pub const NO_FAILURE_DESCRIPTION: &str = "(no failure description)";

/// Stable row index of a historical record.
///
/// Row `n` of the corpus and row `n` of the vector store describe the same
/// record, so this is also the vector row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u32);

impl RecordId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for RecordId {
    fn from(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Depth of a taxonomy node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    System,
    Subsystem,
    Component,
}

impl Level {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Level::System),
            2 => Some(Level::Subsystem),
            3 => Some(Level::Component),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Level::System => 1,
            Level::Subsystem => 2,
            Level::Component => 3,
        }
    }
}

impl FromStr for Level {
    type Err = String;

    /// Accepts `"2"` as well as the `"2.0"` spreadsheets export for integer columns.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed
            .parse::<u8>()
            .ok()
            .or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.fract() == 0.0 && (1.0..=3.0).contains(v))
                    .map(|v| v as u8)
            })
            .ok_or_else(|| format!("Invalid taxonomy level: '{s}'"))?;

        Level::from_number(number).ok_or_else(|| format!("Invalid taxonomy level: '{s}'"))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A caller-owned selection through the taxonomy.
///
/// Carried by value into every resolution call; nothing about the current
/// selection lives in shared state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyPath {
    pub system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl TaxonomyPath {
    pub fn system(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            subsystem: None,
            component: None,
        }
    }

    #[must_use]
    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = Some(subsystem.into());
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Builds a path from optional CLI-style arguments, dropping blank parts.
    pub fn from_parts(system: &str, subsystem: Option<&str>, component: Option<&str>) -> Self {
        let clean = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            system: system.trim().to_string(),
            subsystem: clean(subsystem),
            component: clean(component),
        }
    }

    /// Deepest level the path reaches.
    pub fn depth(&self) -> Level {
        match (&self.subsystem, &self.component) {
            (Some(_), Some(_)) => Level::Component,
            (Some(_), None) => Level::Subsystem,
            _ => Level::System,
        }
    }

    /// Selected labels in order, trimmed.
    pub fn segments(&self) -> Vec<String> {
        let mut segments = vec![self.system.trim().to_string()];
        if let Some(subsystem) = &self.subsystem {
            segments.push(subsystem.trim().to_string());
            if let Some(component) = &self.component {
                segments.push(component.trim().to_string());
            }
        }
        segments
    }
}

impl fmt::Display for TaxonomyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join(" > "))
    }
}

/// `true` when a cell holds nothing but whitespace, or a spreadsheet NaN marker.
pub fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

/// Trims a cell and maps blank values to `None`.
pub fn non_blank(value: &str) -> Option<String> {
    if is_blank(value) {
        None
    } else {
        Some(value.trim().to_string())
    }
}

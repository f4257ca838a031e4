//! Typed column adapter for action dictionaries.
//!
//! Dictionaries arrive from different exporters with different headers. An
//! ordered list of `(pattern, kind)` candidates is bound once against the
//! header row; lookups then read typed, index-based columns.

use crate::config::DictionaryConfig;

/// What a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Action code the definition lookup matches against
    Code,
    /// Human-readable definition text
    Definition,
}

/// How a candidate recognizes its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderPattern {
    /// Header equals the name after trimming
    Exact(String),
    /// Lowercased header contains any of the (lowercase) needles
    ContainsAny(Vec<String>),
}

impl HeaderPattern {
    #[must_use]
    pub fn matches(&self, header: &str) -> bool {
        match self {
            HeaderPattern::Exact(name) => header.trim() == name.trim(),
            HeaderPattern::ContainsAny(needles) => {
                let header = header.to_lowercase();
                needles.iter().any(|needle| header.contains(&needle.to_lowercase()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCandidate {
    pub pattern: HeaderPattern,
    pub kind: ColumnKind,
}

/// Candidates in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAdapter {
    candidates: Vec<ColumnCandidate>,
}

impl ColumnAdapter {
    pub fn new(candidates: Vec<ColumnCandidate>) -> Self {
        Self { candidates }
    }

    /// Exact code headers, then exact definition headers, then definition keywords.
    pub fn from_config(config: &DictionaryConfig) -> Self {
        let exact = |names: &[String], kind| {
            names
                .iter()
                .map(move |name| ColumnCandidate {
                    pattern: HeaderPattern::Exact(name.clone()),
                    kind,
                })
                .collect::<Vec<_>>()
        };

        let mut candidates = exact(&config.code_columns, ColumnKind::Code);
        candidates.extend(exact(&config.definition_columns, ColumnKind::Definition));
        if !config.definition_keywords.is_empty() {
            candidates.push(ColumnCandidate {
                pattern: HeaderPattern::ContainsAny(config.definition_keywords.clone()),
                kind: ColumnKind::Definition,
            });
        }
        Self { candidates }
    }

    /// Binds the candidates to a header row.
    ///
    /// Every present code column is kept, in candidate order. Only the first
    /// definition candidate that matches is kept; within a keyword candidate
    /// the leftmost matching header wins.
    pub fn bind(&self, headers: &[String]) -> DictionarySchema {
        let mut code_columns = Vec::new();
        let mut definition = None;

        for candidate in &self.candidates {
            let Some(index) = headers.iter().position(|h| candidate.pattern.matches(h)) else {
                continue;
            };
            match candidate.kind {
                ColumnKind::Code => {
                    if !code_columns.contains(&index) {
                        code_columns.push(index);
                    }
                }
                ColumnKind::Definition => {
                    // A code column never doubles as the definition
                    if definition.is_none() && !code_columns.contains(&index) {
                        definition = Some(index);
                    }
                }
            }
        }

        DictionarySchema {
            code_columns,
            definition,
        }
    }
}

/// Column positions resolved for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionarySchema {
    /// Code columns in priority order
    pub code_columns: Vec<usize>,
    pub definition: Option<usize>,
}

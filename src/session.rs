//! Per-session final selections.
//!
//! Only the outcome of a finished selection is kept, keyed by session. Ranked
//! lists, frequency maps and in-progress paths stay with the request that
//! produced them.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::types::TaxonomyPath;

/// Opaque identifier of an interacting user or client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The last completed selection of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSelection {
    pub path: TaxonomyPath,
    pub base_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_code: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SessionSelection {
    pub fn new(path: TaxonomyPath, base_code: impl Into<String>) -> Self {
        Self {
            path,
            base_code: base_code.into(),
            final_code: None,
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_final_code(mut self, final_code: impl Into<String>) -> Self {
        self.final_code = Some(final_code.into());
        self
    }
}

/// Concurrent map of session to its last selection.
///
/// Entries live until `clear` or `evict_idle` removes them. A long-running
/// host should call `evict_idle` periodically; the one-shot CLI never needs to.
#[derive(Debug, Default)]
pub struct SessionStore {
    selections: DashMap<SessionId, SessionSelection>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the session's selection, returning the previous one.
    pub fn record(&self, session: SessionId, selection: SessionSelection) -> Option<SessionSelection> {
        tracing::debug!(%session, code = %selection.base_code, "recorded selection");
        self.selections.insert(session, selection)
    }

    #[must_use]
    pub fn get(&self, session: &SessionId) -> Option<SessionSelection> {
        self.selections.get(session).map(|entry| entry.value().clone())
    }

    /// Sets the final code on an existing selection. Returns `false` if the
    /// session has none.
    pub fn set_final_code(&self, session: &SessionId, final_code: impl Into<String>) -> bool {
        match self.selections.get_mut(session) {
            Some(mut entry) => {
                entry.final_code = Some(final_code.into());
                entry.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn clear(&self, session: &SessionId) -> Option<SessionSelection> {
        self.selections.remove(session).map(|(_, selection)| selection)
    }

    /// Drops selections not updated within `max_idle`; returns how many went.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let before = self.selections.len();
        self.selections.retain(|_, selection| selection.updated_at >= cutoff);
        let evicted = before.saturating_sub(self.selections.len());
        if evicted > 0 {
            tracing::debug!(evicted, "evicted idle sessions");
        }
        evicted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

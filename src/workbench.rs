//! The process-wide read-only state and the operations served over it.
//!
//! `DataSet::load` reads every artifact once and fails fast when the corpus
//! and vector store disagree. A `Workbench` is then immutable except for the
//! per-session selection store, and can be shared across threads.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Settings;
use crate::corpus::{Corpus, HistoricalRecord};
use crate::dictionary::{ActionDictionary, ActionOption, compose_key};
use crate::error::{ErrorContext, LoadError, LoadResult, SearchError};
use crate::fleet::Fleet;
use crate::retrieval::{AggregationPolicy, QueryResult, SearchEngine};
use crate::session::{SessionId, SessionSelection, SessionStore};
use crate::taxonomy::{LevelOptions, Resolution, Taxonomy};
use crate::types::{NO_ACTION_CODE, NO_FAILURE_DESCRIPTION, RecordId, TaxonomyPath};
use crate::vector::{TextEncoder, VectorStore};

/// Every input artifact, loaded and cross-checked.
#[derive(Debug, Clone)]
pub struct DataSet {
    pub corpus: Arc<Corpus>,
    pub store: Arc<VectorStore>,
    pub dictionary: Arc<ActionDictionary>,
    pub taxonomy: Arc<Taxonomy>,
    pub fleet: Option<Arc<Fleet>>,
}

impl DataSet {
    /// Loads the artifacts named in `settings`.
    ///
    /// # Errors
    /// Any unreadable or malformed artifact, and `DataIntegrity` when the
    /// vector store row count differs from the corpus record count.
    pub fn load(settings: &Settings) -> LoadResult<Self> {
        let data = &settings.data;

        let corpus = Corpus::load(settings.resolve_path(&data.corpus_path), &settings.corpus)?;
        let vectors_path = settings.resolve_path(&data.vectors_path);
        let store = VectorStore::open(&vectors_path).with_path(&vectors_path)?;
        check_alignment(&corpus, &store)?;

        let dictionary = ActionDictionary::load(
            settings.resolve_path(&data.dictionary_path),
            &settings.dictionary,
        )?;
        let taxonomy = Taxonomy::load(
            settings.resolve_path(&data.taxonomy_path),
            &settings.taxonomy.other_label,
        )?;
        let fleet = match &data.work_orders_path {
            Some(path) => load_optional_fleet(&settings.resolve_path(path))?,
            None => None,
        };

        Ok(Self {
            corpus: Arc::new(corpus),
            store: Arc::new(store),
            dictionary: Arc::new(dictionary),
            taxonomy: Arc::new(taxonomy),
            fleet: fleet.map(Arc::new),
        })
    }
}

/// Fails unless corpus row `n` has a vector row `n` and vice versa.
pub fn check_alignment(corpus: &Corpus, store: &VectorStore) -> LoadResult<()> {
    if corpus.len() != store.len() {
        tracing::error!(
            records = corpus.len(),
            vectors = store.len(),
            "corpus and vector store are not aligned"
        );
        return Err(LoadError::DataIntegrity {
            records: corpus.len(),
            vectors: store.len(),
        });
    }
    Ok(())
}

fn load_optional_fleet(path: &Path) -> LoadResult<Option<Fleet>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no work-order table, fleet browsing disabled");
        return Ok(None);
    }
    Fleet::load(path).map(Some)
}

/// What a historical record says was done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordExplanation {
    pub record: HistoricalRecord,
    pub failure_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_code: Option<String>,
    pub action_definition: String,
}

/// A resolved base code together with its action choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySelection {
    pub resolution: Resolution,
    pub actions: Vec<ActionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionOption>,
    /// `base_code + action_code` once an offered action is chosen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_code: Option<String>,
}

/// Facade over the read-only data set.
pub struct Workbench {
    engine: SearchEngine,
    dictionary: Arc<ActionDictionary>,
    taxonomy: Arc<Taxonomy>,
    fleet: Option<Arc<Fleet>>,
    sessions: SessionStore,
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("engine", &self.engine)
            .field("taxonomy_nodes", &self.taxonomy.len())
            .field("dictionary_rows", &self.dictionary.len())
            .field("fleet", &self.fleet.as_ref().map(|f| f.len()))
            .finish()
    }
}

impl Workbench {
    /// Wires the data set to an encoder.
    ///
    /// # Errors
    /// `DataIntegrity` or `DimensionMismatch` when the inputs disagree.
    pub fn new(
        data: DataSet,
        encoder: Arc<dyn TextEncoder>,
        policy: AggregationPolicy,
    ) -> LoadResult<Self> {
        let engine = SearchEngine::new(data.corpus, data.store, encoder, policy)?;
        tracing::info!(
            records = engine.corpus().len(),
            top_k = policy.top_k,
            "workbench ready"
        );
        Ok(Self {
            engine,
            dictionary: data.dictionary,
            taxonomy: data.taxonomy,
            fleet: data.fleet,
            sessions: SessionStore::new(),
        })
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        self.engine.corpus()
    }

    #[must_use]
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    #[must_use]
    pub fn dictionary(&self) -> &ActionDictionary {
        &self.dictionary
    }

    #[must_use]
    pub fn fleet(&self) -> Option<&Fleet> {
        self.fleet.as_deref()
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Nearest records and grouped codes. `k` defaults to the policy's `top_k`.
    pub fn search(&self, query: &str, k: Option<usize>) -> Result<QueryResult, SearchError> {
        let k = k.unwrap_or(self.engine.policy().top_k);
        self.engine
            .search_with(query, k, |code| self.taxonomy.describe(code))
    }

    /// Definition of an action code, or the sentinel.
    #[must_use]
    pub fn resolve_definition(&self, action_code: &str) -> String {
        self.dictionary.resolve_definition(action_code)
    }

    /// Failure and action details of a record. `None` for an unknown id.
    #[must_use]
    pub fn explain(&self, id: RecordId) -> Option<RecordExplanation> {
        explain(self.corpus(), &self.dictionary, id)
    }

    #[must_use]
    pub fn resolve_taxonomy(&self, path: &TaxonomyPath) -> Option<Resolution> {
        self.taxonomy.resolve(path)
    }

    #[must_use]
    pub fn taxonomy_options(&self, system: Option<&str>, subsystem: Option<&str>) -> LevelOptions {
        self.taxonomy.options(system, subsystem)
    }

    #[must_use]
    pub fn actions_for(&self, base_code: &str) -> Vec<ActionOption> {
        self.dictionary.actions_for(base_code)
    }

    /// Resolves a path and, when `action_code` is one of the offered actions,
    /// composes the final key.
    #[must_use]
    pub fn select_key(&self, path: &TaxonomyPath, action_code: Option<&str>) -> Option<KeySelection> {
        select_key(&self.taxonomy, &self.dictionary, path, action_code)
    }

    /// Like `select_key`, also remembering the outcome for `session`.
    pub fn select_for_session(
        &self,
        session: SessionId,
        path: &TaxonomyPath,
        action_code: Option<&str>,
    ) -> Option<KeySelection> {
        let selection = self.select_key(path, action_code)?;
        let mut stored = SessionSelection::new(path.clone(), selection.resolution.code.clone());
        if let Some(final_code) = &selection.final_code {
            stored = stored.with_final_code(final_code.clone());
        }
        self.sessions.record(session, stored);
        Some(selection)
    }
}

/// Record explanation without an encoder.
#[must_use]
pub fn explain(
    corpus: &Corpus,
    dictionary: &ActionDictionary,
    id: RecordId,
) -> Option<RecordExplanation> {
    let record = corpus.get(id)?;
    let action_definition = match &record.action_code {
        Some(code) => dictionary.resolve_definition(code),
        None => NO_ACTION_CODE.to_string(),
    };
    Some(RecordExplanation {
        failure_description: record
            .failure_description
            .clone()
            .unwrap_or_else(|| NO_FAILURE_DESCRIPTION.to_string()),
        action_code: record.action_code.clone(),
        action_definition,
        record: record.clone(),
    })
}

/// Key selection over a taxonomy and dictionary, without a loaded corpus.
#[must_use]
pub fn select_key(
    taxonomy: &Taxonomy,
    dictionary: &ActionDictionary,
    path: &TaxonomyPath,
    action_code: Option<&str>,
) -> Option<KeySelection> {
    let resolution = taxonomy.resolve(path)?;
    let actions = dictionary.actions_for(&resolution.code);

    let action = action_code
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .and_then(|code| actions.iter().find(|a| a.action_code == code).cloned());
    let final_code = action
        .as_ref()
        .map(|a| compose_key(&resolution.code, &a.action_code));

    Some(KeySelection {
        resolution,
        actions,
        action,
        final_code,
    })
}

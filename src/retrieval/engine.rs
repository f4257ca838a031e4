//! Query pipeline: encode, rank, aggregate.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::corpus::Corpus;
use crate::error::{LoadError, SearchError};
use crate::retrieval::aggregate::{AggregationPolicy, CodeFrequency, Decision, RankedRecord};
use crate::vector::{TextEncoder, VectorStore, rank};

/// Outcome of one search. Owned by the caller; nothing is retained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub query: String,
    /// Top-K records, best first
    pub ranked: Vec<RankedRecord>,
    pub frequency: CodeFrequency,
    pub decision: Decision,
}

impl QueryResult {
    /// Result for a query with nothing to search for.
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ranked: Vec::new(),
            frequency: CodeFrequency::default(),
            decision: Decision::Fallback(Vec::new()),
        }
    }

    /// Top-K records carrying `code`, in ranked order.
    pub fn records_for(&self, code: &str) -> Vec<&RankedRecord> {
        let code = code.trim();
        self.ranked
            .iter()
            .filter(|r| r.record.component_code.as_deref() == Some(code))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Similarity search over the read-only corpus and vector store.
///
/// Cheap to clone; clones share the loaded data.
#[derive(Clone)]
pub struct SearchEngine {
    corpus: Arc<Corpus>,
    store: Arc<VectorStore>,
    encoder: Arc<dyn TextEncoder>,
    policy: AggregationPolicy,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("records", &self.corpus.len())
            .field("dimension", &self.store.dimension().get())
            .field("policy", &self.policy)
            .finish()
    }
}

impl SearchEngine {
    /// Wires the pipeline after checking the inputs agree with each other.
    ///
    /// # Errors
    /// `DataIntegrity` when corpus and store row counts differ,
    /// `DimensionMismatch` when the encoder produces vectors of another length.
    pub fn new(
        corpus: Arc<Corpus>,
        store: Arc<VectorStore>,
        encoder: Arc<dyn TextEncoder>,
        policy: AggregationPolicy,
    ) -> Result<Self, LoadError> {
        if corpus.len() != store.len() {
            return Err(LoadError::DataIntegrity {
                records: corpus.len(),
                vectors: store.len(),
            });
        }
        if !store.is_empty() && store.dimension() != encoder.dimension() {
            return Err(LoadError::DimensionMismatch {
                store: store.dimension().get(),
                encoder: encoder.dimension().get(),
            });
        }

        Ok(Self {
            corpus,
            store,
            encoder,
            policy,
        })
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    #[must_use]
    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    /// Searches with the configured `top_k` and no code descriptions.
    pub fn search(&self, query: &str) -> Result<QueryResult, SearchError> {
        self.search_with(query, self.policy.top_k, |_| None)
    }

    /// Searches the `k` nearest records and aggregates their codes.
    ///
    /// A blank query short-circuits to an empty fallback result.
    pub fn search_with<F>(&self, query: &str, k: usize, describe: F) -> Result<QueryResult, SearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("blank query, returning empty result");
            return Ok(QueryResult::empty(query));
        }

        let started = Instant::now();
        let vector = self.encoder.encode(query)?;
        let hits = rank(&vector, &self.store, k)?;

        let ranked: Vec<RankedRecord> = hits
            .into_iter()
            .filter_map(|hit| {
                self.corpus.get(hit.id).map(|record| RankedRecord {
                    record: record.clone(),
                    score: hit.score,
                })
            })
            .collect();

        let policy = AggregationPolicy {
            top_k: k,
            ..self.policy
        };
        let (frequency, decision) = policy.aggregate(&ranked, describe);

        tracing::debug!(
            k,
            hits = ranked.len(),
            coded = frequency.total(),
            mode = decision.mode(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "search complete"
        );

        Ok(QueryResult {
            query: query.to_string(),
            ranked,
            frequency,
            decision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::HistoricalRecord;
    use crate::vector::MockEncoder;

    fn engine() -> SearchEngine {
        let encoder = MockEncoder::new(vec!["freno", "puerta"]);
        let records = vec![
            HistoricalRecord::new("freno gastado", Some("100.2.1")),
            HistoricalRecord::new("puerta bloqueada", Some("200.1.1")),
            HistoricalRecord::new("freno ruidoso", Some("100.2.1")),
            HistoricalRecord::new("luz fundida", None),
        ];
        let vectors = encoder
            .encode_batch(&records.iter().map(|r| r.description.as_str()).collect::<Vec<_>>())
            .unwrap();
        SearchEngine::new(
            Arc::new(Corpus::from_records(records)),
            Arc::new(VectorStore::from_rows(vectors).unwrap()),
            Arc::new(encoder),
            AggregationPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_search_groups_dominant_code() {
        let result = engine().search("freno").unwrap();
        assert_eq!(result.ranked.len(), 4);
        assert_eq!(result.ranked[0].record.component_code.as_deref(), Some("100.2.1"));

        let Decision::Grouped(candidates) = &result.decision else {
            panic!("expected grouped");
        };
        assert_eq!(candidates[0].code, "100.2.1");
        assert_eq!(result.records_for("100.2.1").len(), 2);
        assert!(result.records_for("999").is_empty());
    }

    #[test]
    fn test_blank_query_is_empty_not_error() {
        let result = engine().search("   ").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.decision, Decision::Fallback(Vec::new()));
    }

    #[test]
    fn test_search_is_repeatable() {
        let engine = engine();
        assert_eq!(engine.search("puerta").unwrap(), engine.search("puerta").unwrap());
    }

    #[test]
    fn test_misaligned_inputs_are_rejected() {
        let encoder = MockEncoder::new(vec!["freno"]);
        let store = VectorStore::from_rows(vec![vec![1.0, 0.0]]).unwrap();
        let corpus = Corpus::from_records(vec![
            HistoricalRecord::new("a", None),
            HistoricalRecord::new("b", None),
        ]);
        let err = SearchEngine::new(
            Arc::new(corpus),
            Arc::new(store),
            Arc::new(encoder),
            AggregationPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DataIntegrity { records: 2, vectors: 1 }));
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let encoder = MockEncoder::new(vec!["freno", "puerta"]);
        let store = VectorStore::from_rows(vec![vec![1.0, 0.0]]).unwrap();
        let corpus = Corpus::from_records(vec![HistoricalRecord::new("a", None)]);
        let err = SearchEngine::new(
            Arc::new(corpus),
            Arc::new(store),
            Arc::new(encoder),
            AggregationPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DimensionMismatch { store: 2, encoder: 3 }));
    }
}

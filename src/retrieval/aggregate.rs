//! Candidate aggregation over ranked records.
//!
//! The top-K records vote for their component code. A code is offered as a
//! grouped candidate only when its share of the coded votes strictly exceeds
//! the threshold; when none does, the nearest records are shown instead.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::SearchConfig;
use crate::corpus::HistoricalRecord;
use crate::types::NO_DESCRIPTION;
use crate::vector::Score;

/// A corpus record with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    pub record: HistoricalRecord,
    pub score: Score,
}

impl RankedRecord {
    /// Score descending, then corpus order.
    fn rank_order(a: &Self, b: &Self) -> Ordering {
        b.score.cmp(&a.score).then(a.record.id.cmp(&b.record.id))
    }
}

/// Votes per component code among the top-K records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CodeFrequency {
    counts: BTreeMap<String, usize>,
    total: usize,
}

impl CodeFrequency {
    /// Counts the codes of `records`, skipping records without one.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a RankedRecord>) -> Self {
        let mut counts = BTreeMap::new();
        for ranked in records {
            if let Some(code) = &ranked.record.component_code {
                *counts.entry(code.clone()).or_insert(0) += 1;
            }
        }
        let total = counts.values().sum();
        Self { counts, total }
    }

    /// Builds a frequency map from explicit counts; the total is their sum.
    pub fn from_counts<S: Into<String>>(counts: impl IntoIterator<Item = (S, usize)>) -> Self {
        let counts: BTreeMap<String, usize> = counts
            .into_iter()
            .map(|(code, count)| (code.into(), count))
            .filter(|(_, count)| *count > 0)
            .collect();
        let total = counts.values().sum();
        Self { counts, total }
    }

    /// Overrides the denominator, for maps that only list some of the codes.
    ///
    /// The total never drops below the sum of the listed counts.
    #[must_use]
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total.max(self.counts.values().sum());
        self
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn count(&self, code: &str) -> usize {
        self.counts.get(code).copied().unwrap_or(0)
    }

    /// `count / total`, zero when nothing was counted.
    #[must_use]
    pub fn share(&self, code: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(code) as f64 / self.total as f64
    }

    /// `(code, count)` in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(code, count)| (code.as_str(), *count))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Codes whose share strictly exceeds `threshold`, share descending then code ascending.
    pub fn above(&self, threshold: f64) -> Vec<(&str, usize, f64)> {
        let mut above: Vec<(&str, usize, f64)> = self
            .iter()
            .map(|(code, count)| (code, count, self.share(code)))
            .filter(|(_, _, share)| *share > threshold)
            .collect();
        above.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(b.0)));
        above
    }
}

/// One grouped component code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeCandidate {
    pub code: String,
    pub count: usize,
    pub share: f64,
    pub description: String,
    pub most_probable: bool,
}

/// What to present for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "items", rename_all = "snake_case")]
pub enum Decision {
    /// Codes above the share threshold, first one most probable
    Grouped(Vec<CodeCandidate>),
    /// No code is strong enough: the nearest records
    Fallback(Vec<RankedRecord>),
}

impl Decision {
    #[must_use]
    pub fn is_grouped(&self) -> bool {
        matches!(self, Decision::Grouped(_))
    }

    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Decision::Grouped(_) => "grouped",
            Decision::Fallback(_) => "fallback",
        }
    }
}

/// Tunables of the grouping decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationPolicy {
    pub top_k: usize,
    pub share_threshold: f64,
    pub fallback_limit: usize,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for AggregationPolicy {
    fn from(config: &SearchConfig) -> Self {
        Self {
            top_k: config.top_k,
            share_threshold: config.share_threshold,
            fallback_limit: config.fallback_limit,
        }
    }
}

impl AggregationPolicy {
    /// Grouped or fallback decision for a frequency map.
    ///
    /// `ranked` supplies the fallback records and must already be limited to top-K.
    pub fn decide<F>(&self, frequency: &CodeFrequency, ranked: &[RankedRecord], describe: F) -> Decision
    where
        F: Fn(&str) -> Option<String>,
    {
        let above = frequency.above(self.share_threshold);
        if !above.is_empty() {
            let candidates = above
                .into_iter()
                .enumerate()
                .map(|(position, (code, count, share))| CodeCandidate {
                    code: code.to_string(),
                    count,
                    share,
                    description: describe(code).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
                    most_probable: position == 0,
                })
                .collect();
            return Decision::Grouped(candidates);
        }

        let mut nearest = ranked.to_vec();
        nearest.sort_by(RankedRecord::rank_order);
        nearest.truncate(self.fallback_limit);
        Decision::Fallback(nearest)
    }

    /// Takes the top-K of `ranked`, counts their codes and decides.
    pub fn aggregate<F>(&self, ranked: &[RankedRecord], describe: F) -> (CodeFrequency, Decision)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut top: Vec<RankedRecord> = ranked.to_vec();
        top.sort_by(RankedRecord::rank_order);
        top.truncate(self.top_k);

        let frequency = CodeFrequency::from_records(&top);
        let decision = self.decide(&frequency, &top, describe);
        (frequency, decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;

    fn ranked(id: u32, score: f32, code: Option<&str>) -> RankedRecord {
        let mut record = HistoricalRecord::new(format!("record {id}"), code);
        record.id = RecordId::new(id);
        RankedRecord {
            record,
            score: Score::new(score),
        }
    }

    fn no_description(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_share_above_threshold_groups() {
        let frequency = CodeFrequency::from_counts([("A", 2), ("B", 1)]).with_total(10);
        assert_eq!(frequency.share("A"), 0.2);
        assert_eq!(frequency.share("B"), 0.1);

        let decision = AggregationPolicy::default().decide(&frequency, &[], no_description);
        match decision {
            Decision::Grouped(candidates) => {
                assert_eq!(candidates.len(), 1);
                assert_eq!(candidates[0].code, "A");
                assert!(candidates[0].most_probable);
                assert_eq!(candidates[0].description, NO_DESCRIPTION);
            }
            other => panic!("expected grouped, got {other:?}"),
        }
    }

    #[test]
    fn test_share_equal_to_threshold_falls_back() {
        let frequency = CodeFrequency::from_counts([("A", 1), ("B", 1), ("C", 1)]).with_total(10);
        let records: Vec<RankedRecord> = (0..10)
            .map(|i| ranked(i, 1.0 - i as f32 * 0.05, None))
            .collect();

        let decision = AggregationPolicy::default().decide(&frequency, &records, no_description);
        match decision {
            Decision::Fallback(nearest) => {
                let ids: Vec<u32> = nearest.iter().map(|r| r.record.id.0).collect();
                assert_eq!(ids, vec![0, 1, 2, 3, 4]);
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_total_falls_back() {
        let frequency = CodeFrequency::default();
        assert_eq!(frequency.share("A"), 0.0);
        let decision = AggregationPolicy::default().decide(&frequency, &[], no_description);
        assert_eq!(decision, Decision::Fallback(Vec::new()));
    }

    #[test]
    fn test_grouped_order_share_then_code() {
        let frequency = CodeFrequency::from_counts([("C", 3), ("B", 3), ("A", 4)]);
        let decision = AggregationPolicy::default().decide(&frequency, &[], |code| {
            (code == "B").then(|| "Caliper".to_string())
        });
        let Decision::Grouped(candidates) = decision else {
            panic!("expected grouped");
        };
        let codes: Vec<&str> = candidates.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
        assert_eq!(candidates[1].description, "Caliper");
        assert_eq!(
            candidates.iter().filter(|c| c.most_probable).count(),
            1
        );
    }

    #[test]
    fn test_aggregate_counts_only_top_k_coded_records() {
        let records = vec![
            ranked(3, 0.9, Some("A")),
            ranked(0, 0.9, None),
            ranked(1, 0.8, Some("A")),
            ranked(2, 0.1, Some("B")),
        ];
        let policy = AggregationPolicy {
            top_k: 3,
            ..AggregationPolicy::default()
        };

        let (frequency, decision) = policy.aggregate(&records, no_description);
        assert_eq!(frequency.total(), 2);
        assert_eq!(frequency.count("A"), 2);
        assert_eq!(frequency.count("B"), 0);
        assert!(decision.is_grouped());
    }

    #[test]
    fn test_fallback_ties_keep_corpus_order() {
        let records = vec![
            ranked(4, 0.5, None),
            ranked(2, 0.5, None),
            ranked(9, 0.7, None),
        ];
        let (_, decision) = AggregationPolicy::default().aggregate(&records, no_description);
        let Decision::Fallback(nearest) = decision else {
            panic!("expected fallback");
        };
        let ids: Vec<u32> = nearest.iter().map(|r| r.record.id.0).collect();
        assert_eq!(ids, vec![9, 2, 4]);
    }
}

//! Query -> ranked records -> grouped or fallback decision, over fixture data.

use crate::common::{KeywordEncoder, TestProject};
use clavero::retrieval::{AggregationPolicy, Decision};
use clavero::types::{NO_ACTION_CODE, NO_ACTION_REGISTERED, NO_FAILURE_DESCRIPTION, RecordId};
use clavero::vector::{TextEncoder, VectorStore, rank};
use clavero::workbench::{DataSet, Workbench};
use std::sync::Arc;

#[test]
fn test_grouped_candidates_for_clear_query() {
    let project = TestProject::new();
    let workbench = project.workbench();

    let result = workbench.search("freno ruidoso", None).unwrap();
    let ids: Vec<u32> = result.ranked.iter().map(|r| r.record.id.0).collect();
    // Records 1 and 2 encode identically; the tie keeps corpus order
    assert_eq!(ids, vec![0, 1, 2]);

    let Decision::Grouped(candidates) = &result.decision else {
        panic!("expected grouped candidates, got {:?}", result.decision);
    };
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].code, "100.2.1");
    assert_eq!(candidates[0].count, 2);
    assert!(candidates[0].most_probable);
    assert_eq!(candidates[0].description, "Brakes > Caliper > Piston");
    assert_eq!(candidates[1].code, "100.2.2");
    assert!(!candidates[1].most_probable);
    assert!(candidates[0].share > candidates[1].share);
}

#[test]
fn test_uncoded_records_do_not_vote() {
    let project = TestProject::new();
    let workbench = project.workbench();

    let result = workbench.search("luz", None).unwrap();
    assert_eq!(result.ranked.len(), 3);
    assert_eq!(result.ranked[0].record.id, RecordId::new(8));
    assert!(result.ranked[0].record.component_code.is_none());
    assert_eq!(result.frequency.total(), 2);

    // Equal shares fall back to code order
    let Decision::Grouped(candidates) = &result.decision else {
        panic!("expected grouped candidates");
    };
    let codes: Vec<&str> = candidates.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["100.2.1", "400.1.1"]);
}

#[test]
fn test_fallback_when_no_code_exceeds_threshold() {
    let project = TestProject::new();
    let settings = project.settings();
    let data = DataSet::load(&settings).unwrap();
    let policy = AggregationPolicy {
        top_k: 3,
        share_threshold: 0.9,
        fallback_limit: 2,
    };
    let workbench = Workbench::new(data, Arc::new(KeywordEncoder::new()), policy).unwrap();

    let result = workbench.search("freno ruidoso", None).unwrap();
    match &result.decision {
        Decision::Fallback(records) => {
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].record.id, RecordId::new(0));
            assert!(records[0].score >= records[1].score);
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert_eq!(result.decision.mode(), "fallback");
}

#[test]
fn test_blank_query_is_an_empty_state() {
    let project = TestProject::new();
    let workbench = project.workbench();

    let result = workbench.search("   ", None).unwrap();
    assert!(result.is_empty());
    assert!(result.frequency.is_empty());
    assert_eq!(result.decision, Decision::Fallback(Vec::new()));
}

#[test]
fn test_k_is_clamped_and_scores_descend() {
    let project = TestProject::new();
    let workbench = project.workbench();

    let result = workbench.search("puerta ruidosa", Some(50)).unwrap();
    assert_eq!(result.ranked.len(), 10);
    for pair in result.ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
        if pair[0].score == pair[1].score {
            assert!(pair[0].record.id < pair[1].record.id);
        }
    }
    assert_eq!(result.ranked[0].record.id, RecordId::new(5));
}

#[test]
fn test_ranker_matches_brute_force() {
    let project = TestProject::new();
    let store = VectorStore::open(project.vectors_path()).unwrap();
    let query = KeywordEncoder::new().encode("aire caliente").unwrap();

    let ranked = rank(&query, &store, 2).unwrap();
    let mut expected: Vec<(usize, f32)> = store
        .rows()
        .enumerate()
        .map(|(i, row)| (i, row.iter().zip(&query).map(|(a, b)| a * b).sum()))
        .collect();
    expected.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    assert_eq!(ranked[0].id.index(), expected[0].0);
    assert_eq!(ranked[1].id.index(), expected[1].0);
    assert!((ranked[0].score.get() - expected[0].1).abs() < 1e-6);
}

#[test]
fn test_records_for_selected_candidate() {
    let project = TestProject::new();
    let workbench = project.workbench();

    let result = workbench.search("freno ruidoso", None).unwrap();
    let records = result.records_for(" 100.2.1 ");
    let ids: Vec<u32> = records.iter().map(|r| r.record.id.0).collect();
    assert_eq!(ids, vec![0, 1]);
    assert!(result.records_for("999").is_empty());
}

#[test]
fn test_repeated_queries_are_identical() {
    let project = TestProject::new();
    let workbench = project.workbench();

    let first = workbench.search("puerta no cierra", None).unwrap();
    let second = workbench.search("puerta no cierra", None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_explain_records() {
    let project = TestProject::new();
    let workbench = project.workbench();

    let explained = workbench.explain(RecordId::new(0)).unwrap();
    assert_eq!(explained.failure_description, "Desgaste pastilla");
    assert_eq!(explained.action_code.as_deref(), Some("X1"));
    assert_eq!(explained.action_definition, "Replace pad");

    let explained = workbench.explain(RecordId::new(1)).unwrap();
    assert_eq!(explained.failure_description, NO_FAILURE_DESCRIPTION);
    assert_eq!(explained.action_definition, "Adjust caliper");

    // Action code on record but absent from the dictionary
    let explained = workbench.explain(RecordId::new(5)).unwrap();
    assert_eq!(explained.action_definition, NO_ACTION_REGISTERED);

    let explained = workbench.explain(RecordId::new(2)).unwrap();
    assert!(explained.action_code.is_none());
    assert_eq!(explained.action_definition, NO_ACTION_CODE);

    assert!(workbench.explain(RecordId::new(99)).is_none());
}

#[test]
fn test_workbench_is_shareable_across_threads() {
    let project = TestProject::new();
    let workbench = Arc::new(project.workbench());

    let handles: Vec<_> = ["freno", "puerta", "aire", "luz"]
        .into_iter()
        .map(|query| {
            let workbench = Arc::clone(&workbench);
            std::thread::spawn(move || workbench.search(query, None).unwrap().ranked.len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}

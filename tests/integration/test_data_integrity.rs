//! Load-time failures: misaligned artifacts, schema and format problems.

use crate::common::{CORPUS_CSV, KeywordEncoder, TestProject, corpus_descriptions};
use clavero::error::LoadError;
use clavero::io::ExitCode;
use clavero::retrieval::AggregationPolicy;
use clavero::vector::{EncoderError, TextEncoder, VectorDimension};
use clavero::workbench::{DataSet, Workbench};
use std::sync::Arc;

struct TinyEncoder;

impl TextEncoder for TinyEncoder {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncoderError> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(3).unwrap()
    }
}

#[test]
fn test_fewer_vectors_than_records_fails_fast() {
    let project = TestProject::new();
    let descriptions = corpus_descriptions(CORPUS_CSV);
    project.write_vectors(&descriptions[..9]);

    let error = DataSet::load(&project.settings()).unwrap_err();
    match &error {
        LoadError::DataIntegrity { records, vectors } => {
            assert_eq!(*records, 10);
            assert_eq!(*vectors, 9);
        }
        other => panic!("expected DataIntegrity, got {other:?}"),
    }
    assert!(error.is_integrity());
    assert_eq!(ExitCode::from_load_error(&error), ExitCode::BlockingError);
}

#[test]
fn test_more_vectors_than_records_fails_fast() {
    let project = TestProject::new();
    let mut descriptions = corpus_descriptions(CORPUS_CSV);
    descriptions.push("extra");
    project.write_vectors(&descriptions);

    assert!(matches!(
        DataSet::load(&project.settings()),
        Err(LoadError::DataIntegrity {
            records: 10,
            vectors: 11
        })
    ));
}

#[test]
fn test_encoder_dimension_must_match_store() {
    let project = TestProject::new();
    let data = DataSet::load(&project.settings()).unwrap();

    let error = Workbench::new(data, Arc::new(TinyEncoder), AggregationPolicy::default())
        .unwrap_err();
    assert!(matches!(
        error,
        LoadError::DimensionMismatch {
            store: 6,
            encoder: 3
        }
    ));
}

#[test]
fn test_missing_required_column() {
    let project = TestProject::new();
    project.add_file(
        "data/data_ots_completo.csv",
        "descripcion_ot,otra\nfreno,1\n",
    );

    let error = DataSet::load(&project.settings()).unwrap_err();
    match &error {
        LoadError::MissingColumn { column, .. } => assert_eq!(column, "clavero"),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
    assert_eq!(ExitCode::from_load_error(&error), ExitCode::ConfigError);
}

#[test]
fn test_missing_corpus_file() {
    let project = TestProject::empty();
    let error = DataSet::load(&project.settings()).unwrap_err();
    assert!(matches!(error, LoadError::FileRead { .. }));
    assert_eq!(error.status_code(), "FILE_READ_ERROR");
    assert!(!error.recovery_suggestions().is_empty());
}

#[test]
fn test_unknown_vector_format() {
    let project = TestProject::new();
    project.add_file("data/embeddings.npy", "not a vector store");

    let error = DataSet::load(&project.settings()).unwrap_err();
    assert!(matches!(error, LoadError::VectorStore { .. }));
    assert_eq!(ExitCode::from_load_error(&error), ExitCode::ParseError);
}

#[test]
fn test_numpy_vectors_load_and_search() {
    let project = TestProject::new();
    let rows = KeywordEncoder::new()
        .encode_batch(&corpus_descriptions(CORPUS_CSV))
        .unwrap();
    project.write_npy("data/original.npy", &rows);

    let mut settings = project.settings();
    settings.data.vectors_path = "data/original.npy".into();
    let data = DataSet::load(&settings).unwrap();
    assert_eq!(data.store.len(), 10);

    let workbench = Workbench::new(
        data,
        Arc::new(KeywordEncoder::new()),
        AggregationPolicy::from(&settings.search),
    )
    .unwrap();
    let result = workbench.search("freno ruidoso", None).unwrap();
    assert_eq!(result.ranked[0].record.id.0, 0);
}

#[test]
fn test_missing_work_orders_disable_fleet() {
    let project = TestProject::new();
    std::fs::remove_file(project.path().join("data/work_orders_dict.csv")).unwrap();

    let data = DataSet::load(&project.settings()).unwrap();
    assert!(data.fleet.is_none());
}

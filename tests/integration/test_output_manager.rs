//! JSON and text output of query results and load failures.

use crate::common::TestProject;
use clavero::display::{candidate_table, record_table};
use clavero::error::LoadError;
use clavero::io::{ExitCode, OutputFormat, OutputManager};
use clavero::retrieval::Decision;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn manager(format: OutputFormat) -> (OutputManager, Captured, Captured) {
    let (out, err) = (Captured::default(), Captured::default());
    let manager =
        OutputManager::new_with_writers(format, Box::new(out.clone()), Box::new(err.clone()));
    (manager, out, err)
}

#[test]
fn test_query_result_as_json() {
    let project = TestProject::new();
    let result = project.workbench().search("freno ruidoso", None).unwrap();

    let (mut output, out, _) = manager(OutputFormat::Json);
    let code = output.success(&result, |_| String::new()).unwrap();
    assert!(code.is_success());

    let json: serde_json::Value = serde_json::from_str(&out.text()).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["decision"]["mode"], "grouped");
    assert_eq!(json["data"]["decision"]["items"][0]["code"], "100.2.1");
    assert_eq!(json["data"]["ranked"].as_array().unwrap().len(), 3);
    assert!(json["meta"]["version"].is_string());
}

#[test]
fn test_query_result_as_text_tables() {
    let project = TestProject::new();
    let result = project.workbench().search("freno ruidoso", None).unwrap();

    let Decision::Grouped(candidates) = &result.decision else {
        panic!("expected grouped candidates");
    };
    let table = candidate_table(candidates);
    assert!(table.contains("100.2.1"));
    assert!(table.contains("Brakes > Caliper > Pad"));

    let table = record_table(&result.ranked);
    assert!(table.contains("freno ruidoso"));
    assert!(table.contains("X1"));
}

#[test]
fn test_load_error_as_json() {
    let (mut output, out, err) = manager(OutputFormat::Json);
    let error = LoadError::DataIntegrity {
        records: 10,
        vectors: 9,
    };
    let code = output.load_error(&error).unwrap();
    assert_eq!(code, ExitCode::BlockingError);
    assert!(out.text().is_empty());

    let json: serde_json::Value = serde_json::from_str(&err.text()).unwrap();
    assert_eq!(json["code"], "DATA_INTEGRITY_ERROR");
    assert_eq!(json["exit_code"], 2);
}

#[test]
fn test_not_found_exit_code() {
    let (mut output, _, err) = manager(OutputFormat::Text);
    let code = output.not_found("Taxonomy path", "Brakes > Other").unwrap();
    assert_eq!(code, ExitCode::NotFound);
    assert_eq!(i32::from(code), 3);
    assert!(err.text().contains("Brakes > Other"));
}

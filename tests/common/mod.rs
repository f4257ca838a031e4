//! Shared fixtures for integration tests.
//!
//! `TestProject` lays out a workspace in a temp dir with the five input
//! tables and a vector store produced by `KeywordEncoder`, so searches are
//! deterministic and need no model download.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clavero::Settings;
use clavero::retrieval::AggregationPolicy;
use clavero::vector::{EncoderError, TextEncoder, VectorDimension, VectorStore, normalize};
use clavero::workbench::{DataSet, Workbench};
use tempfile::TempDir;

pub const CORPUS_CSV: &str = "\
descripcion_ot,clavero,clavero_actuacion,descripcion_averia
freno ruidoso,100.2.1,X1,Desgaste pastilla
freno bloqueado,100.2.1,X3,
freno chirria,100.2.2,,
puerta no cierra,200.1.1,S7,Atasco
puerta lenta,200.1.1,,
puerta ruidosa,200.1.1,ZZ,
aire no enfria,300.1.1,,
aire sin caudal,300.1.1,,
luz fundida,,,
luz parpadea,400.1.1,,
";

pub const TAXONOMY_CSV: &str = "\
clavero,componente,nivel,componente_nivel1,componente_nivel2
100,Brakes,1,,
100.2,Caliper,2,Brakes,
100.2.1,Piston,3,Brakes,Caliper
100.2.2,Pad,3,Brakes,Caliper
100.3.9,Sensor,3,Brakes,
200,Doors,1.0,,
200.1,Leaf,2.0,Doors,
200.1.1,Lock,3.0,Doors,Leaf
300,HVAC,1,,
300.1,Blower,2,HVAC,
300.1.1,Fan,3,HVAC,Blower
400,Lighting,1,,
400.1,Interior,2,Lighting,
400.1.1,Lamp,3,Lighting,Interior
,Unnamed,3,Lighting,Interior
";

pub const DICTIONARY_CSV: &str = "\
clavero,Código tarea std,Std Tasks Codes,DEFINICION
100.2.1,X1,,Replace pad
100.2.1,X3,,Adjust caliper
100.2.1,X4,,
200.1.1,S7,,Lubricate lock
,,T9,Inspect seal
";

pub const WORK_ORDERS_CSV: &str = "\
equipo,clavero,fecha_creacion,descripcion_ot,descripcion_averia,descripcion_reparacion
UT-101-A1,100.2.1,2023-01-04,Freno ruidoso,Desgaste,Cambio pastillas
UT-102-A1,100.2.1,2023-02-11,Freno bloqueado,,Ajuste
UT-103-B2,200.1.1,2023-03-09,Puerta,Atasco,Limpieza
UT-200,200.1.1,2023-04-01,Puerta lenta,,
UT-201,100.2.1,2023-05-20,Freno,,
UT-202,200.1.1,2023-06-30,Puerta,,
";

/// Deterministic encoder: one axis per keyword it knows, plus a small
/// constant axis so unrelated text never encodes to zero.
#[derive(Debug, Clone)]
pub struct KeywordEncoder {
    keywords: Vec<&'static str>,
}

impl KeywordEncoder {
    pub fn new() -> Self {
        Self {
            keywords: vec!["freno", "puerta", "aire", "luz", "ruid"],
        }
    }
}

impl TextEncoder for KeywordEncoder {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncoderError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut vector: Vec<f32> = self
                    .keywords
                    .iter()
                    .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
                    .collect();
                vector.push(0.05);
                normalize(&mut vector);
                vector
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(self.keywords.len() + 1).expect("non-zero dimension")
    }
}

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    /// A workspace with every table and an aligned vector store.
    pub fn new() -> Self {
        let project = Self::empty();
        project.add_file("data/data_ots_completo.csv", CORPUS_CSV);
        project.add_file("data/jerarquia_total.csv", TAXONOMY_CSV);
        project.add_file("data/diccionario.csv", DICTIONARY_CSV);
        project.add_file("data/work_orders_dict.csv", WORK_ORDERS_CSV);
        project.write_vectors(&corpus_descriptions(CORPUS_CSV));
        project
    }

    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Encodes `descriptions` and saves them as the vector store.
    pub fn write_vectors(&self, descriptions: &[&str]) -> PathBuf {
        let rows = KeywordEncoder::new()
            .encode_batch(descriptions)
            .expect("keyword encoding");
        let store = VectorStore::from_rows(rows).expect("rows share a dimension");
        let path = self.vectors_path();
        store.save(&path).expect("Failed to save vectors");
        path
    }

    /// Where the default settings put the vector store.
    pub fn vectors_path(&self) -> PathBuf {
        self.dir.path().join("data/embeddings.npy")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Default settings rooted at the project, with a small top-K.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.workspace_root = Some(self.dir.path().to_path_buf());
        settings.search.top_k = 3;
        settings
    }

    pub fn workbench(&self) -> Workbench {
        let settings = self.settings();
        let data = DataSet::load(&settings).expect("fixture data loads");
        Workbench::new(
            data,
            Arc::new(KeywordEncoder::new()),
            AggregationPolicy::from(&settings.search),
        )
        .expect("fixture data is aligned")
    }
}

/// First column of every data row.
pub fn corpus_descriptions(csv: &str) -> Vec<&str> {
    csv.lines()
        .skip(1)
        .filter(|line| !line.is_empty())
        .map(|line| line.split(',').next().unwrap_or_default())
        .collect()
}

impl TestProject {
    /// Writes the vectors as a numpy v1 `.npy` array, as `numpy.save` does.
    pub fn write_npy(&self, path: &str, rows: &[Vec<f32>]) -> PathBuf {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        let mut header = format!(
            "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, {}), }}",
            rows.len(),
            dim
        );
        let unpadded = 10 + header.len() + 1;
        header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
        header.push('\n');

        let mut bytes = b"\x93NUMPY".to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        for value in rows.iter().flatten() {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, bytes).expect("Failed to write npy");
        file_path
    }
}

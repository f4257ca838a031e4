//! Configuration module for the retrieval workbench.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CLAVERO_` and use double
//! underscores to separate nested levels:
//! - `CLAVERO_SEARCH__TOP_K=20` sets `search.top_k`
//! - `CLAVERO_DATA__CORPUS_PATH=ots.csv` sets `data.corpus_path`
//! - `CLAVERO_DEBUG=true` sets `debug`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".clavero";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .clavero is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Cache directory for downloaded embedding models
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Input artifact locations
    #[serde(default)]
    pub data: DataConfig,

    /// Corpus column names
    #[serde(default)]
    pub corpus: CorpusColumns,

    /// Similarity search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Action dictionary header variants
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Taxonomy settings
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// Pre-computed embeddings, `.npy` or CLVS segment
    #[serde(default = "default_vectors_path")]
    pub vectors_path: PathBuf,

    #[serde(default = "default_taxonomy_path")]
    pub taxonomy_path: PathBuf,

    #[serde(default = "default_dictionary_path")]
    pub dictionary_path: PathBuf,

    /// Work orders by train model. Fleet commands are unavailable without it.
    #[serde(default = "default_work_orders_path")]
    pub work_orders_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CorpusColumns {
    #[serde(default = "default_description_column")]
    pub description: String,

    #[serde(default = "default_component_code_column")]
    pub component_code: String,

    #[serde(default = "default_action_code_column")]
    pub action_code: String,

    #[serde(default = "default_failure_description_column")]
    pub failure_description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Embedding model, must match the one that produced the vector store
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Number of nearest records aggregated per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// A code must exceed this share of coded results to be grouped
    #[serde(default = "default_share_threshold")]
    pub share_threshold: f64,

    /// Records shown when no code is grouped
    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DictionaryConfig {
    /// Code column header variants, in priority order
    #[serde(default = "default_code_columns")]
    pub code_columns: Vec<String>,

    /// Exact definition column headers, in priority order
    #[serde(default = "default_definition_columns")]
    pub definition_columns: Vec<String>,

    /// Case-insensitive substrings tried when no exact header matches
    #[serde(default = "default_definition_keywords")]
    pub definition_keywords: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TaxonomyConfig {
    /// Label of the synthetic subsystem holding orphan components
    #[serde(default = "default_other_label")]
    pub other_label: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_models_dir() -> PathBuf {
    PathBuf::from(".clavero/models")
}
fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/data_ots_completo.csv")
}
fn default_vectors_path() -> PathBuf {
    PathBuf::from("data/embeddings.npy")
}
fn default_taxonomy_path() -> PathBuf {
    PathBuf::from("data/jerarquia_total.csv")
}
fn default_dictionary_path() -> PathBuf {
    PathBuf::from("data/diccionario.csv")
}
fn default_work_orders_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/work_orders_dict.csv"))
}
fn default_description_column() -> String {
    "descripcion_ot".to_string()
}
fn default_component_code_column() -> String {
    "clavero".to_string()
}
fn default_action_code_column() -> String {
    "clavero_actuacion".to_string()
}
fn default_failure_description_column() -> String {
    "descripcion_averia".to_string()
}
fn default_embedding_model() -> String {
    "ParaphraseMLMiniLML12V2".to_string()
}
fn default_top_k() -> usize {
    10
}
fn default_share_threshold() -> f64 {
    0.10
}
fn default_fallback_limit() -> usize {
    5
}
fn default_code_columns() -> Vec<String> {
    vec!["Código tarea std".to_string(), "Std Tasks Codes".to_string()]
}
fn default_definition_columns() -> Vec<String> {
    vec!["DEFINICION".to_string(), "DEFINITION".to_string()]
}
fn default_definition_keywords() -> Vec<String> {
    vec!["defin".to_string(), "descripcion".to_string()]
}
fn default_other_label() -> String {
    "Other".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            debug: false,
            models_dir: default_models_dir(),
            data: DataConfig::default(),
            corpus: CorpusColumns::default(),
            search: SearchConfig::default(),
            dictionary: DictionaryConfig::default(),
            taxonomy: TaxonomyConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            vectors_path: default_vectors_path(),
            taxonomy_path: default_taxonomy_path(),
            dictionary_path: default_dictionary_path(),
            work_orders_path: default_work_orders_path(),
        }
    }
}

impl Default for CorpusColumns {
    fn default() -> Self {
        Self {
            description: default_description_column(),
            component_code: default_component_code_column(),
            action_code: default_action_code_column(),
            failure_description: default_failure_description_column(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            top_k: default_top_k(),
            share_threshold: default_share_threshold(),
            fallback_limit: default_fallback_limit(),
        }
    }
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            code_columns: default_code_columns(),
            definition_columns: default_definition_columns(),
            definition_keywords: default_definition_keywords(),
        }
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            other_label: default_other_label(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore stays
            .merge(Env::prefixed("CLAVERO_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by looking for .clavero from the current
    /// directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'clavero init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Get the workspace root directory (where .clavero is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolves a configured path against the workspace root.
    ///
    /// Absolute paths and paths without a known workspace are returned as-is.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Same as `init_config_file`, rooted at `root`
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# Clavero Configuration File

# Version of the configuration schema
version = 1

# Global debug mode (verbose logging on stderr)
debug = false

# Cache directory for downloaded embedding models
models_dir = ".clavero/models"

[data]
# Historical work orders, one row per failure report
corpus_path = "data/data_ots_completo.csv"

# Pre-computed embeddings, row-aligned with the corpus (.npy or CLVS segment)
# Regenerate with `clavero embed` whenever the corpus changes
vectors_path = "data/embeddings.npy"

# Component taxonomy (clavero, componente, nivel, componente_nivel1, ...)
taxonomy_path = "data/jerarquia_total.csv"

# Action dictionary: first column is the component code
dictionary_path = "data/diccionario.csv"

# Work orders with equipment ids, used by `clavero fleet`
work_orders_path = "data/work_orders_dict.csv"

[corpus]
# Column names in the corpus file
description = "descripcion_ot"
component_code = "clavero"
action_code = "clavero_actuacion"
failure_description = "descripcion_averia"

[search]
# Must be the model that produced vectors_path
model = "ParaphraseMLMiniLML12V2"

# Nearest records aggregated per query
top_k = 10

# A code is grouped only when its share of coded results exceeds this
share_threshold = 0.10

# Records shown when no code is grouped
fallback_limit = 5

[dictionary]
# Code column header variants, first match wins
code_columns = ["Código tarea std", "Std Tasks Codes"]

# Exact definition headers, then case-insensitive keywords
definition_columns = ["DEFINICION", "DEFINITION"]
definition_keywords = ["defin", "descripcion"]

[taxonomy]
# Synthetic subsystem for components without a level-2 parent
other_label = "Other"
"#;

        std::fs::write(&config_path, template)?;

        if force {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
        }

        Ok(config_path)
    }
}

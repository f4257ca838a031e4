//! CLI entry point for the failure-report workbench.
//!
//! Each command loads only the artifacts it needs; the encoder model is
//! loaded for `search` and `embed` alone.

use anyhow::Context;
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use clavero::config::Settings;
use clavero::corpus::Corpus;
use clavero::dictionary::ActionDictionary;
use clavero::display::{
    THEME, action_table, candidate_table, code_count_table, create_progress_bar, option_list,
    record_table, with_spinner, work_order_table,
};
use clavero::error::{LoadError, LoadResult};
use clavero::fleet::{Fleet, normalize_model_choice};
use clavero::io::{ExitCode, OutputFormat, OutputManager};
use clavero::retrieval::{AggregationPolicy, Decision, QueryResult};
use clavero::taxonomy::Taxonomy;
use clavero::types::{NO_ACTION_REGISTERED, RecordId, TaxonomyPath};
use clavero::vector::{FastEmbedEncoder, TextEncoder, VectorStoreWriter};
use clavero::workbench::{self, DataSet, KeySelection, RecordExplanation, Workbench};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Descriptions encoded per model call by `embed`.
const EMBED_BATCH_SIZE: usize = 64;

/// Unwraps a load result or reports the error and returns its exit code.
macro_rules! load_or_report {
    ($out:expr, $result:expr) => {
        match $result {
            Ok(value) => value,
            Err(error) => return Ok($out.load_error(&error)?),
        }
    };
}

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Failure-report retrieval and component key resolution
#[derive(Parser)]
#[command(
    name = "clavero",
    version = env!("CARGO_PKG_VERSION"),
    about = "Find component codes for failure reports",
    long_about = "Match a failure description against historical work orders, \
                  browse the component taxonomy and compose final keys.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up .clavero directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Rank historical records against a failure description
    #[command(
        after_help = "Examples:\n  clavero search \"freno hace ruido al frenar\"\n  clavero search \"puerta no cierra\" -k 20\n  clavero search \"puerta no cierra\" --code PUE0202 --json"
    )]
    Search {
        /// Free-text failure description
        query: String,

        /// Number of nearest records (overrides search.top_k)
        #[arg(short = 'k', long)]
        k: Option<usize>,

        /// Only list the top records with this component code
        #[arg(long)]
        code: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show the failure, action and definition of a record
    Explain {
        /// Row number in the corpus, starting at 0
        record_id: u32,

        #[arg(long)]
        json: bool,
    },

    /// Look up the definition of an action code
    Definition {
        action_code: String,

        #[arg(long)]
        json: bool,
    },

    /// Browse the component taxonomy
    Taxonomy {
        #[command(subcommand)]
        query: TaxonomyQuery,
    },

    /// List the actions that can be appended to a base code
    Actions {
        base_code: String,

        #[arg(long)]
        json: bool,
    },

    /// Failure history by train model
    Fleet {
        #[command(subcommand)]
        query: FleetQuery,
    },

    /// Encode the corpus descriptions into a vector store
    Embed {
        /// Output file (defaults to data.vectors_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TaxonomyQuery {
    /// Valid choices for the next level
    Options {
        #[arg(long)]
        system: Option<String>,
        #[arg(long)]
        subsystem: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Resolve a selection to its base code, optionally composing a final key
    Resolve {
        #[arg(long)]
        system: String,
        #[arg(long)]
        subsystem: Option<String>,
        #[arg(long)]
        component: Option<String>,
        /// Action code to append to the base code
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FleetQuery {
    /// Train models present in the work orders
    Models {
        #[arg(long)]
        json: bool,
    },

    /// Component code frequencies for a model
    Codes {
        /// Model label or code; omit for equipment without a model
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Work orders with a component code
    Orders {
        code: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct DefinitionOutput<'a> {
    action_code: &'a str,
    definition: &'a str,
}

fn main() {
    let cli = Cli::parse();

    if cli.config.is_none() && !matches!(cli.command, Commands::Init { .. }) {
        if let Err(warning) = Settings::check_init() {
            eprintln!("Warning: {warning}");
            eprintln!("Using default configuration for now.");
        }
    }

    let settings = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(ExitCode::ConfigError.into());
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };

    init_tracing(cli.debug || settings.debug);

    let code = match run(cli.command, &settings) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.into());
}

fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands, settings: &Settings) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Init { force } => init(force),
        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(settings)?);
            Ok(ExitCode::Success)
        }
        Commands::Search {
            query,
            k,
            code,
            json,
        } => search(settings, &query, k, code.as_deref(), json),
        Commands::Explain { record_id, json } => explain(settings, record_id, json),
        Commands::Definition { action_code, json } => definition(settings, &action_code, json),
        Commands::Taxonomy { query } => taxonomy(settings, query),
        Commands::Actions { base_code, json } => actions(settings, &base_code, json),
        Commands::Fleet { query } => fleet(settings, query),
        Commands::Embed { output } => embed(settings, output),
    }
}

fn init(force: bool) -> anyhow::Result<ExitCode> {
    let config_path = PathBuf::from(".clavero/settings.toml");
    if config_path.exists() && !force {
        eprintln!(
            "Configuration file already exists at: {}",
            config_path.display()
        );
        eprintln!("Use --force to overwrite");
        return Ok(ExitCode::GeneralError);
    }

    match Settings::init_config_file(force) {
        Ok(path) => {
            println!(
                "{}",
                THEME.success_with_icon(&format!("Created configuration file at: {}", path.display()))
            );
            println!("Edit this file to point [data] at your tables.");
            Ok(ExitCode::Success)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(ExitCode::ConfigError)
        }
    }
}

fn load_corpus(settings: &Settings) -> LoadResult<Corpus> {
    Corpus::load(
        settings.resolve_path(&settings.data.corpus_path),
        &settings.corpus,
    )
}

fn load_dictionary(settings: &Settings) -> LoadResult<ActionDictionary> {
    ActionDictionary::load(
        settings.resolve_path(&settings.data.dictionary_path),
        &settings.dictionary,
    )
}

fn load_taxonomy(settings: &Settings) -> LoadResult<Taxonomy> {
    Taxonomy::load(
        settings.resolve_path(&settings.data.taxonomy_path),
        &settings.taxonomy.other_label,
    )
}

fn load_encoder(settings: &Settings, show_progress: bool) -> LoadResult<FastEmbedEncoder> {
    let cache_dir = settings.resolve_path(&settings.models_dir);
    FastEmbedEncoder::new(&settings.search.model, &cache_dir, show_progress).map_err(LoadError::from)
}

fn search(
    settings: &Settings,
    query: &str,
    k: Option<usize>,
    code: Option<&str>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let mut out = OutputManager::new(OutputFormat::from_json_flag(json));

    let data = load_or_report!(out, DataSet::load(settings));
    let encoder = if json {
        load_encoder(settings, false)
    } else {
        with_spinner("Loading embedding model...", || load_encoder(settings, true))
    };
    let encoder = load_or_report!(out, encoder);
    let policy = AggregationPolicy::from(&settings.search);
    let workbench = load_or_report!(out, Workbench::new(data, Arc::new(encoder), policy));

    let result = match workbench.search(query, k) {
        Ok(result) => result,
        Err(error) => return Ok(out.search_error(&error)?),
    };

    if result.is_empty() {
        if json {
            return Ok(out.not_found("Records for query", query)?);
        }
        out.info(&THEME.warning_with_icon(empty_search_message(query)))?;
        return Ok(ExitCode::NotFound);
    }

    if let Some(code) = code {
        let records: Vec<_> = result.records_for(code).into_iter().cloned().collect();
        if records.is_empty() && !json {
            out.info(&format!(
                "No record among the top {} carries code {code}.",
                result.ranked.len()
            ))?;
            return Ok(ExitCode::NotFound);
        }
        return Ok(out.collection(&records, "records", record_table)?);
    }

    Ok(out.success(&result, render_query_result)?)
}

/// Explains an empty result: nothing was asked, or nothing was ranked.
fn empty_search_message(query: &str) -> &'static str {
    if query.trim().is_empty() {
        "Enter a failure description to search the work-order history."
    } else {
        "No historical records were ranked. Check the corpus and the requested -k."
    }
}

fn render_query_result(result: &QueryResult) -> String {
    match &result.decision {
        Decision::Grouped(candidates) => format!(
            "{}\n{}",
            THEME.apply(&THEME.header, "Most probable components"),
            candidate_table(candidates)
        ),
        Decision::Fallback(records) => format!(
            "{}\n{}",
            THEME.warning_with_icon("No component stands out. Nearest records:"),
            record_table(records)
        ),
    }
}

fn explain(settings: &Settings, record_id: u32, json: bool) -> anyhow::Result<ExitCode> {
    let mut out = OutputManager::new(OutputFormat::from_json_flag(json));
    let corpus = load_or_report!(out, load_corpus(settings));
    let dictionary = load_or_report!(out, load_dictionary(settings));

    let explanation = workbench::explain(&corpus, &dictionary, RecordId::new(record_id));
    Ok(out.item(
        explanation.as_ref(),
        "Record",
        &record_id.to_string(),
        render_explanation,
    )?)
}

fn render_explanation(explanation: &RecordExplanation) -> String {
    let record = &explanation.record;
    let mut lines = vec![
        THEME.labelled_code("Record", &record.id.to_string()),
        format!("Description: {}", record.description),
        format!("Failure: {}", explanation.failure_description),
    ];
    if let Some(code) = &record.component_code {
        lines.push(THEME.labelled_code("Component code", code));
    }
    if let Some(action) = &explanation.action_code {
        lines.push(THEME.labelled_code("Action code", action));
    }
    lines.push(format!("Definition: {}", explanation.action_definition));
    lines.join("\n")
}

fn definition(settings: &Settings, action_code: &str, json: bool) -> anyhow::Result<ExitCode> {
    let mut out = OutputManager::new(OutputFormat::from_json_flag(json));
    let dictionary = load_or_report!(out, load_dictionary(settings));

    match dictionary.lookup_definition(action_code) {
        Some(definition) => {
            let output = DefinitionOutput {
                action_code: action_code.trim(),
                definition,
            };
            Ok(out.success(&output, |o| o.definition.to_string())?)
        }
        None if json => Ok(out.not_found("Action code", action_code)?),
        None => {
            out.info(NO_ACTION_REGISTERED)?;
            Ok(ExitCode::NotFound)
        }
    }
}

fn taxonomy(settings: &Settings, query: TaxonomyQuery) -> anyhow::Result<ExitCode> {
    match query {
        TaxonomyQuery::Options {
            system,
            subsystem,
            json,
        } => {
            let mut out = OutputManager::new(OutputFormat::from_json_flag(json));
            let taxonomy = load_or_report!(out, load_taxonomy(settings));
            let options = taxonomy.options(system.as_deref(), subsystem.as_deref());
            if options.choices.is_empty() {
                let selected = [system, subsystem].into_iter().flatten().collect::<Vec<_>>();
                return Ok(out.not_found("Taxonomy level under", &selected.join(" > "))?);
            }
            Ok(out.success(&options, |o| {
                format!("Level {} choices:\n{}", o.level, option_list(&o.choices))
            })?)
        }
        TaxonomyQuery::Resolve {
            system,
            subsystem,
            component,
            action,
            json,
        } => {
            let mut out = OutputManager::new(OutputFormat::from_json_flag(json));
            let taxonomy = load_or_report!(out, load_taxonomy(settings));
            let dictionary = load_or_report!(out, load_dictionary(settings));

            let path = TaxonomyPath::from_parts(&system, subsystem.as_deref(), component.as_deref());
            let selection =
                workbench::select_key(&taxonomy, &dictionary, &path, action.as_deref());

            if let (Some(selection), Some(action)) = (&selection, &action) {
                if selection.action.is_none() {
                    tracing::warn!(action = %action, code = %selection.resolution.code, "action not offered for code");
                    out.progress(&THEME.warning_with_icon(&format!(
                        "Action {action} is not offered for {}",
                        selection.resolution.code
                    )))?;
                }
            }
            Ok(out.item(
                selection.as_ref(),
                "Taxonomy path",
                &path.to_string(),
                render_selection,
            )?)
        }
    }
}

fn render_selection(selection: &KeySelection) -> String {
    let resolution = &selection.resolution;
    let mut lines = vec![
        format!("Selected: {}", resolution.path.join(" > ")),
        THEME.labelled_code("Base code", &resolution.code),
        format!("Label: {}", resolution.label),
    ];
    if selection.actions.is_empty() {
        lines.push("No actions registered for this code.".to_string());
    } else {
        lines.push(action_table(&resolution.code, &selection.actions));
    }
    if let Some(final_code) = &selection.final_code {
        lines.push(THEME.success_with_icon(&format!("Final code: {final_code}")));
    }
    lines.join("\n")
}

fn actions(settings: &Settings, base_code: &str, json: bool) -> anyhow::Result<ExitCode> {
    let mut out = OutputManager::new(OutputFormat::from_json_flag(json));
    let dictionary = load_or_report!(out, load_dictionary(settings));
    let actions = dictionary.actions_for(base_code);
    let base_code = base_code.trim();
    Ok(out.collection(&actions, "actions", |items| action_table(base_code, items))?)
}

fn fleet(settings: &Settings, query: FleetQuery) -> anyhow::Result<ExitCode> {
    let json = match &query {
        FleetQuery::Models { json } | FleetQuery::Codes { json, .. } | FleetQuery::Orders { json, .. } => *json,
    };
    let mut out = OutputManager::new(OutputFormat::from_json_flag(json));

    let Some(path) = &settings.data.work_orders_path else {
        out.progress("No work-order table configured (data.work_orders_path).")?;
        return Ok(ExitCode::ConfigError);
    };
    let fleet = load_or_report!(out, Fleet::load(settings.resolve_path(path)));

    match query {
        FleetQuery::Models { .. } => {
            let models = fleet.models();
            Ok(out.collection(&models, "models", option_list)?)
        }
        FleetQuery::Codes { model, .. } => {
            let model = model.as_deref().map(normalize_model_choice);
            let counts = fleet.code_counts(model.as_deref());
            Ok(out.collection(&counts, "component codes", code_count_table)?)
        }
        FleetQuery::Orders { code, model, .. } => {
            let model = model.as_deref().map(normalize_model_choice);
            let orders = fleet.work_orders(&code, model.as_deref());
            Ok(out.collection(&orders, "work orders", work_order_table)?)
        }
    }
}

fn embed(settings: &Settings, output: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let mut out = OutputManager::new(OutputFormat::Text);
    let corpus = load_or_report!(out, load_corpus(settings));
    let encoder = load_or_report!(
        out,
        with_spinner("Loading embedding model...", || load_encoder(settings, true))
    );

    let output = settings.resolve_path(&output.unwrap_or_else(|| settings.data.vectors_path.clone()));
    let mut writer = VectorStoreWriter::create(&output, encoder.dimension())
        .with_context(|| format!("failed to create {}", output.display()))?;

    let descriptions: Vec<&str> = corpus.descriptions().collect();
    let progress = create_progress_bar(descriptions.len() as u64, "Encoding descriptions");
    for batch in descriptions.chunks(EMBED_BATCH_SIZE) {
        let vectors = encoder
            .encode_batch(batch)
            .context("failed to encode corpus descriptions")?;
        let rows: Vec<&[f32]> = vectors.iter().map(Vec::as_slice).collect();
        writer
            .append(&rows)
            .with_context(|| format!("failed to write {}", output.display()))?;
        progress.inc(batch.len() as u64);
    }
    let rows = writer.rows();
    let path = writer
        .finish()
        .with_context(|| format!("failed to finalize {}", output.display()))?;
    progress.finish_and_clear();

    tracing::info!(rows, path = %path.display(), "vector store written");
    out.info(&THEME.success_with_icon(&format!(
        "Wrote {rows} vectors ({} dimensions) to {}",
        encoder.dimension().get(),
        path.display()
    )))?;
    Ok(ExitCode::Success)
}

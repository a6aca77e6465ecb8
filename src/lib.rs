#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod refusal;
pub mod registry;

pub use config::IngestConfig;
pub use document::{Document, DocumentFormat, DocumentMetadata, ProcessingStatus};
pub use error::{ErrorKind, ParseError};
pub use parser::{FormatParser, ParseOptions, PdfParser, TxtParser, ValidationGuard};
pub use registry::{ParserRegistry, SharedRegistry};

use cli::{Cli, Outcome};
use refusal::{RefusalCode, RefusalPayload};
use serde_json::{Value, json};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Instant;

/// Run the docingest CLI. Returns an exit code (0, 1, or 2).
pub fn run() -> u8 {
    use clap::Parser;

    // Parse CLI args (handles --version and --help via clap, then exits)
    let cli = Cli::parse();

    match execute(&cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(refusal) => {
            output_refusal(&refusal);
            Outcome::Refusal.exit_code()
        }
    }
}

fn execute(cli: &Cli) -> Result<Outcome, RefusalPayload> {
    let config = resolve_config(cli)?;
    logging::init(&config.log_level);
    let registry = ParserRegistry::with_builtins(&config);

    if cli.list_parsers {
        let records: Vec<Value> = registry
            .list_parsers()
            .iter()
            .map(|info| json!(info))
            .collect();
        emit(&records)?;
        return Ok(Outcome::AllParsed);
    }

    let paths = collect_paths(&cli.paths)?;
    if paths.is_empty() {
        return Err(RefusalPayload::new(
            RefusalCode::BadInput,
            "no input paths given",
            json!({ "usage": "docingest [OPTIONS] <PATH>..." }),
        ));
    }

    let options = parse_options(cli, &config);
    if cli.inspect {
        return handle_inspect(&config, &paths);
    }
    handle_ingest(cli, &config, &registry, paths, &options)
}

/// File config and environment, then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<IngestConfig, RefusalPayload> {
    let bad_config = |error: config::ConfigError| {
        RefusalPayload::new(
            RefusalCode::BadConfig,
            error.to_string(),
            json!({ "config": cli.config.as_ref().map(|path| path.display().to_string()) }),
        )
    };

    let mut config = IngestConfig::resolve(cli.config.as_deref()).map_err(bad_config)?;
    if let Some(max_size_mb) = cli.max_size_mb {
        config.max_file_size_mb = max_size_mb;
    }
    match &cli.log_level {
        Some(level) => config.log_level = level.trim().to_ascii_lowercase(),
        // Progress consumers read stderr as JSONL.
        None if cli.progress => config.log_level = "off".to_owned(),
        None => {}
    }
    config.validate().map_err(bad_config)?;
    Ok(config)
}

fn parse_options(cli: &Cli, config: &IngestConfig) -> ParseOptions {
    let mut options = config.parse_options();
    if cli.no_layout {
        options.preserve_layout = false;
    }
    if cli.extract_images {
        options.extract_images = true;
    }
    if let Some(dir) = &cli.image_dir {
        options.image_dir = Some(dir.clone());
    }
    if let Some(password) = &cli.password {
        options.password = Some(password.clone());
    }
    if let Some(encoding) = &cli.encoding {
        options.encoding = encoding.clone();
    }
    options
}

/// Expand `-` into the newline-separated path list read from stdin.
fn collect_paths(raw: &[PathBuf]) -> Result<Vec<PathBuf>, RefusalPayload> {
    let mut paths = Vec::with_capacity(raw.len());
    for path in raw {
        if path.as_os_str() == "-" {
            let mut reader = BufReader::new(io::stdin().lock());
            let listed = pipeline::read_paths(&mut reader).map_err(|error| {
                RefusalPayload::new(RefusalCode::BadInput, error, json!({ "input": "stdin" }))
            })?;
            paths.extend(listed);
        } else {
            paths.push(path.clone());
        }
    }
    Ok(paths)
}

fn handle_ingest(
    cli: &Cli,
    config: &IngestConfig,
    registry: &ParserRegistry,
    paths: Vec<PathBuf>,
    options: &ParseOptions,
) -> Result<Outcome, RefusalPayload> {
    let jobs = cli.jobs.unwrap_or_else(default_jobs).max(1);
    let total = paths.len() as u64;
    let started = Instant::now();
    let mut processed = 0u64;
    let mut failures = 0usize;

    // Batches keep output streaming while bounding memory held by parsed documents.
    let batch_size = jobs.saturating_mul(2);
    let mut remaining = paths.into_iter().peekable();
    while remaining.peek().is_some() {
        let batch: Vec<PathBuf> = remaining.by_ref().take(batch_size).collect();
        let outcomes = pipeline::ingest_all(registry, config, batch, options, jobs);

        let mut records = Vec::with_capacity(outcomes.len());
        for ingested in &outcomes {
            if let Err(error) = &ingested.result {
                failures += 1;
                progress::report(&progress::Event::failure(&ingested.path, error));
            }
            records.push(output::ingested_record(ingested));
        }
        emit(&records)?;

        processed += outcomes.len() as u64;
        if cli.progress {
            progress::report(&progress::Event::progress(processed, total, started.elapsed()));
        }
    }

    Ok(Outcome::from_failures(failures))
}

fn handle_inspect(config: &IngestConfig, paths: &[PathBuf]) -> Result<Outcome, RefusalPayload> {
    let parser = PdfParser::new(ValidationGuard::new(config.max_file_size_bytes()));
    let mut failures = 0usize;
    let records: Vec<Value> = paths
        .iter()
        .map(|path| {
            let inspected = if DocumentFormat::from_path(path) == DocumentFormat::Pdf {
                parser.inspect(path)
            } else {
                Err(ParseError::UnsupportedFormat { path: path.clone() })
            };
            match inspected {
                Ok(info) => output::inspected_record(path, &info),
                Err(error) => {
                    failures += 1;
                    output::failed_record(path, &error)
                }
            }
        })
        .collect();

    emit(&records)?;
    Ok(Outcome::from_failures(failures))
}

fn emit(records: &[Value]) -> Result<(), RefusalPayload> {
    let mut stdout = io::stdout().lock();
    output::write_jsonl(&mut stdout, records).map_err(|error| {
        RefusalPayload::new(RefusalCode::OutputFailed, error, Value::Null)
    })
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
}

fn output_refusal(refusal: &RefusalPayload) {
    if let Ok(json) = serde_json::to_string(refusal) {
        println!("{json}");
    }
}

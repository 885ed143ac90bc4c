use clap::Parser;
use rx_core::core::corrector::CorrectionReport;
use rx_core::core::types::{CorrectedDrugRecord, QueryCandidate, ResolutionResult};
use rx_core::interactions::InteractionWarning;
use rx_core::lookup::{CatalogLookup, DrugInfo};
use rx_core::{CancelFlag, EngineConfig, RxEngine};
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Corrects and resolves every drug in an OCR reply, printing a JSON report.
#[derive(Parser, Debug)]
#[command(name = "rx_batch", version)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Dictionary CSV, overriding the configuration
    #[arg(long)]
    dictionary: Option<PathBuf>,
    /// OCR reply (JSON array, optionally wrapped in prose); '-' reads stdin
    #[arg(long, default_value = "-")]
    input: String,
    /// JSON items answering lookups; without it every lookup misses
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Interaction rules JSON, overriding the configuration
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Worker threads, overriding the configuration
    #[arg(long)]
    concurrency: Option<usize>,
}

#[derive(Serialize)]
struct EntryReport {
    #[serde(flatten)]
    record: CorrectedDrugRecord,
    candidates: Vec<QueryCandidate>,
    resolution: ResolutionResult<DrugInfo>,
}

#[derive(Serialize)]
struct Report {
    records: Vec<EntryReport>,
    report: CorrectionReport,
    warnings: Vec<InteractionWarning>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut config = EngineConfig::load(args.config.as_deref())?;
    if let Some(dictionary) = args.dictionary {
        config.dictionary_path = dictionary;
    }
    if let Some(rules) = args.rules {
        config.rules_path = Some(rules);
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }

    let text = if args.input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        text
    } else {
        fs::read_to_string(&args.input)?
    };
    let records = rx_core::ocr::parse_records(&text)?;
    tracing::info!(records = records.len(), "OCR reply parsed");

    let catalog = match &args.catalog {
        Some(path) => CatalogLookup::from_file(path)?,
        None => CatalogLookup::new(Vec::new()),
    };

    let engine = RxEngine::from_config(config)?;
    let outcome = engine.process_batch(records, &catalog, &CancelFlag::new());

    let report = Report {
        records: outcome
            .entries
            .into_iter()
            .map(|entry| EntryReport {
                record: entry.record,
                candidates: entry.candidates,
                resolution: entry.resolution.map_record(|item| DrugInfo::from_item(&item)),
            })
            .collect(),
        report: outcome.report,
        warnings: outcome.warnings,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

use clap::Parser;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use rx_core::core::types::{CorrectedDrugRecord, QueryCandidate, RawDrugRecord};
use rx_core::{EngineConfig, RxEngine};
use std::error::Error;
use std::io::{stdin, stdout, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Type OCR-read drug names and see how they would be corrected and searched.
#[derive(Parser, Debug)]
#[command(name = "rx_shell", version)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Dictionary CSV, overriding the configuration
    #[arg(long)]
    dictionary: Option<PathBuf>,
    /// Do not clear the screen between names
    #[arg(long)]
    plain: bool,
}

// Per-user cache location for the built dictionary snapshot.
fn default_snapshot_path() -> Option<PathBuf> {
    let mut path = dirs::cache_dir()?;
    path.push("rx-resolver");
    path.push("drug_db.bin");
    Some(path)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = EngineConfig::load(args.config.as_deref())?;
    if let Some(dictionary) = args.dictionary {
        config.dictionary_path = dictionary;
    }
    if config.snapshot_path.is_none() {
        config.snapshot_path = default_snapshot_path();
    }

    let engine = RxEngine::from_config(config)?;
    if engine.dictionary().is_empty() {
        println!("{}", "No dictionary loaded: names will pass through uncorrected.".yellow());
    }

    println!("Drug name corrector. Type a name and press [Enter], 'exit' to quit.");
    println!("---------------------------------------------------------------");

    loop {
        print!("\n> ");
        stdout().flush()?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        let name = input.trim();

        match name {
            "exit" => break,
            "" => continue,
            name => {
                let record = engine.correct(RawDrugRecord::named(name));
                let candidates = engine.candidates(&record);
                if !args.plain {
                    execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
                }
                print_ui(&record, &candidates);
            }
        }
    }

    Ok(())
}

fn print_ui(record: &CorrectedDrugRecord, candidates: &[QueryCandidate]) {
    println!("Input:     [{}]", record.original_name);
    if record.was_corrected {
        println!(
            "Corrected: {} {}",
            record.corrected_name.as_str().green().bold(),
            format!("(distance {})", record.correction_distance).dark_grey()
        );
    } else if record.corrected_name != record.original_name {
        println!("Canonical: {}", record.corrected_name.as_str().cyan());
    } else {
        println!("Corrected: {}", "no change".dark_grey());
    }

    if candidates.is_empty() {
        println!("\nNo search queries.");
        return;
    }
    println!("\nSearch queries (tried in order):");
    for (i, candidate) in candidates.iter().enumerate() {
        println!("  {}: {} {:?}", i + 1, candidate.query, candidate.method);
    }
}

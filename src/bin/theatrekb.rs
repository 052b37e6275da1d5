//! theatrekb command line driver
//!
//! Operates on the file snapshot in the configured data directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use theatrekb::entity::display_or_na;
use theatrekb::retrieval::{LexicalIndex, SemanticSearch};
use theatrekb::sample::load_sample_hospital;
use theatrekb::storage::persistent::{open_store, PersistentConfig};
use theatrekb::{detect, Config, KnowledgeBase, SnapshotStore};

/// theatrekb: operating theatre scheduling knowledge base
#[derive(Parser, Debug)]
#[command(name = "theatrekb")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured data directory
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the demonstration hospital into an empty store
    Seed,
    /// Show entity counts
    Summary,
    /// Run conflict detection
    Conflicts,
    /// List a surgeon's scheduled surgeries
    SurgeonSchedule {
        /// Surgeon id
        surgeon: String,
    },
    /// List a theatre's scheduled surgeries
    TheatreSchedule {
        /// Theatre id
        theatre: String,
    },
    /// List surgeries on a date (YYYY-MM-DD)
    OnDate {
        /// Date
        date: String,
    },
    /// Delete a surgery and the patients undergoing it
    DeleteSurgery {
        /// Surgery id
        surgery: String,
    },
    /// Delete every surgery and patient
    Reset,
    /// Search entity descriptions
    Search {
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir;
    }
    init_logging(&config);

    let store = open_store(&config.storage.data_dir, Some(PersistentConfig::from(&config.storage)))
        .with_context(|| format!("opening store at {}", config.storage.data_dir.display()))?;
    let store: Arc<dyn SnapshotStore> = Arc::new(store);
    let kb = KnowledgeBase::with_store(config.validation, store)?;

    match args.command {
        Command::Seed => {
            if kb.read().entity_count() > 0 {
                anyhow::bail!("store already holds data; run `reset` or use another --data-dir");
            }
            load_sample_hospital(&kb)?;
            println!("Loaded {} entities", kb.read().entity_count());
        }
        Command::Summary => {
            let summary = kb.schedule_summary();
            if args.json {
                print_json(&summary)?;
            } else {
                println!("Entities:  {}", summary.total_entities);
                println!("Surgeons:  {}", summary.surgeons);
                println!("Theatres:  {}", summary.theatres);
                println!("Surgeries: {}", summary.surgeries);
                println!("Patients:  {}", summary.patients);
                println!("Slots:     {}", summary.timeslots);
            }
        }
        Command::Conflicts => {
            let report = detect(&kb.read());
            if args.json {
                print_json(&report)?;
            } else if report.is_clean() {
                println!("No conflicts");
            } else {
                for conflict in report.all() {
                    println!("{conflict}");
                }
                for warning in &report.warnings {
                    println!("warning: {warning}");
                }
            }
        }
        Command::SurgeonSchedule { surgeon } => {
            let entries = kb.surgeon_schedule(&surgeon);
            if args.json {
                print_json(&entries)?;
            } else {
                for e in &entries {
                    println!(
                        "{} {}-{} {} in {}",
                        e.date.as_deref().unwrap_or("N/A"),
                        e.start_time,
                        e.end_time,
                        e.surgery,
                        display_or_na(e.theatre.as_ref())
                    );
                }
            }
        }
        Command::TheatreSchedule { theatre } => {
            let entries = kb.theatre_schedule(&theatre);
            if args.json {
                print_json(&entries)?;
            } else {
                for e in &entries {
                    println!(
                        "{} {}-{} {} with {}",
                        e.date.as_deref().unwrap_or("N/A"),
                        e.start_time,
                        e.end_time,
                        e.surgery,
                        display_or_na(e.surgeon.as_ref())
                    );
                }
            }
        }
        Command::OnDate { date } => {
            let surgeries = kb.surgeries_on_date(&date)?;
            if args.json {
                print_json(&surgeries)?;
            } else {
                for s in &surgeries {
                    println!("{} ({})", s.id, display_or_na(s.theatre()));
                }
            }
        }
        Command::DeleteSurgery { surgery } => {
            let summary = kb.delete_surgery(&surgery)?;
            println!("Deleted {surgery} and {} patient(s)", summary.patients_removed);
        }
        Command::Reset => {
            let summary = kb.delete_all_schedules()?;
            println!(
                "Deleted {} surgeries and {} patients",
                summary.surgeries_removed, summary.patients_removed
            );
        }
        Command::Search { query, limit } => {
            let index = LexicalIndex::from_graph(&kb.read());
            let hits = index.search(&query, limit);
            if args.json {
                print_json(&hits)?;
            } else {
                for hit in &hits {
                    println!("{:.3} {} ({:?})", hit.score, hit.document.entity_id, hit.document.kind);
                }
            }
        }
    }

    Ok(())
}

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;

use surveysync::export::{self, ExportWindow};
use surveysync::model::{NewSurveyor, Region};
use surveysync::sync::{run_pass, SyncOptions};
use surveysync::{live, logging, Store, SyncStatus};

#[derive(Debug, Parser)]
#[command(name = "surveysync", about = "Offline-first survey capture core", version)]
struct Cli {
    /// Optional explicit database path.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the database and bring the schema up to date.
    Migrate,
    /// Register a surveyor record.
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone_number: String,
        /// One of North, South, East, West, Central.
        #[arg(long)]
        region: Region,
        #[arg(long)]
        id_number: String,
        /// Record the submission as captured without connectivity.
        #[arg(long)]
        offline: bool,
    },
    /// Show pending-sync and submitted-today counts.
    Status {
        /// Emit a machine-readable JSON object instead of the table view.
        #[arg(long)]
        json: bool,
    },
    /// Run one reconciliation pass, promoting pending records to synced.
    Sync,
    /// Export records in a date window as CSV.
    Export {
        /// First day of the window (YYYY-MM-DD); defaults to the epoch.
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day of the window, inclusive; defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Output file; defaults to SurveySync_Report_<date>.csv in the
        /// working directory.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let store = Store::open(&db_path)
        .await
        .with_context(|| format!("open survey database at {}", db_path.display()))?;

    match cli.command {
        Commands::Migrate => {
            println!("Schema is up to date at {}.", db_path.display());
        }
        Commands::Register {
            full_name,
            email,
            phone_number,
            region,
            id_number,
            offline,
        } => {
            let status = if offline {
                SyncStatus::Pending
            } else {
                SyncStatus::Synced
            };
            let id = store
                .create_surveyor(
                    NewSurveyor {
                        full_name,
                        email,
                        phone_number,
                        region,
                        id_number,
                    },
                    status,
                )
                .await
                .context("register surveyor")?;
            match status {
                SyncStatus::Synced => println!("Surveyor #{id} registered and synced."),
                SyncStatus::Pending => {
                    println!("Surveyor #{id} saved locally. Will sync when online.")
                }
            }
        }
        Commands::Status { json } => {
            let pending = live::pending_count(&store).await.context("count pending")?;
            let today = live::submissions_today(&store)
                .await
                .context("count today's submissions")?;
            if json {
                let payload = json!({
                    "pendingSync": pending,
                    "submissionsToday": today,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Pending sync      : {pending}");
                println!("Submitted today   : {today}");
            }
        }
        Commands::Sync => {
            let summary = run_pass(&store, true, SyncOptions::default())
                .await
                .context("run reconciliation pass")?;
            if summary.total() == 0 {
                println!("Nothing to sync.");
            } else {
                println!(
                    "Synced {} record(s): {} surveyor(s), {} regular, {} event.",
                    summary.total(),
                    summary.surveyors,
                    summary.regular,
                    summary.events
                );
            }
        }
        Commands::Export { start, end, out } => {
            let window = ExportWindow { start, end };
            let bundle = export::collect(&store, window)
                .await
                .context("collect export records")?;
            let out = out.unwrap_or_else(|| PathBuf::from(export::default_file_name()));
            let mut file = std::fs::File::create(&out)
                .with_context(|| format!("create export file {}", out.display()))?;
            export::write_csv(&bundle, &mut file).context("write export CSV")?;
            println!("Exported {} record(s) to {}.", bundle.len(), out.display());
        }
    }
    Ok(())
}

fn default_db_path() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SURVEYSYNC_DATA_DIR") {
        return Ok(PathBuf::from(dir).join("surveysync.sqlite3"));
    }

    let base = dirs::data_dir()
        .or_else(|| std::env::current_dir().ok())
        .ok_or_else(|| anyhow::anyhow!("failed to resolve application data directory"))?;
    Ok(base.join("surveysync").join("surveysync.sqlite3"))
}

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use matchsync::presentation::cli_summary::{print_perf_summary, print_report};
use matchsync::presentation::writers::{write_to_file, writer_for};
use matchsync::{AppConfig, FixtureUid, LogLevel};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "matchsync",
    about = "matchsync: keep a local store in step with live football fixtures."
)]
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Only print errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Also print SQL statements and job ticks.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database tables.
    Migrate,
    /// Upsert the configured fixtures into the database.
    Register,
    /// Run one sync pass for a fixture and print the report.
    Sync {
        uid: String,
        /// Plan against an empty in-memory store; the database is not touched.
        #[arg(long)]
        dry_run: bool,
        /// Print the report in this format instead of the summary table.
        #[arg(short, long)]
        format: Option<String>,
        /// Also write the report to this directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Print store timings.
        #[arg(long)]
        timing: bool,
    },
    /// Register the configured fixtures and poll them until Ctrl-C.
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    matchsync::init_tracing(if cli.quiet {
        LogLevel::Error
    } else if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    let cfg = AppConfig::load(&cli.config)?;

    match cli.command {
        Command::Migrate => {
            matchsync::migrate(&cfg).await?;
            println!("Tables ready ({}).", cfg.database.driver);
        }
        Command::Register => {
            let n = matchsync::register_fixtures(&cfg).await?;
            println!("{n} fixture(s) registered.");
        }
        Command::Sync {
            uid,
            dry_run,
            format,
            out,
            timing,
        } => {
            let engine = if dry_run {
                matchsync::build_dry_run_engine(&cfg).await?
            } else {
                matchsync::build_engine(&cfg).await?
            };
            let report = engine.sync(&FixtureUid::new(uid)).await;

            let writer = match format.as_deref() {
                Some(fmt) => Some(
                    writer_for(fmt).ok_or_else(|| anyhow::anyhow!("Unknown format: {}", fmt))?,
                ),
                None => None,
            };
            match &writer {
                Some(w) => println!("{}", w.format(&report)?),
                None => print_report(&report),
            }
            if let Some(dir) = out {
                let w = match writer {
                    Some(w) => w,
                    None => writer_for("json").ok_or_else(|| anyhow::anyhow!("json writer missing"))?,
                };
                let path = write_to_file(w.as_ref(), &report, &dir)?;
                println!("Report written to {}", path.display());
            }
            if timing {
                print_perf_summary(&engine.perf());
            }
            if report.outcome.is_error() {
                bail!("sync of {} failed", report.fixture);
            }
        }
        Command::Run => {
            if cfg.fixtures.is_empty() {
                bail!("no fixtures configured in {}", cli.config);
            }
            let engine = matchsync::build_engine(&cfg).await?;
            let n = engine.track_all(&cfg.fixtures).await?;
            info!(fixtures = n, jobs = engine.jobs()?.len(), "polling started");

            tokio::signal::ctrl_c().await?;
            engine.shutdown()?;
            print_perf_summary(&engine.perf());
        }
    }

    Ok(())
}

//! Luna - personal cycle tracker.
//!
//! Command-line front end over the cycle tracker: onboarding, daily logs,
//! status with lost-cycle recovery, calendar markings, and statistics.

mod commands;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;
use luna_storage::{CycleTracker, Database};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::Command;

/// Luna - personal cycle tracker
#[derive(Parser, Debug)]
#[command(name = "luna", version, about)]
struct Args {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Print JSON instead of text where supported
    #[arg(long, global = true)]
    json: bool,

    /// How many days back a period edit may reach
    #[arg(long, global = true)]
    edit_window: Option<i64>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    Database::project_dirs()
        .ok()
        .map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging: console plus a daily-rotated file when possible.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("luna={},warn", log_level)));

    if let Some(log_dir) = logs_dir() {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("luna")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::debug!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("File logging unavailable, using console only");
    None
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive for the duration of the program
    let _log_guard = init_logging(&args);
    tracing::debug!("Args: {:?}", args);

    let db = match &args.db {
        Some(path) => Database::with_path(path),
        None => Database::new(),
    }
    .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    let mut config = db.app_config()?;
    if let Some(days) = args.edit_window {
        config.period_edit_window_days = days;
    }

    let mut tracker = CycleTracker::with_config(db, config)?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let output = commands::run(&mut tracker, args.command, today, args.json)?;
    println!("{output}");

    Ok(())
}

//! Hearth CLI - Household expense analytics
//!
//! Usage:
//!   hearth init                   Initialize database
//!   hearth import --file CSV      Import the spreadsheet export
//!   hearth anomalies --days 90    List unusual expenses
//!   hearth predict                Predict this month's total spending

mod cli;
mod commands;


use std::path::Path;

use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::Parser;
use hearth_core::analytics::Analytics;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = cli.config.as_deref();
    let json = cli.json;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Validate { file } => {
            if !commands::cmd_validate(&file, json)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_import(&db, &file)
        }
        Commands::Add {
            date,
            amount,
            category,
            method,
            place,
            notes,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_add(
                &db,
                &date,
                amount,
                &category,
                &method,
                place.as_deref(),
                notes.as_deref(),
            )
        }
        Commands::Sufficiency => with_analytics(&cli.db, config, |a| {
            commands::cmd_sufficiency(a, json)
        }),
        Commands::DayOfWeek { from, to } => with_analytics(&cli.db, config, |a| {
            commands::cmd_day_of_week(a, from.as_deref(), to.as_deref(), json)
        }),
        Commands::Recurring => {
            with_analytics(&cli.db, config, |a| commands::cmd_recurring(a, json))
        }
        Commands::Seasonal { months } => {
            with_analytics(&cli.db, config, |a| commands::cmd_seasonal(a, months, json))
        }
        Commands::Baseline { category, days } => with_analytics(&cli.db, config, |a| {
            commands::cmd_baseline(a, &category, days, json)
        }),
        Commands::Anomalies { days, from, to } => with_analytics(&cli.db, config, |a| {
            commands::cmd_anomalies(a, days, from.as_deref(), to.as_deref(), json)
        }),
        Commands::Dismiss { id } => {
            with_analytics(&cli.db, config, |a| commands::cmd_dismiss(a, id))
        }
        Commands::ClearDismissed => {
            with_analytics(&cli.db, config, commands::cmd_clear_dismissed)
        }
        Commands::Predict { year, month } => with_analytics(&cli.db, config, |a| {
            let today = Utc::now().date_naive();
            commands::cmd_predict(
                a,
                year.unwrap_or(today.year()),
                month.unwrap_or(today.month()),
                json,
            )
        }),
    }
}

/// Open the database and config, then run an analytics command
fn with_analytics<F>(db_path: &Path, config: Option<&Path>, run: F) -> Result<()>
where
    F: FnOnce(&Analytics) -> Result<()>,
{
    let db = commands::open_db(db_path)?;
    let config = commands::load_config(config)?;
    run(&Analytics::with_config(&db, config))
}

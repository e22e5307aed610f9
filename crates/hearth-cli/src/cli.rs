//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Hearth - Household expense analytics
#[derive(Parser)]
#[command(name = "hearth")]
#[command(about = "Spending patterns, anomalies and month-end predictions for household expenses", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "hearth.db", global = true)]
    pub db: PathBuf,

    /// Analytics config file (defaults to the data-dir override, then built-in values)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON with data quality metadata
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import expenses from a spreadsheet CSV export
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Check a CSV export for invalid rows without importing
    Validate {
        /// CSV file to check
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Record a single expense
    Add {
        /// Date of the expense (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Amount spent
        #[arg(long)]
        amount: f64,

        /// Expense category (e.g. "Groceries", "Dining Out")
        #[arg(long)]
        category: String,

        /// Payment method (e.g. "Debit", "VISA")
        #[arg(long, default_value = "Debit")]
        method: String,

        /// Merchant or payee
        #[arg(long)]
        place: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show how much history is available and how reliable analytics are
    Sufficiency,

    /// Spending by day of week
    DayOfWeek {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Charges that repeat across months
    Recurring,

    /// Monthly and quarterly spending trends
    Seasonal {
        /// Months to look back (0 for all history)
        #[arg(long)]
        months: Option<u32>,
    },

    /// Mean and standard deviation of one category's spending
    Baseline {
        /// Expense category
        #[arg(short, long)]
        category: String,

        /// Days to look back (defaults to the configured lookback)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Expenses far outside their category's usual amount
    Anomalies {
        /// Days to look back (defaults to the configured lookback)
        #[arg(long)]
        days: Option<u32>,

        /// Only show anomalies on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only show anomalies on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Hide an anomaly from future results
    Dismiss {
        /// Expense ID of the anomaly
        id: i64,
    },

    /// Show every dismissed anomaly again
    ClearDismissed,

    /// Predict total spending for a month
    Predict {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
    },
}

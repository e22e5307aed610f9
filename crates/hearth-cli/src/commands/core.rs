//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Shared utility to load analytics tuning
//! - `cmd_init` - Initialize the database
//! - `cmd_add` - Record a single expense

use std::path::Path;

use anyhow::{Context, Result};
use hearth_core::config::AnalyticsConfig;
use hearth_core::db::Database;
use hearth_core::models::{ExpenseCategory, NewExpense, PaymentMethod};

use super::parse_date_arg;

/// Open (and migrate) the database at `db_path`
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    Database::new(path_str).context("Failed to open database")
}

/// Load analytics config from `--config`, the data-dir override or built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    AnalyticsConfig::load(path).context("Failed to load analytics config")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let count = db.count_expenses()?;

    println!("✅ Database initialized successfully!");
    if count > 0 {
        println!("   {} expenses already recorded", count);
    }
    println!();
    println!("Next steps:");
    println!("  1. Check your export: hearth validate --file expenses.csv");
    println!("  2. Import expenses:   hearth import --file expenses.csv");
    println!("  3. See predictions:   hearth predict");

    Ok(())
}

pub fn cmd_add(
    db: &Database,
    date: &str,
    amount: f64,
    category: &str,
    method: &str,
    place: Option<&str>,
    notes: Option<&str>,
) -> Result<()> {
    let date = parse_date_arg(date, "--date")?;
    let category: ExpenseCategory = category.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let method: PaymentMethod = method.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let mut expense = NewExpense::new(date, amount, category, method);
    if let Some(place) = place {
        expense = expense.with_place(place);
    }
    if let Some(notes) = notes {
        expense = expense.with_notes(notes);
    }

    let id = db.insert_expense(&expense).context("Failed to record expense")?;
    println!(
        "✅ Recorded expense #{}: ${:.2} {} on {}",
        id, amount, category, date
    );

    Ok(())
}

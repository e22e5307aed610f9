//! CSV import and validation command implementations

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use hearth_core::db::Database;
use hearth_core::import::{parse_expense_csv, validate_expense_csv};
use tracing::info;

use super::print_json;

pub fn cmd_import(db: &Database, file: &Path) -> Result<()> {
    println!("📥 Importing expenses from {}...", file.display());

    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let expenses = parse_expense_csv(csv_file)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    println!("   Found {} expenses", expenses.len());

    db.insert_expenses(&expenses)?;
    let total: f64 = expenses.iter().map(|e| e.amount).sum();

    info!(count = expenses.len(), file = %file.display(), "Imported expenses");

    println!();
    println!("✅ Import complete!");
    println!("   Imported: {}", expenses.len());
    println!("   Total:    ${:.2}", total);

    Ok(())
}

/// Validate a CSV export, returning whether every row is valid
pub fn cmd_validate(file: &Path, json: bool) -> Result<bool> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let report = validate_expense_csv(csv_file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if json {
        print_json(&report)?;
        return Ok(report.is_valid());
    }

    println!("🔎 Validation results for {}", file.display());
    println!("   ✓ Valid rows:   {}", report.valid_rows);
    println!("   ✗ Invalid rows: {}", report.errors.len());

    if report.is_valid() {
        println!();
        println!("✅ No errors found! All rows are valid.");
    } else {
        println!();
        for error in &report.errors {
            println!("   Row {:>5}: {}", error.row, error.message);
        }
    }

    Ok(report.is_valid())
}

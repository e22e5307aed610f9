//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, add) and shared utilities (open_db, load_config)
//! - `import` - CSV import and validation
//! - `analytics` - Sufficiency, spending patterns and month-end prediction
//! - `anomalies` - Category baselines, anomaly listing and dismissals

pub mod analytics;
pub mod anomalies;
pub mod core;
pub mod import;

// Re-export command functions for main.rs
pub use analytics::*;
pub use anomalies::*;
pub use core::*;
pub use import::*;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse a YYYY-MM-DD command-line date
pub fn parse_date_arg(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date '{}' (use YYYY-MM-DD)", flag, value))
}

/// Pretty-print any result as JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Format an optional percentage change, e.g. "+12.5%"
pub fn format_change(change: Option<f64>) -> String {
    match change {
        Some(change) => format!("{:+.1}%", change),
        None => "-".to_string(),
    }
}

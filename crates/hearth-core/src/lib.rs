//! Hearth Core Library
//!
//! Shared functionality for the Hearth household expense tool:
//! - Database access and migrations
//! - CSV import and validation for the spreadsheet export
//! - Analytics: data sufficiency, spending patterns, anomalies, month-end
//!   prediction and response metadata
//! - Analytics tuning loaded from TOML

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;

/// Expense fixtures for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analytics::Analytics;
pub use config::AnalyticsConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use import::{parse_expense_csv, validate_expense_csv, RowError, ValidationReport};
pub use models::{
    DateRange, DismissedAnomaly, Expense, ExpenseCategory, ExpenseFilter, NewExpense,
    PaymentMethod,
};

//! Expense fixtures for tests
//!
//! Enabled for unit tests and, via the `test-utils` feature, for downstream
//! crates' tests.

use chrono::{Months, NaiveDate};

use crate::db::Database;
use crate::models::{ExpenseCategory, NewExpense, PaymentMethod};

/// Shorthand for a calendar date; panics on an invalid date
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Insert an expense paid by debit, returning its id
pub fn add_expense(db: &Database, date: NaiveDate, amount: f64, category: ExpenseCategory) -> i64 {
    db.insert_expense(&NewExpense::new(date, amount, category, PaymentMethod::Debit))
        .expect("insert test expense")
}

/// Insert an expense at a named place, returning its id
pub fn add_expense_at(
    db: &Database,
    date: NaiveDate,
    amount: f64,
    category: ExpenseCategory,
    place: &str,
) -> i64 {
    db.insert_expense(
        &NewExpense::new(date, amount, category, PaymentMethod::Visa).with_place(place),
    )
    .expect("insert test expense")
}

/// Insert one Groceries expense per month for `months` consecutive months,
/// starting at `start` and keeping its day of month
pub fn seed_monthly(db: &Database, start: NaiveDate, months: u32, amount: f64) -> Vec<i64> {
    (0..months)
        .map(|i| {
            let day = start
                .checked_add_months(Months::new(i))
                .expect("month in range");
            add_expense(db, day, amount, ExpenseCategory::Groceries)
        })
        .collect()
}

//! Expense operations
//!
//! These are the read interfaces the analytics engine consumes: every query
//! takes an inclusive date range and/or a category and returns the full
//! matching set or an error.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{week_of_month, Expense, ExpenseFilter, NewExpense};

/// Spending total for one calendar month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthTotal {
    pub year: i32,
    pub month: u32,
    pub total: f64,
    pub count: i64,
}

const EXPENSE_COLUMNS: &str =
    "id, date, place, notes, amount, category, payment_method, week, created_at";

impl Database {
    /// Insert an expense, returning its id
    ///
    /// Amounts are rounded to cents. Negative or non-finite amounts are rejected.
    pub fn insert_expense(&self, expense: &NewExpense) -> Result<i64> {
        check_amount(expense)?;
        let conn = self.conn()?;
        insert_row(&conn, expense)
    }

    /// Insert a batch of expenses in one transaction, returning their ids
    ///
    /// Either every expense is stored or none is.
    pub fn insert_expenses(&self, expenses: &[NewExpense]) -> Result<Vec<i64>> {
        for expense in expenses {
            check_amount(expense)?;
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let ids = expenses
            .iter()
            .map(|expense| insert_row(&tx, expense))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;

        debug!(count = ids.len(), "Inserted expense batch");
        Ok(ids)
    }

    /// Get an expense by id
    pub fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS);
        let expense = conn
            .query_row(&sql, params![id], Self::row_to_expense)
            .optional()?;
        Ok(expense)
    }

    /// Delete an expense and any dismissal recorded for it
    pub fn delete_expense(&self, id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM dismissed_anomalies WHERE expense_id = ?",
            params![id],
        )?;
        let deleted = tx.execute("DELETE FROM expenses WHERE id = ?", params![id])?;
        tx.commit()?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Expense {}", id)));
        }
        Ok(())
    }

    /// List expenses matching a filter, oldest first
    ///
    /// The date range is inclusive on both ends. A reversed range matches nothing.
    pub fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        if filter.range.is_some_and(|r| r.is_empty()) {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let (where_clause, params) = filter_clause(filter);
        let sql = format!(
            "SELECT {} FROM expenses {} ORDER BY date ASC, id ASC",
            EXPENSE_COLUMNS, where_clause
        );

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let expenses = stmt
            .query_map(param_refs.as_slice(), Self::row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(count = expenses.len(), "Loaded expenses");
        Ok(expenses)
    }

    /// Count all expenses
    pub fn count_expenses(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count distinct calendar months with at least one expense
    pub fn count_distinct_months(&self, filter: &ExpenseFilter) -> Result<i64> {
        if filter.range.is_some_and(|r| r.is_empty()) {
            return Ok(0);
        }

        let conn = self.conn()?;
        let (where_clause, params) = filter_clause(filter);
        let sql = format!(
            "SELECT COUNT(DISTINCT strftime('%Y-%m', date)) FROM expenses {}",
            where_clause
        );
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    /// Earliest and latest expense dates matching a filter, plus the match count
    pub fn expense_date_bounds(
        &self,
        filter: &ExpenseFilter,
    ) -> Result<Option<(NaiveDate, NaiveDate, i64)>> {
        if filter.range.is_some_and(|r| r.is_empty()) {
            return Ok(None);
        }

        let conn = self.conn()?;
        let (where_clause, params) = filter_clause(filter);
        let sql = format!(
            "SELECT MIN(date), MAX(date), COUNT(*) FROM expenses {}",
            where_clause
        );
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let (first, last, count): (Option<String>, Option<String>, i64) =
            conn.query_row(&sql, param_refs.as_slice(), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;

        match (first, last) {
            (Some(first), Some(last)) => Ok(Some((
                parse_date_column(&first, 0)?,
                parse_date_column(&last, 1)?,
                count,
            ))),
            _ => Ok(None),
        }
    }

    /// Spending totals per calendar month, oldest first
    ///
    /// Months without expenses are not returned.
    pub fn monthly_totals(&self, filter: &ExpenseFilter) -> Result<Vec<MonthTotal>> {
        if filter.range.is_some_and(|r| r.is_empty()) {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let (where_clause, params) = filter_clause(filter);
        let sql = format!(
            r#"
            SELECT CAST(strftime('%Y', date) AS INTEGER) AS y,
                   CAST(strftime('%m', date) AS INTEGER) AS m,
                   COALESCE(SUM(amount), 0),
                   COUNT(*)
            FROM expenses
            {}
            GROUP BY y, m
            ORDER BY y, m
            "#,
            where_clause
        );
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let totals = stmt
            .query_map(param_refs.as_slice(), |row| {
                Ok(MonthTotal {
                    year: row.get(0)?,
                    month: row.get(1)?,
                    total: row.get(2)?,
                    count: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(totals)
    }

    pub(crate) fn row_to_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
        let date_str: String = row.get(1)?;
        let category_str: String = row.get(5)?;
        let method_str: String = row.get(6)?;
        let created_at_str: String = row.get(8)?;

        Ok(Expense {
            id: row.get(0)?,
            date: parse_date_column(&date_str, 1)?,
            place: row.get(2)?,
            notes: row.get(3)?,
            amount: row.get(4)?,
            category: category_str
                .parse()
                .map_err(|e: String| conversion_error(5, e))?,
            payment_method: method_str
                .parse()
                .map_err(|e: String| conversion_error(6, e))?,
            week: row.get(7)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}

/// Build the WHERE clause and parameters for an expense filter
fn filter_clause(filter: &ExpenseFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(range) = filter.range {
        conditions.push("date BETWEEN ? AND ?");
        params.push(Box::new(range.start.to_string()));
        params.push(Box::new(range.end.to_string()));
    }

    if let Some(category) = filter.category {
        conditions.push("category = ?");
        params.push(Box::new(category.as_str()));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (clause, params)
}

fn parse_date_column(s: &str, column: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn check_amount(expense: &NewExpense) -> Result<()> {
    if !expense.amount.is_finite() || expense.amount < 0.0 {
        return Err(Error::InvalidData(format!(
            "Expense amount must be a non-negative number, got {}",
            expense.amount
        )));
    }
    Ok(())
}

fn insert_row(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    let amount = (expense.amount * 100.0).round() / 100.0;

    conn.execute(
        r#"
        INSERT INTO expenses (date, place, notes, amount, category, payment_method, week)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            expense.date.to_string(),
            expense.place,
            expense.notes,
            amount,
            expense.category.as_str(),
            expense.payment_method.as_str(),
            week_of_month(expense.date),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `expenses` - Expense inserts and the filtered read queries analytics run on
//! - `anomalies` - The persisted dismissed-anomaly set

use std::time::Duration;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;

mod anomalies;
mod expenses;

pub use expenses::MonthTotal;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` so every pooled
    /// connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "hearth_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any leftover file from an earlier run
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block writers, so analytics reads keep
            -- going while dismissals are written
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Store temp tables in memory (faster for GROUP BY queries)
            PRAGMA temp_store = MEMORY;

            -- Expenses
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                date DATE NOT NULL,
                place TEXT,
                notes TEXT,
                amount REAL NOT NULL CHECK (amount >= 0),
                category TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                week INTEGER NOT NULL CHECK (week BETWEEN 1 AND 5),
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            CREATE INDEX IF NOT EXISTS idx_expenses_category_date ON expenses(category, date);

            -- Dismissed anomalies (one row per expense, no duplicates)
            CREATE TABLE IF NOT EXISTS dismissed_anomalies (
                expense_id INTEGER PRIMARY KEY,
                dismissed_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.count_expenses().unwrap(), 0);
        assert!(db.dismissed_anomaly_ids().unwrap().is_empty());
    }

    #[test]
    fn test_schema_exists() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('expenses') WHERE name IN ('id', 'date', 'place', 'notes', 'amount', 'category', 'payment_method', 'week', 'created_at')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 9, "expenses table should have 9 expected columns");

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('dismissed_anomalies') WHERE name IN ('expense_id', 'dismissed_at')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 2);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::in_memory().unwrap();
        db.run_migrations().unwrap();
        db.run_migrations().unwrap();
    }

    #[test]
    fn test_reopen_keeps_data() {
        use crate::models::{ExpenseCategory, NewExpense, PaymentMethod};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearth.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::new(path).unwrap();
            db.insert_expense(&NewExpense::new(
                chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                12.5,
                ExpenseCategory::Groceries,
                PaymentMethod::Debit,
            ))
            .unwrap();
        }

        let db = Database::new(path).unwrap();
        assert_eq!(db.count_expenses().unwrap(), 1);
        assert_eq!(db.path(), path);
    }
}

//! Dismissed-anomaly operations
//!
//! The table is the only source of truth for dismissals. Each write is a
//! single statement, so concurrent dismiss/clear calls never lose rows.

use std::collections::HashSet;

use rusqlite::params;
use tracing::info;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::DismissedAnomaly;

impl Database {
    /// Dismiss the anomaly for an expense
    ///
    /// Dismissing the same expense again is a no-op. Returns true when a new
    /// dismissal was recorded.
    pub fn dismiss_anomaly(&self, expense_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO dismissed_anomalies (expense_id) VALUES (?)",
            params![expense_id],
        )?;
        Ok(inserted > 0)
    }

    /// Ids of all expenses whose anomalies were dismissed
    pub fn dismissed_anomaly_ids(&self) -> Result<HashSet<i64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT expense_id FROM dismissed_anomalies")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<HashSet<i64>, _>>()?;
        Ok(ids)
    }

    /// List dismissals, most recent first
    pub fn list_dismissed_anomalies(&self) -> Result<Vec<DismissedAnomaly>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT expense_id, dismissed_at FROM dismissed_anomalies ORDER BY dismissed_at DESC, expense_id DESC",
        )?;
        let dismissed = stmt
            .query_map([], |row| {
                let dismissed_at: String = row.get(1)?;
                Ok(DismissedAnomaly {
                    expense_id: row.get(0)?,
                    dismissed_at: parse_datetime(&dismissed_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(dismissed)
    }

    /// Remove every dismissal, returning how many were cleared
    pub fn clear_dismissed_anomalies(&self) -> Result<usize> {
        let conn = self.conn()?;
        let cleared = conn.execute("DELETE FROM dismissed_anomalies", [])?;
        info!(cleared, "Cleared dismissed anomalies");
        Ok(cleared)
    }
}

//! Analytics engine - derived signals over recorded expenses
//!
//! Every entry point recomputes from the current store contents; nothing is
//! cached between calls.
//!
//! ## Components
//!
//! - **Data sufficiency** - months of history and a 0-100 quality score
//! - **Spending patterns** - day-of-week buckets, recurring charges, seasonal trends
//! - **Anomalies** - per-category baselines, z-score outliers, persisted dismissals
//! - **Prediction** - month-end spending projection
//! - **Metadata** - `{data_quality, confidence_level}` envelope for any result
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hearth_core::analytics::Analytics;
//!
//! let analytics = Analytics::new(&db);
//! let prediction = analytics.get_month_end_prediction(2024, 3)?;
//! let response = analytics.with_metadata(prediction)?;
//! ```

use chrono::{NaiveDate, Utc};

use crate::config::AnalyticsConfig;
use crate::db::Database;
use crate::error::Result;

pub mod anomalies;
pub mod metadata;
pub mod patterns;
pub mod prediction;
pub mod recurring;
pub mod stats;
pub mod sufficiency;

pub use anomalies::{Anomaly, AnomalyQuery, AnomalySeverity, CategoryBaseline};
pub use metadata::{attach_metadata, Listing, ResponseMetadata, WithMetadata};
pub use patterns::{DayOfWeekPattern, DaySpending, MonthlyTrend, QuarterlyTrend, SeasonalAnalysis};
pub use prediction::{CategoryPrediction, MonthEndPrediction};
pub use recurring::{RecurrenceFrequency, RecurringPattern};
pub use sufficiency::{ConfidenceLevel, DataSufficiency};

/// Entry point for every analytics computation
pub struct Analytics<'a> {
    db: &'a Database,
    config: AnalyticsConfig,
    /// Reference date for lookback windows and month progress
    today: NaiveDate,
}

impl<'a> Analytics<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self::with_config(db, AnalyticsConfig::default())
    }

    pub fn with_config(db: &'a Database, config: AnalyticsConfig) -> Self {
        Self {
            db,
            config,
            today: Utc::now().date_naive(),
        }
    }

    /// Pin the reference date (lookback windows end here)
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Wrap a result with metadata computed from the full history
    pub fn with_metadata<T>(&self, result: T) -> Result<WithMetadata<T>> {
        let sufficiency = self.check_data_sufficiency(None)?;
        Ok(attach_metadata(result, &sufficiency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{date, seed_monthly};

    #[test]
    fn test_with_metadata_uses_full_history() {
        let db = Database::in_memory().unwrap();
        seed_monthly(&db, date(2023, 1, 15), 12, 50.0);

        let analytics = Analytics::new(&db).as_of(date(2023, 12, 31));
        let wrapped = analytics.with_metadata(Listing::from(vec![1])).unwrap();
        assert_eq!(wrapped.metadata.confidence_level, ConfidenceLevel::High);
        assert_eq!(wrapped.metadata.data_quality, 100.0);
    }

    #[test]
    fn test_as_of_pins_today() {
        let db = Database::in_memory().unwrap();
        let analytics = Analytics::new(&db).as_of(date(2020, 2, 29));
        assert_eq!(analytics.today(), date(2020, 2, 29));
        assert_eq!(analytics.config(), &AnalyticsConfig::default());
    }
}

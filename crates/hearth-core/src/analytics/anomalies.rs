//! Statistical anomaly detection
//!
//! Each category gets its own baseline (mean and population standard
//! deviation) over a lookback window. An expense is anomalous when it sits
//! more than `anomaly_z_threshold` standard deviations from its category
//! mean. Baselines never mix categories, so an outlier in one category cannot
//! shift another's baseline.
//!
//! Dismissals are read from the store on every call.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::stats::{mean_and_std_dev, round_currency, safe_percent, safe_ratio};
use super::Analytics;
use crate::error::Result;
use crate::models::{DateRange, Expense, ExpenseCategory, ExpenseFilter};

/// Mean and spread of one category's amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBaseline {
    pub category: ExpenseCategory,
    pub mean: f64,
    /// Population standard deviation; 0 with fewer than two samples
    pub std_dev: f64,
    pub sample_count: usize,
}

/// How far an anomaly sits from its baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    /// Past the configured threshold
    Warning,
    /// At least one standard deviation past the threshold
    Critical,
}

impl AnomalySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalySeverity::Warning => "warning",
            AnomalySeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An expense flagged as unusual for its category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub expense_id: i64,
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub place: Option<String>,
    pub amount: f64,
    pub category_mean: f64,
    pub category_std_dev: f64,
    /// Signed distance from the mean in standard deviations
    pub z_score: f64,
    /// Signed distance from the mean as a percentage of the mean
    pub deviation_percent: f64,
    pub severity: AnomalySeverity,
}

/// Options for anomaly detection
#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyQuery {
    /// Baseline window in days, ending today; config default when None
    pub lookback_days: Option<u32>,
    /// Only report anomalies dated inside this inclusive range
    pub display_range: Option<DateRange>,
}

impl AnomalyQuery {
    pub fn lookback(days: u32) -> Self {
        Self {
            lookback_days: Some(days),
            display_range: None,
        }
    }

    pub fn with_display_range(mut self, range: DateRange) -> Self {
        self.display_range = Some(range);
        self
    }
}

fn baseline_for(category: ExpenseCategory, expenses: &[&Expense]) -> CategoryBaseline {
    let amounts: Vec<f64> = expenses.iter().map(|e| e.amount).collect();
    let (mean, std_dev) = mean_and_std_dev(&amounts);
    CategoryBaseline {
        category,
        mean,
        std_dev,
        sample_count: amounts.len(),
    }
}

impl Analytics<'_> {
    /// Inclusive window of `lookback_days` ending today
    fn lookback_window(&self, lookback_days: Option<u32>) -> DateRange {
        let days = lookback_days.unwrap_or(self.config.anomaly_lookback_days);
        let start = self
            .today
            .checked_sub_days(Days::new(days as u64))
            .unwrap_or(NaiveDate::MIN);
        DateRange::new(start, self.today)
    }

    /// Mean and standard deviation of a category's amounts within the lookback
    pub fn calculate_category_baseline(
        &self,
        category: ExpenseCategory,
        lookback_days: Option<u32>,
    ) -> Result<CategoryBaseline> {
        let window = self.lookback_window(lookback_days);
        let expenses = self
            .db
            .list_expenses(&ExpenseFilter::in_range(window).with_category(category))?;
        let refs: Vec<&Expense> = expenses.iter().collect();

        let baseline = baseline_for(category, &refs);
        Ok(CategoryBaseline {
            mean: round_currency(baseline.mean),
            std_dev: round_currency(baseline.std_dev),
            ..baseline
        })
    }

    /// Flag expenses that deviate from their category baseline
    ///
    /// Dismissed expenses are skipped. Results are newest first.
    pub fn detect_anomalies(&self, query: AnomalyQuery) -> Result<Vec<Anomaly>> {
        let window = self.lookback_window(query.lookback_days);
        let expenses = self.db.list_expenses(&ExpenseFilter::in_range(window))?;
        if expenses.is_empty() {
            return Ok(Vec::new());
        }

        let dismissed = self.db.dismissed_anomaly_ids()?;

        let mut by_category: BTreeMap<ExpenseCategory, Vec<&Expense>> = BTreeMap::new();
        for expense in &expenses {
            by_category.entry(expense.category).or_default().push(expense);
        }

        let threshold = self.config.anomaly_z_threshold;
        let mut anomalies = Vec::new();

        for (category, group) in &by_category {
            let baseline = baseline_for(*category, group);
            if baseline.sample_count < self.config.anomaly_min_samples || baseline.std_dev <= 0.0 {
                continue;
            }

            for expense in group {
                if dismissed.contains(&expense.id) {
                    continue;
                }
                if let Some(range) = query.display_range {
                    if !range.contains(expense.date) {
                        continue;
                    }
                }

                let deviation = expense.amount - baseline.mean;
                if deviation.abs() <= threshold * baseline.std_dev {
                    continue;
                }

                let z_score = safe_ratio(deviation, baseline.std_dev);
                let severity = if z_score.abs() >= threshold + 1.0 {
                    AnomalySeverity::Critical
                } else {
                    AnomalySeverity::Warning
                };

                anomalies.push(Anomaly {
                    expense_id: expense.id,
                    date: expense.date,
                    category: *category,
                    place: expense.place.clone(),
                    amount: expense.amount,
                    category_mean: round_currency(baseline.mean),
                    category_std_dev: round_currency(baseline.std_dev),
                    z_score: round_currency(z_score),
                    deviation_percent: round_currency(safe_percent(deviation, baseline.mean)),
                    severity,
                });
            }
        }

        anomalies.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.expense_id.cmp(&a.expense_id)));

        debug!(
            expenses = expenses.len(),
            categories = by_category.len(),
            dismissed = dismissed.len(),
            anomalies = anomalies.len(),
            "Detected anomalies"
        );

        Ok(anomalies)
    }

    /// Hide an expense's anomaly from future detection results
    ///
    /// Dismissing twice is the same as dismissing once.
    pub fn dismiss_anomaly(&self, expense_id: i64) -> Result<()> {
        if self.db.dismiss_anomaly(expense_id)? {
            info!(expense_id, "Dismissed anomaly");
        }
        Ok(())
    }

    /// Forget every dismissal
    pub fn clear_dismissed_anomalies(&self) -> Result<()> {
        self.db.clear_dismissed_anomalies()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::test_utils::{add_expense, date};

    /// Nine $50 grocery runs and one $500 one in March 2024
    fn seed_grocery_outlier(db: &Database) -> i64 {
        for day in 1..=9 {
            add_expense(db, date(2024, 3, day), 50.0, ExpenseCategory::Groceries);
        }
        add_expense(db, date(2024, 3, 10), 500.0, ExpenseCategory::Groceries)
    }

    #[test]
    fn test_baseline_single_sample() {
        let db = Database::in_memory().unwrap();
        add_expense(&db, date(2024, 3, 10), 42.5, ExpenseCategory::PetCare);

        let analytics = Analytics::new(&db).as_of(date(2024, 3, 31));
        let baseline = analytics
            .calculate_category_baseline(ExpenseCategory::PetCare, None)
            .unwrap();
        assert_eq!(baseline.mean, 42.5);
        assert_eq!(baseline.std_dev, 0.0);
        assert_eq!(baseline.sample_count, 1);
    }

    #[test]
    fn test_baseline_empty_category() {
        let db = Database::in_memory().unwrap();
        let analytics = Analytics::new(&db).as_of(date(2024, 3, 31));
        let baseline = analytics
            .calculate_category_baseline(ExpenseCategory::Gas, Some(30))
            .unwrap();
        assert_eq!(baseline.mean, 0.0);
        assert_eq!(baseline.std_dev, 0.0);
        assert_eq!(baseline.sample_count, 0);
    }

    #[test]
    fn test_baseline_respects_lookback() {
        let db = Database::in_memory().unwrap();
        add_expense(&db, date(2024, 1, 1), 1000.0, ExpenseCategory::Gas);
        add_expense(&db, date(2024, 3, 20), 40.0, ExpenseCategory::Gas);
        add_expense(&db, date(2024, 3, 25), 60.0, ExpenseCategory::Gas);

        let analytics = Analytics::new(&db).as_of(date(2024, 3, 31));
        let baseline = analytics
            .calculate_category_baseline(ExpenseCategory::Gas, Some(30))
            .unwrap();
        assert_eq!(baseline.sample_count, 2);
        assert_eq!(baseline.mean, 50.0);
        assert_eq!(baseline.std_dev, 10.0);
    }

    #[test]
    fn test_detect_anomalies_empty_store() {
        let db = Database::in_memory().unwrap();
        let anomalies = Analytics::new(&db)
            .detect_anomalies(AnomalyQuery::default())
            .unwrap();
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_detects_outlier() {
        let db = Database::in_memory().unwrap();
        let outlier = seed_grocery_outlier(&db);

        let analytics = Analytics::new(&db).as_of(date(2024, 3, 31));
        let anomalies = analytics.detect_anomalies(AnomalyQuery::default()).unwrap();

        assert_eq!(anomalies.len(), 1);
        let anomaly = &anomalies[0];
        assert_eq!(anomaly.expense_id, outlier);
        assert_eq!(anomaly.amount, 500.0);
        assert_eq!(anomaly.category_mean, 95.0);
        assert_eq!(anomaly.category_std_dev, 135.0);
        assert_eq!(anomaly.z_score, 3.0);
        assert_eq!(anomaly.severity, AnomalySeverity::Critical);
        assert!(anomaly.deviation_percent > 400.0);
    }

    #[test]
    fn test_categories_are_independent() {
        let db = Database::in_memory().unwrap();
        let outlier = seed_grocery_outlier(&db);
        // Steady gas spending with one big fill-up that is normal for gas
        for day in 1..=5 {
            add_expense(&db, date(2024, 3, day), 480.0 + day as f64, ExpenseCategory::Gas);
        }

        let analytics = Analytics::new(&db).as_of(date(2024, 3, 31));
        let anomalies = analytics.detect_anomalies(AnomalyQuery::default()).unwrap();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].expense_id, outlier);
    }

    #[test]
    fn test_too_few_samples_never_flagged() {
        let db = Database::in_memory().unwrap();
        add_expense(&db, date(2024, 3, 1), 10.0, ExpenseCategory::Entertainment);
        add_expense(&db, date(2024, 3, 2), 900.0, ExpenseCategory::Entertainment);

        let analytics = Analytics::new(&db).as_of(date(2024, 3, 31));
        assert!(analytics
            .detect_anomalies(AnomalyQuery::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_dismissal_is_idempotent_until_cleared() {
        let db = Database::in_memory().unwrap();
        let outlier = seed_grocery_outlier(&db);
        let analytics = Analytics::new(&db).as_of(date(2024, 3, 31));

        analytics.dismiss_anomaly(outlier).unwrap();
        analytics.dismiss_anomaly(outlier).unwrap();
        assert!(analytics
            .detect_anomalies(AnomalyQuery::default())
            .unwrap()
            .is_empty());
        assert!(analytics
            .detect_anomalies(AnomalyQuery::default())
            .unwrap()
            .is_empty());

        analytics.clear_dismissed_anomalies().unwrap();
        let anomalies = analytics.detect_anomalies(AnomalyQuery::default()).unwrap();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].expense_id, outlier);
    }

    #[test]
    fn test_display_range_applied_after_detection() {
        let db = Database::in_memory().unwrap();
        seed_grocery_outlier(&db);
        let analytics = Analytics::new(&db).as_of(date(2024, 3, 31));

        // Ends the day before the outlier
        let before = DateRange::new(date(2024, 3, 1), date(2024, 3, 9));
        assert!(analytics
            .detect_anomalies(AnomalyQuery::default().with_display_range(before))
            .unwrap()
            .is_empty());

        // Bounds are inclusive
        let exact = DateRange::new(date(2024, 3, 10), date(2024, 3, 10));
        assert_eq!(
            analytics
                .detect_anomalies(AnomalyQuery::default().with_display_range(exact))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_lookback_excludes_old_expenses() {
        let db = Database::in_memory().unwrap();
        seed_grocery_outlier(&db);

        // 2024-06-30 minus 30 days leaves March out of the window
        let analytics = Analytics::new(&db).as_of(date(2024, 6, 30));
        assert!(analytics
            .detect_anomalies(AnomalyQuery::lookback(30))
            .unwrap()
            .is_empty());
        assert_eq!(
            analytics
                .detect_anomalies(AnomalyQuery::lookback(365))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_zero_amounts_produce_no_anomalies() {
        let db = Database::in_memory().unwrap();
        for day in 1..=5 {
            add_expense(&db, date(2024, 3, day), 0.0, ExpenseCategory::Other);
        }
        let analytics = Analytics::new(&db).as_of(date(2024, 3, 31));
        assert!(analytics
            .detect_anomalies(AnomalyQuery::default())
            .unwrap()
            .is_empty());

        let baseline = analytics
            .calculate_category_baseline(ExpenseCategory::Other, None)
            .unwrap();
        assert_eq!(baseline.std_dev, 0.0);
        assert!(baseline.mean.is_finite());
    }
}

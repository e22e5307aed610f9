//! Month-end spending prediction
//!
//! Two estimates are blended by how far through the month we are:
//! - a linear projection of the month's spending so far
//! - the average monthly total over the previous twelve months
//!
//! Early in the month the historical average dominates; by the last day the
//! projection equals what was actually spent. A prediction is never below
//! what has already been spent.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stats::{percent_change, round_currency, safe_average, safe_ratio};
use super::sufficiency::ConfidenceLevel;
use super::Analytics;
use crate::error::Result;
use crate::models::{DateRange, ExpenseCategory, ExpenseFilter};

/// Months of history the historical average looks back over
const HISTORY_MONTHS: u32 = 12;

/// Predicted spending for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrediction {
    pub category: ExpenseCategory,
    pub current_spent: f64,
    pub predicted_total: f64,
}

/// Projected total spending for a calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthEndPrediction {
    pub year: i32,
    pub month: u32,
    pub current_spent: f64,
    /// Always finite and never below `current_spent`
    pub predicted_total: f64,
    pub confidence_level: ConfidenceLevel,
    pub days_elapsed: u32,
    pub days_in_month: u32,
    /// Spending per elapsed day, 0 before the month starts
    pub daily_average: f64,
    /// Average of the previous twelve months that had spending
    pub historical_monthly_average: Option<f64>,
    pub same_month_last_year: Option<f64>,
    /// Predicted total against the same month last year, in percent
    pub year_over_year_change: Option<f64>,
    pub category_breakdown: Vec<CategoryPrediction>,
}

/// Blend a linear projection with the historical average
fn blend(current: f64, days_elapsed: u32, days_in_month: u32, historical: Option<f64>) -> f64 {
    let progress = safe_ratio(days_elapsed as f64, days_in_month as f64).clamp(0.0, 1.0);
    let linear = (days_elapsed > 0)
        .then(|| safe_ratio(current, days_elapsed as f64) * days_in_month as f64);

    let projected = match (linear, historical) {
        (Some(linear), Some(historical)) => progress * linear + (1.0 - progress) * historical,
        (Some(linear), None) => linear,
        (None, Some(historical)) => historical,
        (None, None) => current,
    };

    round_currency(projected.max(current))
}

impl Analytics<'_> {
    /// Predict total spending for `year`/`month`
    ///
    /// An invalid month predicts zero spending rather than failing.
    pub fn get_month_end_prediction(&self, year: i32, month: u32) -> Result<MonthEndPrediction> {
        let confidence_level = self.check_data_sufficiency(None)?.confidence_level();

        let Some(range) = DateRange::month(year, month) else {
            debug!(year, month, "Prediction requested for an invalid month");
            return Ok(MonthEndPrediction {
                year,
                month,
                current_spent: 0.0,
                predicted_total: 0.0,
                confidence_level,
                days_elapsed: 0,
                days_in_month: 0,
                daily_average: 0.0,
                historical_monthly_average: None,
                same_month_last_year: None,
                year_over_year_change: None,
                category_breakdown: Vec::new(),
            });
        };

        let days_in_month = range.num_days() as u32;
        let days_elapsed = if self.today < range.start {
            0
        } else if self.today > range.end {
            days_in_month
        } else {
            self.today.day()
        };

        let expenses = self.db.list_expenses(&ExpenseFilter::in_range(range))?;
        let current_spent: f64 = expenses.iter().map(|e| e.amount).sum();

        let mut current_by_category: BTreeMap<ExpenseCategory, f64> = BTreeMap::new();
        for expense in &expenses {
            *current_by_category.entry(expense.category).or_default() += expense.amount;
        }

        // Previous twelve calendar months
        let history = range
            .start
            .checked_sub_months(Months::new(HISTORY_MONTHS))
            .zip(range.start.checked_sub_days(Days::new(1)))
            .map(|(start, end)| DateRange::new(start, end));

        let mut historical_monthly_average = None;
        let mut history_by_category: BTreeMap<ExpenseCategory, f64> = BTreeMap::new();
        let mut history_months = 0usize;

        if let Some(history) = history {
            let totals = self.db.monthly_totals(&ExpenseFilter::in_range(history))?;
            history_months = totals.len();
            if history_months > 0 {
                let sum: f64 = totals.iter().map(|t| t.total).sum();
                historical_monthly_average = Some(safe_average(sum, history_months));

                for expense in self.db.list_expenses(&ExpenseFilter::in_range(history))? {
                    *history_by_category.entry(expense.category).or_default() += expense.amount;
                }
            }
        }

        let same_month_last_year = match DateRange::month(year - 1, month) {
            Some(last_year) => self
                .db
                .monthly_totals(&ExpenseFilter::in_range(last_year))?
                .first()
                .map(|t| t.total),
            None => None,
        };

        let predicted_total = blend(
            current_spent,
            days_elapsed,
            days_in_month,
            historical_monthly_average,
        );

        let mut categories: Vec<ExpenseCategory> = current_by_category
            .keys()
            .chain(history_by_category.keys())
            .copied()
            .collect();
        categories.sort();
        categories.dedup();

        let mut category_breakdown: Vec<CategoryPrediction> = categories
            .into_iter()
            .map(|category| {
                let current = current_by_category.get(&category).copied().unwrap_or(0.0);
                let historical = history_by_category
                    .get(&category)
                    .map(|total| safe_average(*total, history_months));
                CategoryPrediction {
                    category,
                    current_spent: round_currency(current),
                    predicted_total: blend(current, days_elapsed, days_in_month, historical),
                }
            })
            .collect();
        category_breakdown.sort_by(|a, b| b.predicted_total.total_cmp(&a.predicted_total));

        debug!(
            year,
            month,
            current_spent,
            predicted_total,
            days_elapsed,
            "Computed month-end prediction"
        );

        Ok(MonthEndPrediction {
            year,
            month,
            current_spent: round_currency(current_spent),
            predicted_total,
            confidence_level,
            days_elapsed,
            days_in_month,
            daily_average: round_currency(safe_average(current_spent, days_elapsed as usize)),
            historical_monthly_average: historical_monthly_average.map(round_currency),
            same_month_last_year: same_month_last_year.map(round_currency),
            year_over_year_change: percent_change(predicted_total, same_month_last_year),
            category_breakdown,
        })
    }

    /// Prediction for the month containing today
    pub fn get_current_month_prediction(&self) -> Result<MonthEndPrediction> {
        self.get_month_end_prediction(self.today.year(), self.today.month())
    }
}

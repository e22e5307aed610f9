//! Spending patterns: day-of-week buckets and seasonal (monthly/quarterly) trends

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stats::{percent_change, round_currency, safe_average, safe_percent, safe_ratio};
use super::Analytics;
use crate::error::Result;
use crate::models::{DateRange, ExpenseFilter};

/// Day names in bucket order (weeks start on Sunday)
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Spending on one day of the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySpending {
    pub day_name: String,
    pub transaction_count: usize,
    pub total_spend: f64,
    pub average_spend: f64,
    pub percent_of_weekly_total: f64,
}

/// Spending split across the seven days of the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOfWeekPattern {
    /// Always seven entries, Sunday through Saturday
    pub days: Vec<DaySpending>,
    /// Total spend divided by the number of distinct weeks with spending
    pub weekly_average: f64,
    pub total_spend: f64,
    pub transaction_count: usize,
    /// Day with the highest total, None when nothing was spent
    pub busiest_day: Option<String>,
}

/// One month of a seasonal series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// "YYYY-MM"
    pub month: String,
    pub year: i32,
    pub month_number: u32,
    pub total_spent: f64,
    pub transaction_count: i64,
    /// Percent change from the previous month; None for the first month or
    /// when the previous month had no spending
    pub previous_month_change: Option<f64>,
}

/// One quarter of a seasonal series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyTrend {
    /// "YYYY-Qn"
    pub quarter: String,
    pub year: i32,
    pub quarter_number: u32,
    pub total_spent: f64,
    pub previous_quarter_change: Option<f64>,
}

/// Monthly and quarterly spending over a window
///
/// Months without spending are included with a zero total, so the monthly
/// series is contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalAnalysis {
    pub monthly_data: Vec<MonthlyTrend>,
    pub quarterly_data: Vec<QuarterlyTrend>,
    pub average_monthly_spend: f64,
    /// Month with the highest total, None when nothing was spent
    pub peak_month: Option<String>,
    /// Month with the lowest total, None for an empty window
    pub lowest_month: Option<String>,
}

impl SeasonalAnalysis {
    fn empty() -> Self {
        Self {
            monthly_data: Vec::new(),
            quarterly_data: Vec::new(),
            average_monthly_spend: 0.0,
            peak_month: None,
            lowest_month: None,
        }
    }
}

/// Months since year 0, so month arithmetic is plain integer math
fn month_index(year: i32, month: u32) -> i64 {
    year as i64 * 12 + (month as i64 - 1)
}

fn from_month_index(index: i64) -> (i32, u32) {
    (index.div_euclid(12) as i32, (index.rem_euclid(12) + 1) as u32)
}

impl Analytics<'_> {
    /// Bucket spending by day of the week
    ///
    /// The range is inclusive; None covers all history.
    pub fn get_day_of_week_patterns(&self, range: Option<DateRange>) -> Result<DayOfWeekPattern> {
        let expenses = self.db.list_expenses(&ExpenseFilter {
            range,
            category: None,
        })?;

        let mut counts = [0usize; 7];
        let mut totals = [0.0f64; 7];
        let mut weeks: HashSet<NaiveDate> = HashSet::new();

        for expense in &expenses {
            let offset = expense.date.weekday().num_days_from_sunday();
            counts[offset as usize] += 1;
            totals[offset as usize] += expense.amount;

            let week_start = expense
                .date
                .checked_sub_days(Days::new(offset as u64))
                .unwrap_or(expense.date);
            weeks.insert(week_start);
        }

        let grand_total: f64 = totals.iter().sum();

        let days: Vec<DaySpending> = DAY_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| DaySpending {
                day_name: name.to_string(),
                transaction_count: counts[i],
                total_spend: round_currency(totals[i]),
                average_spend: round_currency(safe_average(totals[i], counts[i])),
                percent_of_weekly_total: round_currency(safe_percent(totals[i], grand_total)),
            })
            .collect();

        let busiest_day = if grand_total > 0.0 {
            days.iter()
                .zip(totals.iter())
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(day, _)| day.day_name.clone())
        } else {
            None
        };

        debug!(
            transactions = expenses.len(),
            weeks = weeks.len(),
            "Computed day-of-week patterns"
        );

        Ok(DayOfWeekPattern {
            days,
            weekly_average: round_currency(safe_ratio(grand_total, weeks.len() as f64)),
            total_spend: round_currency(grand_total),
            transaction_count: expenses.len(),
            busiest_day,
        })
    }

    /// Monthly and quarterly spending trends
    ///
    /// `lookback_months` counts back from the current month, inclusive. None
    /// starts at the month of the first recorded expense.
    pub fn get_seasonal_analysis(&self, lookback_months: Option<u32>) -> Result<SeasonalAnalysis> {
        let today_index = month_index(self.today.year(), self.today.month());

        let (first_index, last_index) = match lookback_months {
            Some(0) => return Ok(SeasonalAnalysis::empty()),
            Some(months) => (today_index - (months as i64 - 1), today_index),
            None => match self.db.expense_date_bounds(&ExpenseFilter::all())? {
                Some((first, last, _)) => (
                    month_index(first.year(), first.month()),
                    today_index.max(month_index(last.year(), last.month())),
                ),
                None => return Ok(SeasonalAnalysis::empty()),
            },
        };

        let (first_year, first_month) = from_month_index(first_index);
        let (last_year, last_month) = from_month_index(last_index);
        let window = match (
            DateRange::month(first_year, first_month),
            DateRange::month(last_year, last_month),
        ) {
            (Some(first), Some(last)) => DateRange::new(first.start, last.end),
            _ => return Ok(SeasonalAnalysis::empty()),
        };

        let totals: HashMap<i64, (f64, i64)> = self
            .db
            .monthly_totals(&ExpenseFilter::in_range(window))?
            .into_iter()
            .map(|t| (month_index(t.year, t.month), (t.total, t.count)))
            .collect();

        let mut monthly_data = Vec::new();
        let mut quarterly_data: Vec<QuarterlyTrend> = Vec::new();
        let mut previous_month: Option<f64> = None;
        let mut window_total = 0.0;

        for index in first_index..=last_index {
            let (year, month) = from_month_index(index);
            let (total, count) = totals.get(&index).copied().unwrap_or((0.0, 0));
            window_total += total;

            monthly_data.push(MonthlyTrend {
                month: format!("{:04}-{:02}", year, month),
                year,
                month_number: month,
                total_spent: round_currency(total),
                transaction_count: count,
                previous_month_change: percent_change(total, previous_month),
            });
            previous_month = Some(total);

            let quarter_number = (month - 1) / 3 + 1;
            match quarterly_data.last_mut() {
                Some(q) if q.year == year && q.quarter_number == quarter_number => {
                    q.total_spent += total;
                }
                _ => quarterly_data.push(QuarterlyTrend {
                    quarter: format!("{:04}-Q{}", year, quarter_number),
                    year,
                    quarter_number,
                    total_spent: total,
                    previous_quarter_change: None,
                }),
            }
        }

        // Changes are computed on unrounded totals, then totals are rounded
        let mut previous_quarter: Option<f64> = None;
        for quarter in &mut quarterly_data {
            let total = quarter.total_spent;
            quarter.previous_quarter_change = percent_change(total, previous_quarter);
            quarter.total_spent = round_currency(total);
            previous_quarter = Some(total);
        }

        let peak_month = if window_total > 0.0 {
            monthly_data
                .iter()
                .max_by(|a, b| a.total_spent.total_cmp(&b.total_spent))
                .map(|m| m.month.clone())
        } else {
            None
        };
        let lowest_month = monthly_data
            .iter()
            .min_by(|a, b| a.total_spent.total_cmp(&b.total_spent))
            .map(|m| m.month.clone());

        debug!(
            months = monthly_data.len(),
            quarters = quarterly_data.len(),
            "Computed seasonal analysis"
        );

        Ok(SeasonalAnalysis {
            average_monthly_spend: round_currency(safe_average(window_total, monthly_data.len())),
            monthly_data,
            quarterly_data,
            peak_month,
            lowest_month,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::ExpenseCategory;
    use crate::test_utils::{add_expense, date};

    #[test]
    fn test_day_of_week_empty_store() {
        let db = Database::in_memory().unwrap();
        let analytics = Analytics::new(&db);

        let pattern = analytics.get_day_of_week_patterns(None).unwrap();
        assert_eq!(pattern.days.len(), 7);
        assert_eq!(pattern.days[0].day_name, "Sunday");
        assert_eq!(pattern.days[6].day_name, "Saturday");
        for day in &pattern.days {
            assert_eq!(day.transaction_count, 0);
            assert_eq!(day.average_spend, 0.0);
            assert_eq!(day.percent_of_weekly_total, 0.0);
        }
        assert_eq!(pattern.weekly_average, 0.0);
        assert_eq!(pattern.busiest_day, None);
    }

    #[test]
    fn test_day_of_week_buckets() {
        let db = Database::in_memory().unwrap();
        // 2024-03-16 is a Saturday, 2024-03-17 a Sunday, 2024-03-18 a Monday
        add_expense(&db, date(2024, 3, 16), 30.0, ExpenseCategory::Groceries);
        add_expense(&db, date(2024, 3, 17), 10.0, ExpenseCategory::DiningOut);
        add_expense(&db, date(2024, 3, 17), 20.0, ExpenseCategory::DiningOut);
        add_expense(&db, date(2024, 3, 18), 40.0, ExpenseCategory::Gas);

        let pattern = Analytics::new(&db).get_day_of_week_patterns(None).unwrap();

        let sunday = &pattern.days[0];
        assert_eq!(sunday.transaction_count, 2);
        assert_eq!(sunday.total_spend, 30.0);
        assert_eq!(sunday.average_spend, 15.0);
        assert_eq!(sunday.percent_of_weekly_total, 30.0);

        let saturday = &pattern.days[6];
        assert_eq!(saturday.transaction_count, 1);

        assert_eq!(pattern.total_spend, 100.0);
        assert_eq!(pattern.transaction_count, 4);
        // Saturday the 16th closes one week, Sunday the 17th opens the next
        assert_eq!(pattern.weekly_average, 50.0);
        assert_eq!(pattern.busiest_day.as_deref(), Some("Monday"));
    }

    #[test]
    fn test_day_of_week_range_is_inclusive() {
        let db = Database::in_memory().unwrap();
        for day in [14, 15, 17, 20, 21] {
            add_expense(&db, date(2024, 3, day), 10.0, ExpenseCategory::Groceries);
        }

        let range = DateRange::new(date(2024, 3, 15), date(2024, 3, 20));
        let pattern = Analytics::new(&db)
            .get_day_of_week_patterns(Some(range))
            .unwrap();
        let counted: usize = pattern.days.iter().map(|d| d.transaction_count).sum();
        assert_eq!(counted, 3);
        assert_eq!(pattern.transaction_count, 3);
    }

    #[test]
    fn test_day_of_week_zero_amounts_are_finite() {
        let db = Database::in_memory().unwrap();
        add_expense(&db, date(2024, 3, 17), 0.0, ExpenseCategory::Other);
        add_expense(&db, date(2024, 3, 18), 0.0, ExpenseCategory::Other);

        let pattern = Analytics::new(&db).get_day_of_week_patterns(None).unwrap();
        assert!(pattern.weekly_average.is_finite());
        for day in &pattern.days {
            assert!(day.average_spend.is_finite());
            assert!(day.percent_of_weekly_total.is_finite());
        }
        assert_eq!(pattern.busiest_day, None);
    }

    #[test]
    fn test_seasonal_fills_missing_months_with_zero() {
        let db = Database::in_memory().unwrap();
        add_expense(&db, date(2024, 1, 10), 100.0, ExpenseCategory::Groceries);
        add_expense(&db, date(2024, 3, 10), 150.0, ExpenseCategory::Groceries);
        add_expense(&db, date(2024, 4, 10), 300.0, ExpenseCategory::Groceries);

        let analytics = Analytics::new(&db).as_of(date(2024, 4, 20));
        let seasonal = analytics.get_seasonal_analysis(None).unwrap();

        let months: Vec<&str> = seasonal.monthly_data.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03", "2024-04"]);

        assert_eq!(seasonal.monthly_data[0].previous_month_change, None);
        assert_eq!(seasonal.monthly_data[1].total_spent, 0.0);
        assert_eq!(seasonal.monthly_data[1].previous_month_change, Some(-100.0));
        // February had nothing to compare against
        assert_eq!(seasonal.monthly_data[2].previous_month_change, None);
        assert_eq!(seasonal.monthly_data[3].previous_month_change, Some(100.0));

        assert_eq!(seasonal.quarterly_data.len(), 2);
        assert_eq!(seasonal.quarterly_data[0].quarter, "2024-Q1");
        assert_eq!(seasonal.quarterly_data[0].total_spent, 250.0);
        assert_eq!(seasonal.quarterly_data[0].previous_quarter_change, None);
        assert_eq!(seasonal.quarterly_data[1].total_spent, 300.0);
        assert_eq!(seasonal.quarterly_data[1].previous_quarter_change, Some(20.0));

        assert_eq!(seasonal.peak_month.as_deref(), Some("2024-04"));
        assert_eq!(seasonal.lowest_month.as_deref(), Some("2024-02"));
        assert_eq!(seasonal.average_monthly_spend, 137.5);
    }

    #[test]
    fn test_seasonal_lookback_crosses_year() {
        let db = Database::in_memory().unwrap();
        add_expense(&db, date(2023, 11, 5), 80.0, ExpenseCategory::Utilities);
        add_expense(&db, date(2024, 2, 5), 40.0, ExpenseCategory::Utilities);
        // Outside a 4-month window ending February 2024
        add_expense(&db, date(2023, 10, 5), 999.0, ExpenseCategory::Utilities);

        let analytics = Analytics::new(&db).as_of(date(2024, 2, 15));
        let seasonal = analytics.get_seasonal_analysis(Some(4)).unwrap();

        let months: Vec<&str> = seasonal.monthly_data.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);

        let quarters: Vec<&str> = seasonal
            .quarterly_data
            .iter()
            .map(|q| q.quarter.as_str())
            .collect();
        assert_eq!(quarters, vec!["2023-Q4", "2024-Q1"]);
        assert_eq!(seasonal.quarterly_data[0].total_spent, 80.0);
        assert_eq!(seasonal.quarterly_data[1].previous_quarter_change, Some(-50.0));
    }

    #[test]
    fn test_seasonal_empty_store() {
        let db = Database::in_memory().unwrap();
        let analytics = Analytics::new(&db).as_of(date(2024, 2, 15));

        let all = analytics.get_seasonal_analysis(None).unwrap();
        assert!(all.monthly_data.is_empty());
        assert!(all.quarterly_data.is_empty());

        let windowed = analytics.get_seasonal_analysis(Some(3)).unwrap();
        assert_eq!(windowed.monthly_data.len(), 3);
        assert!(windowed
            .monthly_data
            .iter()
            .all(|m| m.total_spent == 0.0 && m.previous_month_change.is_none()));
        assert_eq!(windowed.average_monthly_spend, 0.0);
        assert_eq!(windowed.peak_month, None);

        assert!(analytics
            .get_seasonal_analysis(Some(0))
            .unwrap()
            .monthly_data
            .is_empty());
    }
}

//! Data sufficiency: how much history backs a statistic

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::stats::round_currency;
use super::Analytics;
use crate::error::Result;
use crate::models::{DateRange, ExpenseFilter};

/// Months of history needed for medium confidence
pub const MEDIUM_CONFIDENCE_MONTHS: u32 = 6;
/// Months of history needed for high confidence
pub const HIGH_CONFIDENCE_MONTHS: u32 = 12;

/// Coarse confidence label attached to predictions and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Map months of data to a confidence level: 12+ high, 6+ medium, else low
    pub fn from_months(months_of_data: u32) -> Self {
        if months_of_data >= HIGH_CONFIDENCE_MONTHS {
            ConfidenceLevel::High
        } else if months_of_data >= MEDIUM_CONFIDENCE_MONTHS {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfidenceLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "low" => Ok(ConfidenceLevel::Low),
            "medium" => Ok(ConfidenceLevel::Medium),
            "high" => Ok(ConfidenceLevel::High),
            _ => Err(format!("Unknown confidence level: {}", s)),
        }
    }
}

/// How much history exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSufficiency {
    /// Distinct calendar months with at least one expense
    pub months_of_data: u32,
    /// 0-100, rising linearly with months of data until it saturates
    pub data_quality_score: f64,
    pub total_expenses: i64,
    pub first_expense_date: Option<NaiveDate>,
    pub last_expense_date: Option<NaiveDate>,
}

impl DataSufficiency {
    pub fn empty() -> Self {
        Self {
            months_of_data: 0,
            data_quality_score: 0.0,
            total_expenses: 0,
            first_expense_date: None,
            last_expense_date: None,
        }
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_months(self.months_of_data)
    }
}

/// Quality score for a number of months: `min(months, saturation) / saturation * 100`
pub fn data_quality_score(months_of_data: u32, saturation_months: u32) -> f64 {
    if saturation_months == 0 {
        return if months_of_data > 0 { 100.0 } else { 0.0 };
    }
    let capped = months_of_data.min(saturation_months) as f64;
    round_currency(capped / saturation_months as f64 * 100.0).clamp(0.0, 100.0)
}

impl Analytics<'_> {
    /// Measure how much history exists, optionally within a date range
    pub fn check_data_sufficiency(&self, range: Option<DateRange>) -> Result<DataSufficiency> {
        let filter = ExpenseFilter {
            range,
            category: None,
        };

        let Some((first, last, count)) = self.db.expense_date_bounds(&filter)? else {
            return Ok(DataSufficiency::empty());
        };

        let months = self.db.count_distinct_months(&filter)?;
        let months_of_data = u32::try_from(months).unwrap_or(u32::MAX);
        let score = data_quality_score(months_of_data, self.config.quality_saturation_months);

        debug!(months_of_data, score, "Checked data sufficiency");

        Ok(DataSufficiency {
            months_of_data,
            data_quality_score: score,
            total_expenses: count,
            first_expense_date: Some(first),
            last_expense_date: Some(last),
        })
    }
}

//! Recurring charge detection
//!
//! A recurring pattern is a merchant + category + amount cluster that shows
//! up in at least two distinct calendar months. One merchant can carry
//! several patterns (e.g. two subscriptions billed by the same store), and a
//! one-off large purchase at a regular merchant does not hide the regular
//! charge.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stats::{median, round_currency, safe_average};
use super::Analytics;
use crate::error::Result;
use crate::models::{Expense, ExpenseCategory, ExpenseFilter};

/// How often a recurring charge shows up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Irregular,
}

impl RecurrenceFrequency {
    /// Classify by average days between occurrences
    pub fn from_interval(average_days: f64) -> Self {
        if average_days <= 0.0 {
            RecurrenceFrequency::Irregular
        } else if average_days < 10.0 {
            RecurrenceFrequency::Weekly
        } else if average_days < 45.0 {
            RecurrenceFrequency::Monthly
        } else if average_days < 120.0 {
            RecurrenceFrequency::Quarterly
        } else if average_days < 400.0 {
            RecurrenceFrequency::Yearly
        } else {
            RecurrenceFrequency::Irregular
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceFrequency::Weekly => "weekly",
            RecurrenceFrequency::Monthly => "monthly",
            RecurrenceFrequency::Quarterly => "quarterly",
            RecurrenceFrequency::Yearly => "yearly",
            RecurrenceFrequency::Irregular => "irregular",
        }
    }
}

impl std::fmt::Display for RecurrenceFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A merchant/amount grouping that repeats across months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub merchant: String,
    pub category: ExpenseCategory,
    /// Median amount of the matching charges
    pub typical_amount: f64,
    pub occurrence_count: usize,
    pub distinct_months: usize,
    pub total_spent: f64,
    pub average_interval_days: f64,
    pub frequency: RecurrenceFrequency,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
}

fn store_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Tokens that are store/terminal numbers, e.g. "#0423", "00123", "12-34"
    PATTERN.get_or_init(|| Regex::new(r"\b\d[\d-]*\b").expect("valid regex"))
}

/// Merchant grouping key: uppercase, punctuation and store numbers removed,
/// first three words
pub fn normalize_merchant(place: &str) -> String {
    let upper = place.to_uppercase().replace(['*', '#'], " ");
    let without_numbers = store_number_pattern().replace_all(&upper, " ");

    without_numbers
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Analytics<'_> {
    /// Find merchant/amount groupings that repeat across at least two months
    pub fn get_recurring_patterns(&self) -> Result<Vec<RecurringPattern>> {
        let expenses = self.db.list_expenses(&ExpenseFilter::all())?;

        let mut groups: BTreeMap<(String, ExpenseCategory), Vec<&Expense>> = BTreeMap::new();
        for expense in &expenses {
            let Some(place) = expense.place.as_deref() else {
                continue;
            };
            let key = normalize_merchant(place);
            if key.is_empty() {
                continue;
            }
            groups.entry((key, expense.category)).or_default().push(expense);
        }

        let mut patterns: Vec<RecurringPattern> = groups
            .values()
            .flat_map(|group| self.amount_clusters(group))
            .filter_map(|cluster| self.recurring_pattern(&cluster))
            .collect();

        patterns.sort_by(|a, b| {
            b.distinct_months
                .cmp(&a.distinct_months)
                .then_with(|| b.total_spent.total_cmp(&a.total_spent))
                .then_with(|| a.merchant.cmp(&b.merchant))
        });

        debug!(
            expenses = expenses.len(),
            patterns = patterns.len(),
            "Detected recurring patterns"
        );

        Ok(patterns)
    }

    /// Split a merchant group into clusters of similar amounts
    ///
    /// Amounts are walked in ascending order; a charge joins the current
    /// cluster while it stays within tolerance of the cluster median. Each
    /// cluster comes back in date order.
    fn amount_clusters<'e>(&self, group: &[&'e Expense]) -> Vec<Vec<&'e Expense>> {
        let mut by_amount = group.to_vec();
        by_amount.sort_by(|a, b| a.amount.total_cmp(&b.amount));

        let mut clusters: Vec<Vec<&Expense>> = Vec::new();
        for expense in by_amount {
            match clusters.last_mut() {
                Some(cluster) if self.within_tolerance(&cluster[..], expense.amount) => {
                    cluster.push(expense)
                }
                _ => clusters.push(vec![expense]),
            }
        }

        for cluster in &mut clusters {
            cluster.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        }
        clusters
    }

    fn within_tolerance(&self, cluster: &[&Expense], amount: f64) -> bool {
        let amounts: Vec<f64> = cluster.iter().map(|e| e.amount).collect();
        let cluster_median = median(&amounts);
        let tolerance = (cluster_median * self.config.recurring_amount_tolerance).max(0.01);
        (amount - cluster_median).abs() <= tolerance
    }

    /// Build a pattern from one amount cluster, if it recurs across months
    fn recurring_pattern(&self, matching: &[&Expense]) -> Option<RecurringPattern> {
        if matching.len() < 2 {
            return None;
        }

        let months: HashSet<(i32, u32)> = matching
            .iter()
            .map(|e| (e.date.year(), e.date.month()))
            .collect();
        if months.len() < self.config.recurring_min_months {
            return None;
        }

        let first = matching.first()?;
        let last = matching.last()?;
        let interval_days: i64 = matching
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .sum();
        let average_interval = safe_average(interval_days as f64, matching.len() - 1);
        let matching_amounts: Vec<f64> = matching.iter().map(|e| e.amount).collect();

        Some(RecurringPattern {
            merchant: last
                .place
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            category: last.category,
            typical_amount: round_currency(median(&matching_amounts)),
            occurrence_count: matching.len(),
            distinct_months: months.len(),
            total_spent: round_currency(matching_amounts.iter().sum()),
            average_interval_days: round_currency(average_interval),
            frequency: RecurrenceFrequency::from_interval(average_interval),
            first_seen: first.date,
            last_seen: last.date,
        })
    }
}

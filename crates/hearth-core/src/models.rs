//! Domain models for Hearth

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Expense category
///
/// Serialized with the display names used by the spreadsheet export
/// ("Dining Out", "Tax - Medical", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Housing,
    Utilities,
    Groceries,
    #[serde(rename = "Dining Out")]
    DiningOut,
    Insurance,
    Gas,
    #[serde(rename = "Vehicle Maintenance")]
    VehicleMaintenance,
    Entertainment,
    Subscriptions,
    #[serde(rename = "Recreation Activities")]
    RecreationActivities,
    #[serde(rename = "Pet Care")]
    PetCare,
    #[serde(rename = "Tax - Medical")]
    TaxMedical,
    #[serde(rename = "Tax - Donation")]
    TaxDonation,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 14] = [
        Self::Housing,
        Self::Utilities,
        Self::Groceries,
        Self::DiningOut,
        Self::Insurance,
        Self::Gas,
        Self::VehicleMaintenance,
        Self::Entertainment,
        Self::Subscriptions,
        Self::RecreationActivities,
        Self::PetCare,
        Self::TaxMedical,
        Self::TaxDonation,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Housing => "Housing",
            Self::Utilities => "Utilities",
            Self::Groceries => "Groceries",
            Self::DiningOut => "Dining Out",
            Self::Insurance => "Insurance",
            Self::Gas => "Gas",
            Self::VehicleMaintenance => "Vehicle Maintenance",
            Self::Entertainment => "Entertainment",
            Self::Subscriptions => "Subscriptions",
            Self::RecreationActivities => "Recreation Activities",
            Self::PetCare => "Pet Care",
            Self::TaxMedical => "Tax - Medical",
            Self::TaxDonation => "Tax - Donation",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        // "Food" was renamed to "Dining Out"; older exports still carry it
        if wanted.eq_ignore_ascii_case("food") {
            return Ok(Self::DiningOut);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown expense category: {}", s))
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment method used for an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Debit,
    Cheque,
    #[serde(rename = "CIBC MC")]
    CibcMastercard,
    #[serde(rename = "PCF MC")]
    PcfMastercard,
    #[serde(rename = "WS VISA")]
    WsVisa,
    #[serde(rename = "VISA")]
    Visa,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 7] = [
        Self::Cash,
        Self::Debit,
        Self::Cheque,
        Self::CibcMastercard,
        Self::PcfMastercard,
        Self::WsVisa,
        Self::Visa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Debit => "Debit",
            Self::Cheque => "Cheque",
            Self::CibcMastercard => "CIBC MC",
            Self::PcfMastercard => "PCF MC",
            Self::WsVisa => "WS VISA",
            Self::Visa => "VISA",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown payment method: {}", s))
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub date: NaiveDate,
    /// Merchant or payee
    pub place: Option<String>,
    pub notes: Option<String>,
    /// Non-negative amount, rounded to cents
    pub amount: f64,
    pub category: ExpenseCategory,
    pub payment_method: PaymentMethod,
    /// Week of month (1-5)
    pub week: u32,
    pub created_at: DateTime<Utc>,
}

/// New expense for insertion
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub place: Option<String>,
    pub notes: Option<String>,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub payment_method: PaymentMethod,
}

impl NewExpense {
    pub fn new(
        date: NaiveDate,
        amount: f64,
        category: ExpenseCategory,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            date,
            place: None,
            notes: None,
            amount,
            category,
            payment_method,
        }
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Week of the month a date falls in: days 1-7 are week 1, 29-31 week 5
pub fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

/// Inclusive date range
///
/// A range whose start is after its end is valid and simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whole calendar month, or None for an invalid year/month
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end: next.pred_opt()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, 0 for a reversed range
    pub fn num_days(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() + 1
        }
    }
}

/// Filter for expense queries
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub range: Option<DateRange>,
    pub category: Option<ExpenseCategory>,
}

impl ExpenseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_range(range: DateRange) -> Self {
        Self {
            range: Some(range),
            category: None,
        }
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// A persisted anomaly dismissal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DismissedAnomaly {
    pub expense_id: i64,
    pub dismissed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            ExpenseCategory::from_str("dining out").unwrap(),
            ExpenseCategory::DiningOut
        );
        assert_eq!(
            ExpenseCategory::from_str("Food").unwrap(),
            ExpenseCategory::DiningOut
        );
        assert_eq!(
            ExpenseCategory::from_str("Tax - Medical").unwrap(),
            ExpenseCategory::TaxMedical
        );
        assert!(ExpenseCategory::from_str("Yachts").is_err());
    }

    #[test]
    fn test_category_serializes_display_name() {
        let json = serde_json::to_string(&ExpenseCategory::PetCare).unwrap();
        assert_eq!(json, "\"Pet Care\"");
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!(
            PaymentMethod::from_str("ws visa").unwrap(),
            PaymentMethod::WsVisa
        );
        assert_eq!(PaymentMethod::from_str("VISA").unwrap(), PaymentMethod::Visa);
        assert!(PaymentMethod::from_str("Bitcoin").is_err());
    }

    #[test]
    fn test_week_of_month() {
        assert_eq!(week_of_month(date(2024, 3, 1)), 1);
        assert_eq!(week_of_month(date(2024, 3, 7)), 1);
        assert_eq!(week_of_month(date(2024, 3, 8)), 2);
        assert_eq!(week_of_month(date(2024, 3, 31)), 5);
    }

    #[test]
    fn test_date_range_month() {
        let feb = DateRange::month(2024, 2).unwrap();
        assert_eq!(feb.start, date(2024, 2, 1));
        assert_eq!(feb.end, date(2024, 2, 29));
        assert_eq!(feb.num_days(), 29);

        let dec = DateRange::month(2023, 12).unwrap();
        assert_eq!(dec.end, date(2023, 12, 31));

        assert!(DateRange::month(2024, 13).is_none());
        assert!(DateRange::month(2024, 0).is_none());
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let range = DateRange::new(date(2024, 3, 20), date(2024, 3, 15));
        assert!(range.is_empty());
        assert_eq!(range.num_days(), 0);
        assert!(!range.contains(date(2024, 3, 17)));
    }
}

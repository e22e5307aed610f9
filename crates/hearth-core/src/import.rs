//! CSV import for the household expense spreadsheet export
//!
//! The export carries three banner/header rows, then one expense per row:
//! `Date, Place, Amount, Notes, Type, Week, Method`. The Week column is
//! ignored on import and recomputed from the date.

use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{ExpenseCategory, NewExpense, PaymentMethod};

/// Lines before the first expense row
const HEADER_LINES: u64 = 3;

/// Columns in an expense row
const EXPECTED_COLUMNS: usize = 7;

/// One row that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based line number in the file
    pub row: u64,
    /// Every problem found on the row, joined with "; "
    pub message: String,
}

/// Result of validating an export without importing it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid_rows: usize,
    pub errors: Vec<RowError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse an expense export into new expenses
///
/// Fails on the first invalid row; run [`validate_expense_csv`] first to see
/// every problem at once.
pub fn parse_expense_csv<R: Read>(reader: R) -> Result<Vec<NewExpense>> {
    let mut rdr = expense_reader(reader);
    let mut expenses = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = row_number(&record, index);
        if row <= HEADER_LINES || is_blank(&record) {
            continue;
        }

        let expense = parse_record(&record)
            .map_err(|problems| Error::Import(format!("Row {}: {}", row, problems.join("; "))))?;
        expenses.push(expense);
    }

    debug!(count = expenses.len(), "Parsed expense CSV");
    Ok(expenses)
}

/// Check every row of an expense export and report the problems found
pub fn validate_expense_csv<R: Read>(reader: R) -> Result<ValidationReport> {
    let mut rdr = expense_reader(reader);
    let mut report = ValidationReport::default();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = row_number(&record, index);
        if row <= HEADER_LINES || is_blank(&record) {
            continue;
        }

        match parse_record(&record) {
            Ok(_) => report.valid_rows += 1,
            Err(problems) => report.errors.push(RowError {
                row,
                message: problems.join("; "),
            }),
        }
    }

    if !report.is_valid() {
        warn!(
            valid = report.valid_rows,
            invalid = report.errors.len(),
            "Expense CSV has invalid rows"
        );
    }

    Ok(report)
}

fn expense_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

/// Line number of a record, falling back to its 1-based position
///
/// The reader drops empty lines without yielding a record, so the header
/// is skipped by line number rather than by counting records.
fn row_number(record: &StringRecord, index: usize) -> u64 {
    record
        .position()
        .map(|p| p.line())
        .unwrap_or(index as u64 + 1)
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or_default()
}

/// Parse one expense row, collecting every problem instead of stopping at
/// the first
fn parse_record(record: &StringRecord) -> std::result::Result<NewExpense, Vec<String>> {
    if record.len() < EXPECTED_COLUMNS {
        return Err(vec![format!(
            "Not enough columns (has {}, needs {})",
            record.len(),
            EXPECTED_COLUMNS
        )]);
    }

    let mut problems = Vec::new();

    let date_str = field(record, 0);
    let place = field(record, 1);
    let amount_str = field(record, 2);
    let notes = field(record, 3);
    let type_str = field(record, 4);
    let method_str = field(record, 6);

    let date = if date_str.is_empty() {
        problems.push("Missing Date".to_string());
        None
    } else {
        parse_date(date_str)
            .map_err(|_| problems.push(format!("Invalid Date: \"{}\"", date_str)))
            .ok()
    };

    let amount = if amount_str.is_empty() {
        problems.push("Missing Amount".to_string());
        None
    } else {
        match parse_amount(amount_str) {
            Ok(amount) if amount < 0.0 => {
                problems.push(format!("Negative Amount: \"{}\"", amount_str));
                None
            }
            Ok(amount) => Some(amount),
            Err(_) => {
                problems.push(format!("Invalid Amount: \"{}\"", amount_str));
                None
            }
        }
    };

    let category = if type_str.is_empty() {
        problems.push("Missing Type".to_string());
        None
    } else {
        type_str
            .parse::<ExpenseCategory>()
            .map_err(|_| problems.push(format!("Invalid Type: \"{}\"", type_str)))
            .ok()
    };

    let payment_method = if method_str.is_empty() {
        problems.push("Missing Method".to_string());
        None
    } else {
        method_str
            .parse::<PaymentMethod>()
            .map_err(|_| problems.push(format!("Invalid Method: \"{}\"", method_str)))
            .ok()
    };

    match (date, amount, category, payment_method) {
        (Some(date), Some(amount), Some(category), Some(method)) if problems.is_empty() => {
            let mut expense = NewExpense::new(date, amount, category, method);
            if !place.is_empty() {
                expense = expense.with_place(place);
            }
            if !notes.is_empty() {
                expense = expense.with_notes(notes);
            }
            Ok(expense)
        }
        _ => Err(problems),
    }
}

/// Parse a date in any of the formats the spreadsheet has exported
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%Y/%m/%d", // 2024/01/15
        "%d-%b-%Y", // 15-Jan-2024
        "%b %d, %Y", // Jan 15, 2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| Error::Import(format!("Unable to parse amount: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Household Expenses 2024,,,,,,\n\
                          Exported from the family spreadsheet,,,,,,\n\
                          Date,Place,Amount,Notes,Type,Week,Method\n";

    fn export(rows: &str) -> String {
        format!("{}{}", HEADER, rows)
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date("01/15/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date("Jan 15, 2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("15.99").unwrap(), 15.99);
        assert_eq!(parse_amount("(20.00)").unwrap(), -20.0);
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_parse_expense_csv() {
        let data = export(
            "2024-03-01,Loblaws,$123.45,weekly shop,Groceries,1,Debit\n\
             2024-03-15,Netflix,15.99,,Subscriptions,3,VISA\n\
             03/20/2024,,\"$1,200.00\",rent,Housing,9,Cheque\n",
        );

        let expenses = parse_expense_csv(data.as_bytes()).unwrap();
        assert_eq!(expenses.len(), 3);

        assert_eq!(expenses[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(expenses[0].place.as_deref(), Some("Loblaws"));
        assert_eq!(expenses[0].notes.as_deref(), Some("weekly shop"));
        assert_eq!(expenses[0].amount, 123.45);
        assert_eq!(expenses[0].category, ExpenseCategory::Groceries);
        assert_eq!(expenses[0].payment_method, PaymentMethod::Debit);

        assert_eq!(expenses[1].notes, None);
        assert_eq!(expenses[1].payment_method, PaymentMethod::Visa);

        assert_eq!(expenses[2].place, None);
        assert_eq!(expenses[2].amount, 1200.0);
    }

    #[test]
    fn test_legacy_food_category_imports_as_dining_out() {
        let data = export("2024-03-01,Diner,22.50,,Food,1,Cash\n");
        let expenses = parse_expense_csv(data.as_bytes()).unwrap();
        assert_eq!(expenses[0].category, ExpenseCategory::DiningOut);
    }

    #[test]
    fn test_parse_skips_blank_rows() {
        let data = export(
            "2024-03-01,Loblaws,10.00,,Groceries,1,Debit\n\
             ,,,,,,\n",
        );
        assert_eq!(parse_expense_csv(data.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_header_lines_do_not_swallow_rows() {
        // The spreadsheet converter writes three empty lines before the data
        let data = "\n\n\n\
                    2024-03-01,Loblaws,10.00,,Groceries,1,Debit\n\
                    2024-03-02,Esso,40.00,,Gas,1,VISA\n\
                    2024-03-03,Netflix,15.99,,Subscriptions,1,VISA\n\
                    2024-03-04,Hydro,oops,,Utilities,1,Debit\n";

        let report = validate_expense_csv(data.as_bytes()).unwrap();
        assert_eq!(report.valid_rows, 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 7);

        let err = parse_expense_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Row 7"));

        let data = "\n\n\n\
                    2024-03-01,Loblaws,10.00,,Groceries,1,Debit\n\
                    2024-03-02,Esso,40.00,,Gas,1,VISA\n";
        let expenses = parse_expense_csv(data.as_bytes()).unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_rejects_invalid_row() {
        let data = export(
            "2024-03-01,Loblaws,10.00,,Groceries,1,Debit\n\
             2024-03-02,Somewhere,ten,,Groceries,1,Debit\n",
        );

        let err = parse_expense_csv(data.as_bytes()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Row 5"), "unexpected message: {}", message);
        assert!(message.contains("Invalid Amount"));
    }

    #[test]
    fn test_header_only_file_is_empty() {
        assert!(parse_expense_csv(HEADER.as_bytes()).unwrap().is_empty());
        let report = validate_expense_csv(HEADER.as_bytes()).unwrap();
        assert_eq!(report, ValidationReport::default());
        assert!(report.is_valid());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let data = export(
            "2024-03-01,Loblaws,10.00,,Groceries,1,Debit\n\
             2024-03-02,Short,5.00\n\
             ,Nowhere,,,,,\n\
             2024-03-04,Casino,12.00,,Gambling,1,Bitcoin\n\
             2024-03-05,Hydro,(60.00),,Utilities,1,Debit\n\
             2024-03-06,Shell,45.00,,Gas,1,WS VISA\n",
        );

        let report = validate_expense_csv(data.as_bytes()).unwrap();
        assert_eq!(report.valid_rows, 2);
        assert_eq!(report.errors.len(), 4);

        assert_eq!(report.errors[0].row, 5);
        assert_eq!(report.errors[0].message, "Not enough columns (has 3, needs 7)");

        assert_eq!(report.errors[1].row, 6);
        assert_eq!(
            report.errors[1].message,
            "Missing Date; Missing Amount; Missing Type; Missing Method"
        );

        assert_eq!(report.errors[2].row, 7);
        assert!(report.errors[2].message.contains("Invalid Type: \"Gambling\""));
        assert!(report.errors[2].message.contains("Invalid Method: \"Bitcoin\""));

        assert_eq!(report.errors[3].row, 8);
        assert!(report.errors[3].message.starts_with("Negative Amount"));
        assert!(!report.is_valid());
    }
}

//! Analytics command implementations
//!
//! Each command prints a text table, or with `--json` the result wrapped
//! with `{data_quality, confidence_level}` metadata.

use anyhow::Result;
use hearth_core::analytics::{Analytics, Listing};
use hearth_core::models::DateRange;

use super::{format_change, parse_date_arg, print_json, truncate};

/// Build an inclusive range from optional --from/--to flags
///
/// A missing --from is open-ended; a missing --to means today.
pub fn resolve_range(
    analytics: &Analytics,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<DateRange>> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }

    let from = from.map(|s| parse_date_arg(s, "--from")).transpose()?;
    let to = to.map(|s| parse_date_arg(s, "--to")).transpose()?;

    let start = from.unwrap_or(chrono::NaiveDate::MIN);
    let end = to.unwrap_or(analytics.today().max(start));
    Ok(Some(DateRange::new(start, end)))
}

pub fn cmd_sufficiency(analytics: &Analytics, json: bool) -> Result<()> {
    let sufficiency = analytics.check_data_sufficiency(None)?;

    if json {
        return print_json(&analytics.with_metadata(sufficiency)?);
    }

    println!("📊 Data Sufficiency");
    println!("   ─────────────────────────────");
    println!("   Months of data:  {}", sufficiency.months_of_data);
    println!("   Expenses:        {}", sufficiency.total_expenses);
    println!("   Quality score:   {:.2}/100", sufficiency.data_quality_score);
    println!("   Confidence:      {}", sufficiency.confidence_level());
    if let (Some(first), Some(last)) = (
        sufficiency.first_expense_date,
        sufficiency.last_expense_date,
    ) {
        println!("   History:         {} to {}", first, last);
    } else {
        println!();
        println!("No expenses recorded yet. Run 'hearth import --file <CSV>' to get started.");
    }

    Ok(())
}

pub fn cmd_day_of_week(
    analytics: &Analytics,
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> Result<()> {
    let range = resolve_range(analytics, from, to)?;
    let pattern = analytics.get_day_of_week_patterns(range)?;

    if json {
        return print_json(&analytics.with_metadata(pattern)?);
    }

    println!("📅 Spending by Day of Week");
    println!();
    println!(
        "{:<10} {:>6} {:>12} {:>10} {:>8}",
        "Day", "Count", "Total", "Average", "Share"
    );
    println!("{}", "-".repeat(50));
    for day in &pattern.days {
        println!(
            "{:<10} {:>6} {:>12.2} {:>10.2} {:>7.1}%",
            day.day_name,
            day.transaction_count,
            day.total_spend,
            day.average_spend,
            day.percent_of_weekly_total
        );
    }
    println!("{}", "-".repeat(50));
    println!(
        "{:<10} {:>6} {:>12.2}",
        "Total", pattern.transaction_count, pattern.total_spend
    );
    println!();
    println!("Weekly average: ${:.2}", pattern.weekly_average);
    if let Some(busiest) = &pattern.busiest_day {
        println!("Busiest day:    {}", busiest);
    }

    Ok(())
}

pub fn cmd_recurring(analytics: &Analytics, json: bool) -> Result<()> {
    let patterns = analytics.get_recurring_patterns()?;

    if json {
        return print_json(&analytics.with_metadata(Listing::from(patterns))?);
    }

    if patterns.is_empty() {
        println!("No recurring charges found.");
        return Ok(());
    }

    println!("🔁 Recurring Charges ({})", patterns.len());
    println!();
    println!(
        "{:<28} {:<20} {:>10} {:>7} {:<10} {:<10}",
        "Merchant", "Category", "Typical", "Months", "Frequency", "Last Seen"
    );
    println!("{}", "-".repeat(90));
    for pattern in &patterns {
        println!(
            "{:<28} {:<20} {:>10.2} {:>7} {:<10} {:<10}",
            truncate(&pattern.merchant, 28),
            pattern.category.as_str(),
            pattern.typical_amount,
            pattern.distinct_months,
            pattern.frequency.as_str(),
            pattern.last_seen
        );
    }

    Ok(())
}

pub fn cmd_seasonal(analytics: &Analytics, months: Option<u32>, json: bool) -> Result<()> {
    let lookback = match months {
        Some(0) => None,
        Some(months) => Some(months),
        None => analytics.config().seasonal_lookback(),
    };
    let analysis = analytics.get_seasonal_analysis(lookback)?;

    if json {
        return print_json(&analytics.with_metadata(analysis)?);
    }

    if analysis.monthly_data.is_empty() {
        println!("No spending history to analyze.");
        return Ok(());
    }

    println!("🗓️  Monthly Spending");
    println!();
    println!("{:<10} {:>12} {:>7} {:>10}", "Month", "Total", "Count", "Change");
    println!("{}", "-".repeat(42));
    for month in &analysis.monthly_data {
        println!(
            "{:<10} {:>12.2} {:>7} {:>10}",
            month.month,
            month.total_spent,
            month.transaction_count,
            format_change(month.previous_month_change)
        );
    }

    println!();
    println!("{:<10} {:>12} {:>10}", "Quarter", "Total", "Change");
    println!("{}", "-".repeat(34));
    for quarter in &analysis.quarterly_data {
        println!(
            "{:<10} {:>12.2} {:>10}",
            quarter.quarter,
            quarter.total_spent,
            format_change(quarter.previous_quarter_change)
        );
    }

    println!();
    println!("Average month: ${:.2}", analysis.average_monthly_spend);
    if let (Some(peak), Some(lowest)) = (&analysis.peak_month, &analysis.lowest_month) {
        println!("Peak month:    {}", peak);
        println!("Lowest month:  {}", lowest);
    }

    Ok(())
}

pub fn cmd_predict(analytics: &Analytics, year: i32, month: u32, json: bool) -> Result<()> {
    let prediction = analytics.get_month_end_prediction(year, month)?;

    if json {
        return print_json(&analytics.with_metadata(prediction)?);
    }

    println!("🔮 Month-End Prediction for {}-{:02}", year, month);
    println!("   ─────────────────────────────");
    println!("   Spent so far:     ${:.2}", prediction.current_spent);
    println!("   Predicted total:  ${:.2}", prediction.predicted_total);
    println!(
        "   Progress:         day {} of {}",
        prediction.days_elapsed, prediction.days_in_month
    );
    println!("   Daily average:    ${:.2}", prediction.daily_average);
    if let Some(average) = prediction.historical_monthly_average {
        println!("   Typical month:    ${:.2}", average);
    }
    if let Some(last_year) = prediction.same_month_last_year {
        println!(
            "   Last year:        ${:.2} ({})",
            last_year,
            format_change(prediction.year_over_year_change)
        );
    }
    println!("   Confidence:       {}", prediction.confidence_level);

    if !prediction.category_breakdown.is_empty() {
        println!();
        println!("{:<22} {:>12} {:>12}", "Category", "Spent", "Predicted");
        println!("{}", "-".repeat(48));
        for category in &prediction.category_breakdown {
            println!(
                "{:<22} {:>12.2} {:>12.2}",
                category.category.as_str(),
                category.current_spent,
                category.predicted_total
            );
        }
    }

    Ok(())
}

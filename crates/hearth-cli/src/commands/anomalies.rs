//! Category baseline and anomaly command implementations

use anyhow::Result;
use hearth_core::analytics::{Analytics, AnomalyQuery, AnomalySeverity, Listing};
use hearth_core::models::ExpenseCategory;

use super::analytics::resolve_range;
use super::{print_json, truncate};

pub fn cmd_baseline(
    analytics: &Analytics,
    category: &str,
    days: Option<u32>,
    json: bool,
) -> Result<()> {
    let category: ExpenseCategory = category.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let baseline = analytics.calculate_category_baseline(category, days)?;

    if json {
        return print_json(&analytics.with_metadata(baseline)?);
    }

    let days = days.unwrap_or(analytics.config().anomaly_lookback_days);
    println!("📏 {} baseline (last {} days)", category, days);
    println!("   ─────────────────────────────");
    println!("   Expenses:   {}", baseline.sample_count);
    println!("   Mean:       ${:.2}", baseline.mean);
    println!("   Std dev:    ${:.2}", baseline.std_dev);

    Ok(())
}

pub fn cmd_anomalies(
    analytics: &Analytics,
    days: Option<u32>,
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut query = AnomalyQuery {
        lookback_days: days,
        ..AnomalyQuery::default()
    };
    if let Some(range) = resolve_range(analytics, from, to)? {
        query = query.with_display_range(range);
    }

    let anomalies = analytics.detect_anomalies(query)?;

    if json {
        return print_json(&analytics.with_metadata(Listing::from(anomalies))?);
    }

    if anomalies.is_empty() {
        println!("✅ No unusual spending found.");
        return Ok(());
    }

    println!("⚠️  Unusual Spending ({})", anomalies.len());
    println!();
    println!(
        "{:>6} {:<10} {:<20} {:<24} {:>10} {:>10} {:>6}",
        "ID", "Date", "Category", "Place", "Amount", "Usual", "Z"
    );
    println!("{}", "-".repeat(92));
    for anomaly in &anomalies {
        let marker = match anomaly.severity {
            AnomalySeverity::Critical => "🔴",
            AnomalySeverity::Warning => "🟡",
        };
        println!(
            "{:>6} {:<10} {:<20} {:<24} {:>10.2} {:>10.2} {:>6.2} {}",
            anomaly.expense_id,
            anomaly.date,
            anomaly.category.as_str(),
            truncate(anomaly.place.as_deref().unwrap_or("-"), 24),
            anomaly.amount,
            anomaly.category_mean,
            anomaly.z_score,
            marker
        );
    }
    println!();
    println!("Hide one with 'hearth dismiss <ID>'.");

    Ok(())
}

pub fn cmd_dismiss(analytics: &Analytics, expense_id: i64) -> Result<()> {
    analytics.dismiss_anomaly(expense_id)?;
    println!("✅ Dismissed anomaly for expense #{}", expense_id);
    Ok(())
}

pub fn cmd_clear_dismissed(analytics: &Analytics) -> Result<()> {
    analytics.clear_dismissed_anomalies()?;
    println!("✅ Cleared all dismissed anomalies");
    Ok(())
}

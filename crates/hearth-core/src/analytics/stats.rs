//! Numeric helpers shared by every analytics component
//!
//! All ratios, averages and percentages go through here. Each helper checks
//! its divisor and returns 0 (or None for nullable fields) instead of NaN or
//! Infinity, and any non-finite input collapses to 0.

/// Replace NaN/Infinity with 0
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Round to currency precision (2 decimal places)
pub fn round_currency(value: f64) -> f64 {
    finite_or_zero((finite_or_zero(value) * 100.0).round() / 100.0)
}

/// `numerator / denominator`, or 0 when the denominator is 0
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    finite_or_zero(numerator / denominator)
}

/// Average of `total` over `count` items, or 0 for no items
pub fn safe_average(total: f64, count: usize) -> f64 {
    safe_ratio(total, count as f64)
}

/// `part` as a percentage of `whole`, or 0 when `whole` is 0
pub fn safe_percent(part: f64, whole: f64) -> f64 {
    safe_ratio(part, whole) * 100.0
}

/// Period-over-period change in percent
///
/// None when there is no previous period or it had nothing to compare against.
pub fn percent_change(current: f64, previous: Option<f64>) -> Option<f64> {
    let previous = previous?;
    if previous <= 0.0 || !previous.is_finite() {
        return None;
    }
    Some(round_currency(
        (finite_or_zero(current) - previous) / previous * 100.0,
    ))
}

/// Mean and population standard deviation
///
/// Returns (0, 0) for an empty slice; the deviation is 0 for fewer than two
/// values.
pub fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let mean = safe_average(values.iter().map(|v| finite_or_zero(*v)).sum(), values.len());
    if values.len() < 2 {
        return (mean, 0.0);
    }

    let variance = safe_average(
        values
            .iter()
            .map(|v| (finite_or_zero(*v) - mean).powi(2))
            .sum(),
        values.len(),
    );

    (mean, finite_or_zero(variance.max(0.0).sqrt()))
}

/// Median of a slice, 0 when empty
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted: Vec<f64> = values.iter().map(|v| finite_or_zero(*v)).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_ratio_zero_divisor() {
        assert_eq!(safe_ratio(10.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
        assert_eq!(safe_ratio(10.0, f64::INFINITY), 0.0);
        assert_eq!(safe_ratio(10.0, 4.0), 2.5);
    }

    #[test]
    fn test_safe_average_and_percent() {
        assert_eq!(safe_average(0.0, 0), 0.0);
        assert_eq!(safe_average(30.0, 3), 10.0);
        assert_eq!(safe_percent(25.0, 0.0), 0.0);
        assert_eq!(safe_percent(25.0, 100.0), 25.0);
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(150.0, Some(100.0)), Some(50.0));
        assert_eq!(percent_change(50.0, Some(100.0)), Some(-50.0));
        assert_eq!(percent_change(50.0, Some(0.0)), None);
        assert_eq!(percent_change(50.0, None), None);
    }

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(1.005_f64 + 0.0001), 1.01);
        assert_eq!(round_currency(12.344), 12.34);
        assert_eq!(round_currency(f64::NAN), 0.0);
        assert_eq!(round_currency(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_mean_and_std_dev() {
        assert_eq!(mean_and_std_dev(&[]), (0.0, 0.0));
        assert_eq!(mean_and_std_dev(&[42.0]), (42.0, 0.0));

        let (mean, std_dev) = mean_and_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(mean, 5.0);
        assert_eq!(std_dev, 2.0);

        let (mean, std_dev) = mean_and_std_dev(&[0.0, 0.0, 0.0]);
        assert_eq!(mean, 0.0);
        assert_eq!(std_dev, 0.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }
}

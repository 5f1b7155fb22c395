use crate::datasets::{Series, Value};

/// Case count from which outbreaks are compared against each other.
pub const DEFAULT_THRESHOLD: i64 = 100;

/// Counts of `field` starting on the first day that reaches `threshold`.
///
/// Missing values count as 0. Returns an empty vector when the column does not
/// exist or never reaches the threshold.
#[must_use]
pub fn align_from_threshold(series: &Series, field: &str, threshold: i64) -> Vec<i64> {
    let Some(column) = series.column(field) else {
        return Vec::new();
    };

    column
        .iter()
        .map(count_or_zero)
        .skip_while(|count| *count < threshold)
        .collect()
}

/// Number of days on record since `field` first reached `threshold`.
#[must_use]
pub fn days_since_threshold(series: &Series, field: &str, threshold: i64) -> usize {
    align_from_threshold(series, field, threshold).len()
}

#[expect(clippy::cast_possible_truncation, reason = "case counts are far below i64::MAX")]
fn count_or_zero(value: &Value) -> i64 {
    match value {
        Value::Count(c) => *c,
        Value::Number(n) if n.is_finite() => *n as i64,
        _ => 0,
    }
}

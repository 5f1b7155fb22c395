use super::alignment::{DEFAULT_THRESHOLD, days_since_threshold};
use crate::Result;
use crate::datasets::{DatasetBundle, Series, Value};
use core::cmp::Reverse;
use core::fmt::Write;
use owo_colors::OwoColorize;

/// Headline field of the Italian feed.
pub const ITALY_HEADLINE: &str = "totalPositive";

/// Headline field of the covidtracking.com series.
pub const US_HEADLINE: &str = "positive";

pub fn generate<W: Write>(bundle: &DatasetBundle, use_colors: bool, writer: &mut W) -> Result<()> {
    let title = format!("COVID-19 datasets collected {}", bundle.collected_at.format("%Y-%m-%d %H:%M UTC"));
    if use_colors {
        writeln!(writer, "{}", title.bold())?;
    } else {
        writeln!(writer, "{title}")?;
    }
    writeln!(writer)?;

    let mut regions: Vec<(&str, &Series)> = bundle.regions.iter().map(|(name, series)| (name.as_str(), series)).collect();
    regions.sort_by_key(|(name, series)| (Reverse(latest_count(series, US_HEADLINE)), *name));

    let name_width = regions.iter().map(|(name, _)| name.len()).chain([5]).max().unwrap_or(5);

    writeln!(writer, "  {:<name_width$} : {}", "Italy", describe(&bundle.italy, ITALY_HEADLINE, use_colors))?;
    writeln!(writer, "  {:<name_width$} : {}", "US", describe(&bundle.us, US_HEADLINE, use_colors))?;
    writeln!(writer)?;

    let heading = format!("States ({} fetched, {} failed)", regions.len(), bundle.failed_regions.len());
    if use_colors {
        writeln!(writer, "{}", heading.bold())?;
    } else {
        writeln!(writer, "{heading}")?;
    }

    for (name, series) in &regions {
        writeln!(writer, "  {name:<name_width$} : {}", describe(series, US_HEADLINE, use_colors))?;
    }

    if !bundle.failed_regions.is_empty() {
        writeln!(writer)?;
        for failure in &bundle.failed_regions {
            let line = format!("{} kept failing after {} attempt(s)", failure.region, failure.attempts);
            if use_colors {
                writeln!(writer, "  {}", line.red())?;
            } else {
                writeln!(writer, "  {line}")?;
            }
        }
    }

    Ok(())
}

/// One-line summary: day count, date span, latest headline value and days since the threshold.
fn describe(series: &Series, headline: &str, use_colors: bool) -> String {
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        return "no data".to_string();
    };

    let latest = series
        .latest(headline)
        .filter(|v| !v.is_null())
        .map_or_else(|| "n/a".to_string(), Value::to_string);
    let latest = if use_colors { latest.cyan().to_string() } else { latest };

    format!(
        "{} days, {} to {}, {headline} {latest}, {} days since {DEFAULT_THRESHOLD} cases",
        series.len(),
        first.format("%Y-%m-%d"),
        last.format("%Y-%m-%d"),
        days_since_threshold(series, headline, DEFAULT_THRESHOLD)
    )
}

fn latest_count(series: &Series, field: &str) -> i64 {
    series.latest(field).and_then(Value::as_count).unwrap_or(0)
}

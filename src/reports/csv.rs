use crate::Result;
use crate::datasets::Series;
use ohno::IntoAppError;
use std::io::Write;

/// Write `series` as CSV: a header of field names (date first), then one row per day.
///
/// Dates are written as `YYYY-MM-DD` and missing values as empty cells.
pub fn generate<W: Write>(series: &Series, writer: W) -> Result<()> {
    let mut csv = ::csv::Writer::from_writer(writer);

    csv.write_record(series.fields()).into_app_err("unable to write CSV header")?;

    for index in 0..series.len() {
        let row = series.row(index).map(|cell| cell.map(ToString::to_string).unwrap_or_default());
        csv.write_record(row).into_app_err_with(|| format!("unable to write CSV row {}", index + 1))?;
    }

    csv.flush().into_app_err("unable to flush CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{SchemaSpec, map_payload};
    use serde_json::json;

    #[test]
    fn test_generate_writes_sorted_rows_with_empty_nulls() {
        let (schema, records) = map_payload(
            &json!([
                {"date": 20_200_322, "positive": 515, "death": 2, "state": "WA"},
                {"date": 20_200_320, "positive": 500, "death": null, "state": "WA"}
            ]),
            &SchemaSpec::covid_tracking("WA"),
            "test://",
        )
        .unwrap();
        let series = Series::normalize(&schema, records);

        let mut out = Vec::new();
        generate(&series, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "date,death,positive,state\n2020-03-20,,500,WA\n2020-03-22,2,515,WA\n"
        );
    }

    #[test]
    fn test_generate_quotes_text_with_commas() {
        let (schema, records) = map_payload(
            &json!([{"date": "20200320", "notes": "tests pending, partial"}]),
            &SchemaSpec::covid_tracking("NY"),
            "test://",
        )
        .unwrap();
        let series = Series::normalize(&schema, records);

        let mut out = Vec::new();
        generate(&series, &mut out).unwrap();

        assert!(String::from_utf8(out).unwrap().ends_with("2020-03-20,\"tests pending, partial\"\n"));
    }
}

//! Maps raw source records onto canonical day records.

use super::{DataError, Schema, SchemaSpec, Value};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

/// One observed day, keyed by canonical field name.
pub type DayRecord = BTreeMap<String, Value>;

/// Map one raw record through `schema`.
///
/// The date field is parsed with the schema's date format; every other field
/// passes through unchanged.
pub fn map_record(raw: &Map<String, Json>, schema: &Schema) -> Result<DayRecord, DataError> {
    let mut record = DayRecord::new();

    for (index, mapping) in schema.fields().iter().enumerate() {
        let Some(raw_value) = raw.get(&mapping.raw) else {
            return Err(DataError::SchemaMismatch {
                schema: schema.name().to_string(),
                field: mapping.raw.clone(),
            });
        };

        let value = if index == 0 {
            Value::Date(parse_date(raw_value, &mapping.raw, schema)?)
        } else {
            Value::from_json(raw_value)
        };

        let _ = record.insert(mapping.canonical.clone(), value);
    }

    Ok(record)
}

/// Map every record of a JSON array payload.
///
/// The schema is resolved against the first record so inferred schemas see
/// the source's actual field set. Returns the resolved schema alongside the records.
pub fn map_payload(payload: &Json, spec: &SchemaSpec, url: &str) -> Result<(Schema, Vec<DayRecord>), DataError> {
    let Json::Array(items) = payload else {
        return Err(DataError::MalformedPayload {
            url: url.to_string(),
            reason: "expected a JSON array of daily records".to_string(),
        });
    };

    let raw_records = items
        .iter()
        .map(|item| {
            item.as_object().ok_or_else(|| DataError::MalformedPayload {
                url: url.to_string(),
                reason: format!("expected a JSON object per day, found '{item}'"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let schema = spec.resolve(raw_records.first().copied());
    let records = raw_records
        .into_iter()
        .map(|raw| map_record(raw, &schema))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((schema, records))
}

fn parse_date(raw: &Json, field: &str, schema: &Schema) -> Result<chrono::NaiveDate, DataError> {
    // covidtracking.com sends the date as a bare number
    let text = match raw {
        Json::String(s) => s.clone(),
        Json::Number(n) => n.to_string(),
        other => other.to_string(),
    };

    schema.date_format().parse(&text).ok_or_else(|| DataError::InvalidDate {
        schema: schema.name().to_string(),
        field: field.to_string(),
        value: text,
        format: schema.date_format().as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::DateFormat;
    use chrono::NaiveDate;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_map_record_renames_and_parses_timestamp() {
        let raw = json!({
            "data": "2020-02-24T18:00:00",
            "ricoverati_con_sintomi": 101,
            "terapia_intensiva": 26,
            "totale_ospedalizzati": 127,
            "isolamento_domiciliare": 94,
            "totale_attualmente_positivi": 221,
            "nuovi_attualmente_positivi": 221,
            "dimessi_guariti": 1,
            "deceduti": 7,
            "totale_casi": 229,
            "tamponi": 4324,
            "stato": "ITA"
        });

        let schema = Schema::italy();
        let record = map_record(raw.as_object().unwrap(), &schema).unwrap();

        assert_eq!(record["date"], date(2020, 2, 24));
        assert_eq!(record["totalPositive"], Value::Count(221));
        assert_eq!(record["swabs"], Value::Count(4324));
        assert!(!record.contains_key("stato"), "unmapped fields are dropped");
    }

    #[test]
    fn test_map_record_key_set_matches_schema() {
        let schema = Schema::new("test", "d", "date", DateFormat::compact())
            .field("p", "positive")
            .field("n", "negative");
        let raw = json!({"d": 20_200_320, "p": 5, "n": null, "extra": true});

        let record = map_record(raw.as_object().unwrap(), &schema).unwrap();

        let keys: Vec<_> = record.keys().map(String::as_str).collect();
        let mut expected: Vec<_> = schema.canonical_fields().collect();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(record["negative"], Value::Null);
    }

    #[test]
    fn test_map_record_missing_field_is_schema_mismatch() {
        let schema = Schema::new("test", "date", "date", DateFormat::compact()).field("positive", "positive");
        let raw = json!({"date": "20200320"});

        let err = map_record(raw.as_object().unwrap(), &schema).unwrap_err();
        match err {
            DataError::SchemaMismatch { field, .. } => assert_eq!(field, "positive"),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_map_record_bad_date_is_invalid_date() {
        let schema = Schema::new("test", "date", "date", DateFormat::compact());
        let raw = json!({"date": "March 20"});

        let err = map_record(raw.as_object().unwrap(), &schema).unwrap_err();
        assert!(matches!(err, DataError::InvalidDate { .. }));
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_map_payload_infers_schema_from_first_record() {
        let payload = json!([
            {"date": 20_200_322, "positive": 515, "state": "WA"},
            {"date": 20_200_320, "positive": 500, "state": "WA"}
        ]);

        let (schema, records) = map_payload(&payload, &SchemaSpec::covid_tracking("WA"), "test://wa").unwrap();

        assert_eq!(schema.fields().len(), 3);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["date"], date(2020, 3, 20));
        assert_eq!(records[1]["state"], Value::Text("WA".to_string()));
    }

    #[test]
    fn test_map_payload_rejects_non_array() {
        let payload = json!({"error": true});
        let err = map_payload(&payload, &SchemaSpec::covid_tracking("x"), "test://x").unwrap_err();
        assert!(matches!(err, DataError::MalformedPayload { .. }));
    }

    #[test]
    fn test_map_payload_later_record_missing_field() {
        let payload = json!([
            {"date": 20_200_322, "positive": 515},
            {"date": 20_200_320}
        ]);

        let err = map_payload(&payload, &SchemaSpec::covid_tracking("x"), "test://x").unwrap_err();
        assert!(matches!(err, DataError::SchemaMismatch { .. }));
    }
}

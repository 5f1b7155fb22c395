use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value as Json};

/// A `chrono` format string used to read the date field of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat(String);

impl DateFormat {
    /// Date and time, e.g. `2020-02-24T18:00:00`. The time part is dropped.
    pub const TIMESTAMP: &'static str = "%Y-%m-%dT%H:%M:%S";

    /// Eight digit numeric date, e.g. `20200322`.
    pub const COMPACT: &'static str = "%Y%m%d";

    #[must_use]
    pub fn new(format: impl Into<String>) -> Self {
        Self(format.into())
    }

    #[must_use]
    pub fn timestamp() -> Self {
        Self::new(Self::TIMESTAMP)
    }

    #[must_use]
    pub fn compact() -> Self {
        Self::new(Self::COMPACT)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a date, truncating any time component.
    ///
    /// A format with a `T` separator also accepts the bare date part, so
    /// `2020-02-24` reads fine with [`DateFormat::TIMESTAMP`].
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, &self.0) {
            return Some(dt.date());
        }

        if let Ok(d) = NaiveDate::parse_from_str(text, &self.0) {
            return Some(d);
        }

        let (date_part, _) = self.0.split_once('T')?;
        NaiveDate::parse_from_str(text, date_part).ok()
    }
}

/// Maps one raw source key onto its canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub raw: String,
    pub canonical: String,
}

/// The field layout of one source.
///
/// Exactly one field is the date field; it is always the first mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    date_format: DateFormat,
    fields: Vec<FieldMapping>,
}

impl Schema {
    /// Start a schema from its date field.
    #[must_use]
    pub fn new(name: impl Into<String>, raw_date: impl Into<String>, canonical_date: impl Into<String>, date_format: DateFormat) -> Self {
        Self {
            name: name.into(),
            date_format,
            fields: vec![FieldMapping {
                raw: raw_date.into(),
                canonical: canonical_date.into(),
            }],
        }
    }

    /// Add a pass-through field.
    #[must_use]
    pub fn field(mut self, raw: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.fields.push(FieldMapping {
            raw: raw.into(),
            canonical: canonical.into(),
        });
        self
    }

    /// Identity schema over every key of `record`.
    #[must_use]
    pub fn infer(name: impl Into<String>, record: Option<&Map<String, Json>>, date_field: &str, date_format: DateFormat) -> Self {
        let mut schema = Self::new(name, date_field, date_field, date_format);
        if let Some(record) = record {
            for key in record.keys().filter(|k| *k != date_field) {
                schema = schema.field(key.as_str(), key.as_str());
            }
        }
        schema
    }

    /// Italian civil protection national feed (`dpc-covid19-ita-andamento-nazionale.json`).
    #[must_use]
    pub fn italy() -> Self {
        Self::new("italy", "data", "date", DateFormat::timestamp())
            .field("ricoverati_con_sintomi", "hospitalizedWithSymptoms")
            .field("terapia_intensiva", "intensiveCare")
            .field("totale_ospedalizzati", "totalHospitalized")
            .field("isolamento_domiciliare", "homeQuarantine")
            .field("totale_attualmente_positivi", "totalPositive")
            .field("nuovi_attualmente_positivi", "newPositives")
            .field("dimessi_guariti", "dischargedRecovered")
            .field("deceduti", "deceased")
            .field("totale_casi", "totalCases")
            .field("tamponi", "swabs")
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn date_format(&self) -> &DateFormat {
        &self.date_format
    }

    #[must_use]
    pub fn date_field(&self) -> &FieldMapping {
        &self.fields[0]
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    pub fn canonical_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.canonical.as_str())
    }
}

/// How a source's schema is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSpec {
    /// A fixed, explicitly mapped schema.
    Fixed(Schema),

    /// An identity schema taken from the first record of each payload.
    Inferred {
        name: String,
        date_field: String,
        date_format: DateFormat,
    },
}

impl SchemaSpec {
    /// The covidtracking.com daily layout: every key kept as-is, `date` as `YYYYMMDD`.
    #[must_use]
    pub fn covid_tracking(name: impl Into<String>) -> Self {
        Self::Inferred {
            name: name.into(),
            date_field: "date".to_string(),
            date_format: DateFormat::compact(),
        }
    }

    /// Resolve the schema for a payload whose first record is `first`.
    #[must_use]
    pub fn resolve(&self, first: Option<&Map<String, Json>>) -> Schema {
        match self {
            Self::Fixed(schema) => schema.clone(),
            Self::Inferred {
                name,
                date_field,
                date_format,
            } => Schema::infer(name.as_str(), first, date_field, date_format.clone()),
        }
    }
}

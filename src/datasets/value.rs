use chrono::NaiveDate;
use core::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};

/// A single cell of a series.
///
/// Dates come out of the field mapper; everything else is passed through from
/// the source JSON without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Date(NaiveDate),
    Count(i64),
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl Value {
    /// Wrap a raw JSON value, keeping integers as counts.
    #[must_use]
    pub fn from_json(raw: &serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Count)
                .or_else(|| n.as_f64().map(Self::Number))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Integer view of the cell, `None` for nulls and non-integral values.
    #[must_use]
    pub const fn as_count(&self) -> Option<i64> {
        match self {
            Self::Count(c) => Some(*c),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Count(c) => write!(f, "{c}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_integers_as_counts() {
        assert_eq!(Value::from_json(&json!(515)), Value::Count(515));
        assert_eq!(Value::from_json(&json!(1.5)), Value::Number(1.5));
        assert_eq!(Value::from_json(&json!(null)), Value::Null);
        assert_eq!(Value::from_json(&json!("NY")), Value::Text("NY".to_string()));
    }

    #[test]
    fn test_display_formats_dates_and_nulls() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 20).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2020-03-20");
        assert_eq!(Value::Null.to_string(), "");
    }
}

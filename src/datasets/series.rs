//! Column-oriented time series.

use super::{DayRecord, Schema, Value};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A set of equally long columns, one per canonical field.
///
/// Index `i` of every column refers to the same day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    date_field: String,
    columns: BTreeMap<String, Vec<Value>>,
}

impl Series {
    /// Build a series and sort it chronologically.
    ///
    /// The sort is stable: records sharing a date keep their input order.
    #[must_use]
    pub fn normalize(schema: &Schema, records: Vec<DayRecord>) -> Self {
        let mut series = Self::normalize_ordered(schema, records);
        series.sort_by_date();
        series
    }

    /// Build a series from records already in chronological order.
    ///
    /// Columns are the schema's canonical fields. A record lacking one of them
    /// contributes [`Value::Null`] to that column; fields outside the schema are dropped.
    #[must_use]
    pub fn normalize_ordered(schema: &Schema, records: Vec<DayRecord>) -> Self {
        let mut columns: BTreeMap<String, Vec<Value>> = schema
            .canonical_fields()
            .map(|field| (field.to_string(), Vec::with_capacity(records.len())))
            .collect();

        for mut record in records {
            for (field, column) in &mut columns {
                column.push(record.remove(field).unwrap_or(Value::Null));
            }
        }

        Self {
            date_field: schema.date_field().canonical.clone(),
            columns,
        }
    }

    fn sort_by_date(&mut self) {
        let dates = self.columns.get(&self.date_field).map(Vec::as_slice).unwrap_or_default();
        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i].as_date());

        if order.iter().enumerate().all(|(pos, &i)| pos == i) {
            return;
        }

        for column in self.columns.values_mut() {
            let mut taken: Vec<Option<Value>> = column.drain(..).map(Some).collect();
            column.extend(order.iter().filter_map(|&i| taken.get_mut(i).and_then(Option::take)));
        }
    }

    #[must_use]
    pub fn date_field(&self) -> &str {
        &self.date_field
    }

    /// Number of days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.get(&self.date_field).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn column(&self, field: &str) -> Option<&[Value]> {
        self.columns.get(field).map(Vec::as_slice)
    }

    /// Field names, date field first.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        core::iter::once(self.date_field.as_str()).chain(self.columns.keys().map(String::as_str).filter(|f| *f != self.date_field))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.column(&self.date_field).unwrap_or_default().iter().filter_map(Value::as_date)
    }

    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates().next()
    }

    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates().last()
    }

    /// The value of `field` on the most recent day.
    #[must_use]
    pub fn latest(&self, field: &str) -> Option<&Value> {
        self.column(field)?.last()
    }

    /// The cells of one day, in [`Series::fields`] order.
    pub fn row(&self, index: usize) -> impl Iterator<Item = Option<&Value>> + '_ {
        self.fields().map(move |f| self.columns.get(f).and_then(|c| c.get(index)))
    }
}

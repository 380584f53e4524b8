use chrono::{DateTime, NaiveDate, Utc};
use scylla::frame::response::result::{ColumnSpec, CqlValue, Row};
use scylla::frame::value::{CqlDate, CqlTimestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A result row addressed by column name, so that mapping into records does
/// not depend on the column order `SELECT *` happens to return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowData {
    pub columns: HashMap<String, ColumnValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
    Text(String),
    Int(i32),
    BigInt(i64),
    Double(f64),
    Boolean(bool),
    Uuid(Uuid),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Date(NaiveDate),
    Null,
}

impl From<CqlValue> for ColumnValue {
    fn from(value: CqlValue) -> Self {
        match value {
            CqlValue::Text(s) | CqlValue::Ascii(s) => ColumnValue::Text(s),
            CqlValue::Int(i) => ColumnValue::Int(i),
            CqlValue::BigInt(i) => ColumnValue::BigInt(i),
            CqlValue::Double(d) => ColumnValue::Double(d),
            CqlValue::Boolean(b) => ColumnValue::Boolean(b),
            CqlValue::Uuid(u) => ColumnValue::Uuid(u),
            CqlValue::Timestamp(CqlTimestamp(ms)) => ColumnValue::Timestamp(ms),
            CqlValue::Date(d) => {
                let date: Result<NaiveDate, _> = d.try_into();
                date.map_or(ColumnValue::Null, ColumnValue::Date)
            }
            // None of the hospital tables use other types.
            _ => ColumnValue::Null,
        }
    }
}

impl ColumnValue {
    /// Convert into a bind value; `Null` binds as CQL null.
    pub fn into_cql(self) -> Option<CqlValue> {
        match self {
            ColumnValue::Text(s) => Some(CqlValue::Text(s)),
            ColumnValue::Int(i) => Some(CqlValue::Int(i)),
            ColumnValue::BigInt(i) => Some(CqlValue::BigInt(i)),
            ColumnValue::Double(d) => Some(CqlValue::Double(d)),
            ColumnValue::Boolean(b) => Some(CqlValue::Boolean(b)),
            ColumnValue::Uuid(u) => Some(CqlValue::Uuid(u)),
            ColumnValue::Timestamp(ms) => Some(CqlValue::Timestamp(CqlTimestamp(ms))),
            ColumnValue::Date(d) => Some(CqlValue::Date(CqlDate::from(d))),
            ColumnValue::Null => None,
        }
    }
}

impl From<Option<String>> for ColumnValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(ColumnValue::Null, ColumnValue::Text)
    }
}

impl From<Option<i32>> for ColumnValue {
    fn from(value: Option<i32>) -> Self {
        value.map_or(ColumnValue::Null, ColumnValue::Int)
    }
}

impl RowData {
    pub fn from_columns<I, K>(columns: I) -> Self
    where
        I: IntoIterator<Item = (K, ColumnValue)>,
        K: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Pair a driver row with the column specs of its result set.
    pub fn from_driver_row(specs: &[ColumnSpec], row: Row) -> Self {
        let columns = specs
            .iter()
            .zip(row.columns)
            .map(|(spec, value)| {
                let value = value.map_or(ColumnValue::Null, ColumnValue::from);
                (spec.name.clone(), value)
            })
            .collect();
        Self { columns }
    }

    /// Missing and null columns are both reported as `None`.
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        match self.columns.get(column) {
            Some(ColumnValue::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    pub fn uuid(&self, column: &str) -> Option<Uuid> {
        match self.get(column)? {
            ColumnValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn text(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            ColumnValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn int(&self, column: &str) -> Option<i32> {
        match self.get(column)? {
            ColumnValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn timestamp(&self, column: &str) -> Option<DateTime<Utc>> {
        match self.get(column)? {
            ColumnValue::Timestamp(ms) => DateTime::from_timestamp_millis(*ms),
            _ => None,
        }
    }

    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        match self.get(column)? {
            ColumnValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cql_date_epoch() {
        let epoch = DateTime::UNIX_EPOCH.date_naive();
        assert_eq!(ColumnValue::Date(epoch).into_cql(), Some(CqlValue::Date(CqlDate(1 << 31))));
        assert_eq!(ColumnValue::from(CqlValue::Date(CqlDate(1 << 31))), ColumnValue::Date(epoch));
    }

    #[test]
    fn test_cql_date_before_epoch() {
        let dob = NaiveDate::from_ymd_opt(1950, 6, 15).unwrap();
        let encoded = match ColumnValue::Date(dob).into_cql() {
            Some(CqlValue::Date(d)) => d,
            other => panic!("unexpected bind value {:?}", other),
        };
        assert!(encoded.0 < (1 << 31));
        assert_eq!(ColumnValue::from(CqlValue::Date(encoded)), ColumnValue::Date(dob));
    }

    #[test]
    fn test_missing_and_null_columns_are_absent() {
        let row = RowData::from_columns([
            ("name", ColumnValue::Text("Cardiology".to_string())),
            ("description", ColumnValue::Null),
        ]);
        assert_eq!(row.text("name").as_deref(), Some("Cardiology"));
        assert_eq!(row.text("description"), None);
        assert_eq!(row.text("medical_record"), None);
    }

    #[test]
    fn test_typed_accessor_rejects_wrong_type() {
        let row = RowData::from_columns([("age", ColumnValue::Text("35".to_string()))]);
        assert_eq!(row.int("age"), None);
    }

    #[test]
    fn test_from_cql_value() {
        let id = Uuid::new_v4();
        assert_eq!(ColumnValue::from(CqlValue::Uuid(id)), ColumnValue::Uuid(id));
        assert_eq!(
            ColumnValue::from(CqlValue::Ascii("x".to_string())),
            ColumnValue::Text("x".to_string())
        );
        assert_eq!(
            ColumnValue::from(CqlValue::Timestamp(CqlTimestamp(1_700_000_000_000))),
            ColumnValue::Timestamp(1_700_000_000_000)
        );
    }

    #[test]
    fn test_into_cql_null() {
        assert_eq!(ColumnValue::Null.into_cql(), None);
        assert_eq!(ColumnValue::from(None::<String>), ColumnValue::Null);
        assert_eq!(ColumnValue::Int(35).into_cql(), Some(CqlValue::Int(35)));
    }

    #[test]
    fn test_timestamp_accessor() {
        let row = RowData::from_columns([("created_at", ColumnValue::Timestamp(0))]);
        assert_eq!(row.timestamp("created_at"), Some(DateTime::UNIX_EPOCH));
    }
}

//! Application-side EDM values.
//!
//! Wire payloads arrive as `serde_json::Value`; codecs in this crate marshal
//! them into [`EdmValue`] and back. The variant set mirrors the OData v4
//! primitive types plus the structural shapes (collection, object) needed by
//! entity parsers.

use std::collections::BTreeMap;
use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::duration::EdmDuration;

#[derive(Debug, Clone, PartialEq)]
pub enum EdmValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Decimal(BigDecimal),
    String(String),
    Guid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTimeOffset(DateTime<Utc>),
    Duration(EdmDuration),
    Binary(Vec<u8>),
    Collection(Vec<EdmValue>),
    Object(BTreeMap<String, EdmValue>),
}

impl EdmValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, EdmValue::Null)
    }

    /// Short type tag used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            EdmValue::Null => "null",
            EdmValue::Bool(_) => "bool",
            EdmValue::Int(_) => "int",
            EdmValue::Double(_) => "double",
            EdmValue::Decimal(_) => "decimal",
            EdmValue::String(_) => "string",
            EdmValue::Guid(_) => "guid",
            EdmValue::Date(_) => "date",
            EdmValue::Time(_) => "time",
            EdmValue::DateTimeOffset(_) => "datetimeoffset",
            EdmValue::Duration(_) => "duration",
            EdmValue::Binary(_) => "binary",
            EdmValue::Collection(_) => "collection",
            EdmValue::Object(_) => "object",
        }
    }
}

impl fmt::Display for EdmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

impl From<bool> for EdmValue {
    fn from(v: bool) -> Self {
        EdmValue::Bool(v)
    }
}

impl From<i64> for EdmValue {
    fn from(v: i64) -> Self {
        EdmValue::Int(v)
    }
}

impl From<&str> for EdmValue {
    fn from(v: &str) -> Self {
        EdmValue::String(v.to_owned())
    }
}

impl From<Uuid> for EdmValue {
    fn from(v: Uuid) -> Self {
        EdmValue::Guid(v)
    }
}

/// Resolved entity key, ready for URL rendering.
///
/// A single declared key collapses to its bare value; composite keys keep
/// their `name=value` pairs in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKey {
    Single(EdmValue),
    Composite(Vec<(String, EdmValue)>),
}

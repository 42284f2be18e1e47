//! Custom scalar interpreters.
//!
//! An interpreter is a plain function attached to a schema [`crate::types::Field`] that coerces
//! a [`RawValue`] into a typed [`Value`]. Interpreters never panic: every failure is an
//! [`InterpretError`], which the validator attributes to the offending row and column.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tabular_ingest::interpret::{interpret_datetime, DATETIME_PARSING};
//! use tabular_ingest::types::{RawValue, Value};
//!
//! let v = interpret_datetime(&RawValue::Text("2024-02-15".to_string())).unwrap();
//! let midnight = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! assert_eq!(v, Value::DateTime(midnight));
//!
//! let err = interpret_datetime(&RawValue::Text("Novtember the 32nd".to_string())).unwrap_err();
//! assert_eq!(err.kind, DATETIME_PARSING);
//! ```

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::types::{RawValue, Value};

/// Signature of a custom coercion function.
pub type ScalarInterpreter = fn(&RawValue) -> Result<Value, InterpretError>;

/// Error kind reported when text matches none of [`DATETIME_FORMATS`].
pub const DATETIME_PARSING: &str = "datetime_parsing";
/// Error kind reported when a value has a kind the interpreter does not accept.
pub const VALUE_ERROR: &str = "value_error";

/// Structured interpreter failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretError {
    /// Machine-readable error kind (e.g. [`DATETIME_PARSING`]).
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl InterpretError {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for InterpretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for InterpretError {}

/// A `chrono` format string, tagged by whether it carries a time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeFormat {
    /// Calendar date only; parsed values are at midnight.
    Date(&'static str),
    /// Date and time.
    DateTime(&'static str),
}

impl DateTimeFormat {
    fn parse(self, input: &str) -> Option<NaiveDateTime> {
        match self {
            DateTimeFormat::Date(fmt) => NaiveDate::parse_from_str(input, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            DateTimeFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(input, fmt).ok(),
        }
    }
}

/// Formats tried by [`interpret_datetime`], in order. The first match wins.
pub const DATETIME_FORMATS: &[DateTimeFormat] = &[
    DateTimeFormat::Date("%Y-%m-%d"),
    DateTimeFormat::DateTime("%Y-%m-%d %H:%M:%S"),
    DateTimeFormat::DateTime("%Y-%m-%dT%H:%M:%S"),
    DateTimeFormat::DateTime("%Y-%m-%d %H:%M:%S%.f"),
    DateTimeFormat::DateTime("%Y-%m-%dT%H:%M:%S%.f"),
    DateTimeFormat::Date("%Y/%m/%d"),
    DateTimeFormat::Date("%d.%m.%Y"),
];

/// Flexible date/time interpreter.
///
/// - date/time cells (typically from spreadsheets) are returned unchanged
/// - text is parsed as-is (no trimming) with each of [`DATETIME_FORMATS`] in turn
/// - anything else is rejected with [`VALUE_ERROR`]
pub fn interpret_datetime(raw: &RawValue) -> Result<Value, InterpretError> {
    match raw {
        RawValue::DateTime(dt) => Ok(Value::DateTime(*dt)),
        RawValue::Text(text) => DATETIME_FORMATS
            .iter()
            .find_map(|fmt| fmt.parse(text))
            .map(Value::DateTime)
            .ok_or_else(|| InterpretError::new(DATETIME_PARSING, "Could not parse as datetime")),
        RawValue::Null | RawValue::Int(_) | RawValue::Float(_) | RawValue::Bool(_) => {
            Err(InterpretError::new(
                VALUE_ERROR,
                format!("Can't interpret this kind of data ('{}')", raw.type_name()),
            ))
        }
    }
}

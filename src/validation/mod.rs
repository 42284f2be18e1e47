//! Row validation.
//!
//! The ingestion pipeline is schema-agnostic: it only needs something implementing
//! [`RowValidator`]. [`SchemaValidator`] covers the common case of a declarative [`crate::types::Schema`];
//! callers with bespoke row types can implement the trait by hand.
//!
//! ```rust
//! use tabular_ingest::types::{RawRow, RawValue, ValidatedRow, Value};
//! use tabular_ingest::validation::{FieldError, RowValidator};
//!
//! struct NonEmptyName;
//!
//! impl RowValidator for NonEmptyName {
//!     fn validate(&self, row: &RawRow) -> Result<ValidatedRow, Vec<FieldError>> {
//!         match row.get("name") {
//!             Some(RawValue::Text(name)) => {
//!                 let mut out = ValidatedRow::for_raw(row);
//!                 out.push("name", Value::Utf8(name.clone()));
//!                 Ok(out)
//!             }
//!             other => Err(vec![FieldError::new(
//!                 "name",
//!                 other.map(|v| v.to_string()).unwrap_or_default(),
//!                 "missing",
//!                 "Field required",
//!             )]),
//!         }
//!     }
//! }
//! ```

pub mod schema;

use std::fmt;

use crate::interpret::InterpretError;
use crate::types::{RawRow, RawValue, ValidatedRow};

pub use schema::SchemaValidator;

/// Validates one raw row into a typed row, or reports every offending field.
pub trait RowValidator {
    /// Validate `row`. On failure, errors are returned in the order they should be reported.
    fn validate(&self, row: &RawRow) -> Result<ValidatedRow, Vec<FieldError>>;
}

impl<V: RowValidator + ?Sized> RowValidator for &V {
    fn validate(&self, row: &RawRow) -> Result<ValidatedRow, Vec<FieldError>> {
        (**self).validate(row)
    }
}

impl<V: RowValidator + ?Sized> RowValidator for Box<V> {
    fn validate(&self, row: &RawRow) -> Result<ValidatedRow, Vec<FieldError>> {
        (**self).validate(row)
    }
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Normalized column name.
    pub column: String,
    /// The raw cell, rendered as text.
    pub raw_input: String,
    /// Machine-readable error kind (e.g. `int_parsing`, `datetime_parsing`).
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    pub fn new(
        column: impl Into<String>,
        raw_input: impl Into<String>,
        kind: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            raw_input: raw_input.into(),
            kind,
            message: message.into(),
        }
    }

    /// Attribute an interpreter failure to `column`.
    pub fn from_interpret(column: &str, raw: &RawValue, err: InterpretError) -> Self {
        Self {
            column: column.to_string(),
            raw_input: raw.to_string(),
            kind: err.kind,
            message: err.message,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column '{}', input '{}': {}",
            self.column, self.raw_input, self.message
        )
    }
}

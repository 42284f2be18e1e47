//! Core data model types.
//!
//! Adapters produce [`RawRow`]s of loosely-typed [`RawValue`]s. A validator turns each raw row
//! into a [`ValidatedRow`] of typed [`Value`]s matching a user-provided [`Schema`], and the
//! pipeline assembles validated rows into a [`DataSet`].

use std::fmt;

use chrono::NaiveDateTime;

use crate::interpret::ScalarInterpreter;
use crate::normalize::normalize_column_name;

/// Name of the synthetic column carrying a row's 1-based position within its source.
pub const ROW_NUMBER_COLUMN: &str = "row_number";
/// Name of the synthetic column carrying a row's partition (sheet name), if any.
pub const SOURCE_PARTITION_COLUMN: &str = "source_partition";

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Naive (timezone-less) date and time.
    DateTime,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone)]
pub struct Field {
    /// Normalized field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
    /// Whether empty cells are accepted (as [`Value::Null`]).
    pub nullable: bool,
    /// Custom coercion used instead of the built-in rules for `data_type`.
    pub interpreter: Option<ScalarInterpreter>,
}

impl Field {
    /// Create a new required field. The name is normalized like a source header.
    pub fn new(name: impl AsRef<str>, data_type: DataType) -> Self {
        Self {
            name: normalize_column_name(name.as_ref()),
            data_type,
            nullable: false,
            interpreter: None,
        }
    }

    /// Accept empty cells for this field.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Coerce this field's raw values with `interpreter`.
    pub fn with_interpreter(mut self, interpreter: ScalarInterpreter) -> Self {
        self.interpreter = Some(interpreter);
        self
    }
}

/// A list of fields describing the expected shape of incoming rows.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// An untyped cell value as produced by a row source.
///
/// Delimited text only ever yields [`RawValue::Null`] and [`RawValue::Text`]; spreadsheets keep
/// the cell's native type.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Empty cell.
    Null,
    /// Text cell.
    Text(String),
    /// Integer cell.
    Int(i64),
    /// Floating point cell.
    Float(f64),
    /// Boolean cell.
    Bool(bool),
    /// Cell already holding a date/time.
    DateTime(NaiveDateTime),
}

impl RawValue {
    /// Short name of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Text(_) => "str",
            RawValue::Int(_) => "int",
            RawValue::Float(_) => "float",
            RawValue::Bool(_) => "bool",
            RawValue::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Int(i) => write!(f, "{i}"),
            RawValue::Float(v) => write!(f, "{v}"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// One source record before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based position within the source (the header is row 0).
    pub row_number: usize,
    /// Partition the row came from (sheet name), `None` for single-stream sources.
    pub source_partition: Option<String>,
    cells: Vec<(String, RawValue)>,
}

impl RawRow {
    /// Create an empty row at the given position.
    pub fn new(row_number: usize, source_partition: Option<String>) -> Self {
        Self {
            row_number,
            source_partition,
            cells: Vec::new(),
        }
    }

    /// Set a cell. `column` must already be normalized; an existing cell of that name is replaced.
    pub fn insert(&mut self, column: impl Into<String>, value: RawValue) {
        let column = column.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Builder-style [`Self::insert`].
    pub fn with(mut self, column: impl Into<String>, value: RawValue) -> Self {
        self.insert(column, value);
        self
    }

    /// Look up a cell by normalized column name.
    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Iterate cells in source column order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of cells (synthetic position fields excluded).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Naive date and time.
    DateTime(NaiveDateTime),
}

/// Typed output of validating a [`RawRow`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRow {
    /// Position copied from the raw row.
    pub row_number: usize,
    /// Partition copied from the raw row.
    pub source_partition: Option<String>,
    values: Vec<(String, Value)>,
}

impl ValidatedRow {
    /// Create a validated row carrying the position of `raw`.
    pub fn for_raw(raw: &RawRow) -> Self {
        Self {
            row_number: raw.row_number,
            source_partition: raw.source_partition.clone(),
            values: Vec::new(),
        }
    }

    /// Append a typed value. Names are expected to be unique within a row.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.values.push((column.into(), value));
    }

    /// Look up a value by column name, including the synthetic position columns.
    pub fn get(&self, column: &str) -> Option<Value> {
        match column {
            ROW_NUMBER_COLUMN => Some(Value::Int64(self.row_number as i64)),
            SOURCE_PARTITION_COLUMN => Some(partition_value(self.source_partition.as_deref())),
            _ => self
                .values
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.clone()),
        }
    }

    /// Iterate the validated (non-synthetic) values in order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

fn partition_value(partition: Option<&str>) -> Value {
    partition.map_or(Value::Null, |p| Value::Utf8(p.to_string()))
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as [`DataSet::columns`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    /// Column names, in order.
    pub columns: Vec<String>,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Assemble validated rows into a dataset, preserving row order.
    ///
    /// The column set is the union of validated columns in first-seen order, followed by
    /// [`ROW_NUMBER_COLUMN`] and [`SOURCE_PARTITION_COLUMN`]. Values a row does not carry are
    /// filled with [`Value::Null`].
    pub fn from_validated_rows(validated: &[ValidatedRow]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in validated {
            for (name, _) in row.values() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }
        columns.push(ROW_NUMBER_COLUMN.to_string());
        columns.push(SOURCE_PARTITION_COLUMN.to_string());

        let rows = validated
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the index of a column by name, if present.
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value at (`row`, `column`), if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.index_of(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.index_of(column)?;
        Some(self.rows.iter().filter_map(|r| r.get(idx)).collect())
    }
}

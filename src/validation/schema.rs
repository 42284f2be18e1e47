//! Schema-driven [`RowValidator`].

use crate::interpret::interpret_datetime;
use crate::types::{DataType, Field, RawRow, RawValue, Schema, ValidatedRow, Value};

use super::{FieldError, RowValidator};

/// Validates rows against a declarative [`Schema`].
///
/// Coercion is lax in the way spreadsheet exports need: integers accept whole floats and numeric
/// text, booleans accept `0`/`1` and `yes`/`no`, strings accept any scalar. Fields of type
/// [`DataType::DateTime`] go through [`interpret_datetime`] unless the field has its own
/// interpreter. Columns not named in the schema are ignored.
///
/// A nullable field maps an absent, null or blank (whitespace-only) cell to [`Value::Null`]. A
/// required field only rejects absent and null cells; blank text goes through the field's normal
/// coercion, so a required string keeps `""` while a required datetime reports a parse error.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Schema,
}

impl SchemaValidator {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl RowValidator for SchemaValidator {
    fn validate(&self, row: &RawRow) -> Result<ValidatedRow, Vec<FieldError>> {
        let mut out = ValidatedRow::for_raw(row);
        let mut errors = Vec::new();

        for field in &self.schema.fields {
            match coerce_field(field, row.get(&field.name)) {
                Ok(value) => out.push(field.name.clone(), value),
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }
}

fn coerce_field(field: &Field, raw: Option<&RawValue>) -> Result<Value, FieldError> {
    let raw = match raw {
        None | Some(RawValue::Null) if field.nullable => return Ok(Value::Null),
        None | Some(RawValue::Null) => {
            return Err(FieldError::new(&field.name, "", "missing", "Field required"));
        }
        Some(RawValue::Text(s)) if field.nullable && s.trim().is_empty() => return Ok(Value::Null),
        Some(raw) => raw,
    };

    if let Some(interpreter) = field.interpreter {
        return interpreter(raw).map_err(|e| FieldError::from_interpret(&field.name, raw, e));
    }

    let result = match field.data_type {
        DataType::Int64 => coerce_i64(raw).map(Value::Int64),
        DataType::Float64 => coerce_f64(raw).map(Value::Float64),
        DataType::Bool => coerce_bool(raw).map(Value::Bool),
        DataType::Utf8 => Ok(Value::Utf8(raw.to_string())),
        DataType::DateTime => {
            return interpret_datetime(raw).map_err(|e| FieldError::from_interpret(&field.name, raw, e));
        }
    };
    result.map_err(|(kind, message)| FieldError::new(&field.name, raw.to_string(), kind, message))
}

type CoerceError = (&'static str, String);

fn coerce_i64(raw: &RawValue) -> Result<i64, CoerceError> {
    match raw {
        RawValue::Int(i) => Ok(*i),
        RawValue::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                Ok(*f as i64)
            } else {
                Err((
                    "int_from_float",
                    "Input should be a valid integer, got a number with a fractional part"
                        .to_string(),
                ))
            }
        }
        RawValue::Text(s) => s.trim().parse::<i64>().map_err(|_| {
            (
                "int_parsing",
                "Input should be a valid integer, unable to parse string as an integer".to_string(),
            )
        }),
        _ => Err(("int_type", "Input should be a valid integer".to_string())),
    }
}

fn coerce_f64(raw: &RawValue) -> Result<f64, CoerceError> {
    match raw {
        RawValue::Float(f) => Ok(*f),
        RawValue::Int(i) => Ok(*i as f64),
        RawValue::Text(s) => s.trim().parse::<f64>().map_err(|_| {
            (
                "float_parsing",
                "Input should be a valid number, unable to parse string as a number".to_string(),
            )
        }),
        _ => Err(("float_type", "Input should be a valid number".to_string())),
    }
}

fn coerce_bool(raw: &RawValue) -> Result<bool, CoerceError> {
    let invalid = || {
        (
            "bool_parsing",
            "Input should be a valid boolean, unable to interpret input".to_string(),
        )
    };
    match raw {
        RawValue::Bool(b) => Ok(*b),
        RawValue::Int(0) => Ok(false),
        RawValue::Int(1) => Ok(true),
        RawValue::Float(f) if *f == 0.0 => Ok(false),
        RawValue::Float(f) if *f == 1.0 => Ok(true),
        RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => Ok(true),
            "false" | "f" | "0" | "no" | "n" => Ok(false),
            _ => Err(invalid()),
        },
        RawValue::Int(_) | RawValue::Float(_) => Err(invalid()),
        _ => Err(("bool_type", "Input should be a valid boolean".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::interpret::{DATETIME_PARSING, InterpretError};

    fn timestamped_schema() -> Schema {
        Schema::new(vec![
            Field::new("col1", DataType::Int64),
            Field::new("col2", DataType::Utf8),
            Field::new("timestamp", DataType::DateTime),
        ])
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn valid_row_is_coerced_in_schema_order() {
        let validator = SchemaValidator::new(timestamped_schema());
        let row = RawRow::new(2, None)
            .with("timestamp", text("2024-02-15"))
            .with("col2", text("col2-2"))
            .with("col1", text("2"))
            .with("ignored", text("x"));

        let out = validator.validate(&row).unwrap();
        let names: Vec<&str> = out.values().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["col1", "col2", "timestamp"]);
        assert_eq!(out.get("col1"), Some(Value::Int64(2)));
        assert_eq!(out.get("col2"), Some(Value::Utf8("col2-2".to_string())));
        assert_eq!(
            out.get("timestamp"),
            Some(Value::DateTime(
                NaiveDate::from_ymd_opt(2024, 2, 15)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            ))
        );
        assert_eq!(out.get("row_number"), Some(Value::Int64(2)));
        assert_eq!(out.get("ignored"), None);
    }

    #[test]
    fn every_invalid_field_is_reported_in_schema_order() {
        let validator = SchemaValidator::new(timestamped_schema());
        let row = RawRow::new(3, None)
            .with("col1", text("three"))
            .with("col2", text("ok"))
            .with("timestamp", text("Novtember the 32nd"));

        let errors = validator.validate(&row).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].column, "col1");
        assert_eq!(errors[0].kind, "int_parsing");
        assert_eq!(errors[1].column, "timestamp");
        assert_eq!(errors[1].kind, DATETIME_PARSING);
        assert_eq!(errors[1].raw_input, "Novtember the 32nd");
        assert_eq!(errors[1].message, "Could not parse as datetime");
    }

    #[test]
    fn missing_and_null_values_respect_nullability() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("note", DataType::Utf8).nullable(),
        ]);
        let validator = SchemaValidator::new(schema);

        let ok = validator
            .validate(&RawRow::new(1, None).with("id", RawValue::Int(1)))
            .unwrap();
        assert_eq!(ok.get("note"), Some(Value::Null));

        let errors = validator
            .validate(&RawRow::new(2, None).with("id", RawValue::Null))
            .unwrap_err();
        assert_eq!(errors[0].kind, "missing");
        assert_eq!(errors[0].message, "Field required");
    }

    #[test]
    fn blank_text_is_null_only_for_nullable_fields() {
        let validator = SchemaValidator::new(timestamped_schema());
        let row = RawRow::new(1, None)
            .with("col1", text("   "))
            .with("col2", text(""))
            .with("timestamp", text(""));

        let errors = validator.validate(&row).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].column, "col1");
        assert_eq!(errors[0].kind, "int_parsing");
        assert_eq!(errors[0].raw_input, "   ");
        assert_eq!(errors[1].column, "timestamp");
        assert_eq!(errors[1].kind, DATETIME_PARSING);

        let nullable = SchemaValidator::new(Schema::new(vec![
            Field::new("note", DataType::Utf8).nullable(),
            Field::new("seen", DataType::DateTime).nullable(),
            Field::new("name", DataType::Utf8),
        ]));
        let out = nullable
            .validate(
                &RawRow::new(2, None)
                    .with("note", text(" "))
                    .with("seen", text(""))
                    .with("name", text("")),
            )
            .unwrap();
        assert_eq!(out.get("note"), Some(Value::Null));
        assert_eq!(out.get("seen"), Some(Value::Null));
        assert_eq!(out.get("name"), Some(Value::Utf8(String::new())));
    }

    #[test]
    fn lax_numeric_and_bool_coercion() {
        assert_eq!(coerce_i64(&RawValue::Float(4.0)), Ok(4));
        assert_eq!(coerce_i64(&text(" 12 ")), Ok(12));
        assert_eq!(coerce_i64(&RawValue::Float(4.5)).unwrap_err().0, "int_from_float");
        assert_eq!(coerce_f64(&RawValue::Int(3)), Ok(3.0));
        assert_eq!(coerce_f64(&text("x")).unwrap_err().0, "float_parsing");
        assert_eq!(coerce_bool(&text("Yes")), Ok(true));
        assert_eq!(coerce_bool(&RawValue::Int(0)), Ok(false));
        assert_eq!(coerce_bool(&RawValue::Int(2)).unwrap_err().0, "bool_parsing");
    }

    #[test]
    fn custom_interpreter_overrides_builtin_rules() {
        fn upper(raw: &RawValue) -> Result<Value, InterpretError> {
            match raw {
                RawValue::Text(s) => Ok(Value::Utf8(s.to_uppercase())),
                other => Err(InterpretError::new(
                    "value_error",
                    format!("expected text, got {}", other.type_name()),
                )),
            }
        }

        let schema = Schema::new(vec![Field::new("code", DataType::Utf8).with_interpreter(upper)]);
        let validator = SchemaValidator::new(schema);

        let ok = validator
            .validate(&RawRow::new(1, None).with("code", text("ab")))
            .unwrap();
        assert_eq!(ok.get("code"), Some(Value::Utf8("AB".to_string())));

        let errors = validator
            .validate(&RawRow::new(2, None).with("code", RawValue::Int(5)))
            .unwrap_err();
        assert_eq!(errors[0].raw_input, "5");
        assert_eq!(errors[0].message, "expected text, got int");
    }

    #[test]
    fn schema_field_names_are_normalized() {
        let schema = Schema::new(vec![Field::new(" Order Date ", DataType::DateTime)]);
        assert_eq!(schema.index_of("order_date"), Some(0));
    }
}

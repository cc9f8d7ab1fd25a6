//! Type conversion between JSON and Tally's row types.
//!
//! Decoding is schema-directed: the column's declared type decides how a JSON
//! scalar is read. `Uuid` travels as a string, `DateTime` as integer
//! milliseconds and `Json` columns hold any JSON value inline.

use serde_json::{Map, Number, Value as Json};
use std::rc::Rc;
use tally_core::schema::TableSchema;
use tally_core::{DataType, Error, JsonValue, Result, Row, Value};

/// Converts a JSON value to a Tally value of the column's type.
pub fn json_to_value(column: &str, json: &Json, expected: DataType) -> Result<Value> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    let value = match expected {
        DataType::Boolean => json.as_bool().map(Value::Boolean),
        DataType::Int64 => json.as_i64().map(Value::Int64),
        DataType::Float64 => json.as_f64().map(Value::Float64),
        DataType::String => json.as_str().map(|s| Value::String(s.to_string())),
        DataType::DateTime => json.as_i64().map(Value::DateTime),
        DataType::Uuid => json
            .as_str()
            .and_then(|s| s.parse().ok())
            .map(Value::Uuid),
        DataType::Json => Some(Value::Json(JsonValue::new(json.clone()))),
    };
    value.ok_or_else(|| Error::type_mismatch(column, expected, &Value::Json(JsonValue::new(json.clone()))))
}

/// Converts a Tally value to JSON. Non-finite floats have no JSON form and
/// become `null`.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Int64(n) => Json::Number((*n).into()),
        Value::Float64(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::DateTime(ms) => Json::Number((*ms).into()),
        Value::Uuid(u) => Json::String(u.to_string()),
        Value::Json(j) => j.0.clone(),
    }
}

/// Converts a row to a JSON object.
pub fn row_to_json(row: &Row) -> Json {
    let object: Map<String, Json> = row
        .iter()
        .map(|(column, value)| (column.to_string(), value_to_json(value)))
        .collect();
    Json::Object(object)
}

/// Converts a JSON object to a row of `schema`.
pub fn json_to_row(schema: &TableSchema, json: &Json) -> Result<Row> {
    let object = json.as_object().ok_or_else(|| {
        Error::invalid_operation(format!("row of table '{}' is not a JSON object", schema.name()))
    })?;
    let mut row = Row::new();
    for (column, value) in object {
        let col = schema
            .get_column(column)
            .ok_or_else(|| Error::column_not_found(schema.name(), column))?;
        row.set(column.clone(), json_to_value(column, value, col.data_type())?);
    }
    Ok(row)
}

/// Converts rows to a JSON array.
pub fn rows_to_json(rows: &[Rc<Row>]) -> Json {
    Json::Array(rows.iter().map(|r| row_to_json(r)).collect())
}

/// Converts a JSON array to rows of `schema`.
pub fn json_to_rows(schema: &TableSchema, json: &Json) -> Result<Vec<Row>> {
    let array = json.as_array().ok_or_else(|| {
        Error::invalid_operation(format!("rows of table '{}' are not a JSON array", schema.name()))
    })?;
    array.iter().map(|item| json_to_row(schema, item)).collect()
}

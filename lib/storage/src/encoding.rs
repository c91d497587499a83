//! Conversion between the literal representation of the model and SQLite values.
//!
//! The value column of the literal relation holds the opaque scalar of a literal. The tag column
//! holds either an integer (`0` for untyped strings, a datatype id otherwise) or a language marker.

use crate::StorageError;
use quadlite_model::{Literal, LiteralTag, LiteralValue};
use rusqlite::types::{Value, ValueRef};

pub fn literal_value_to_sql(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Integer(value) => Value::Integer(*value),
        LiteralValue::Double(value) => Value::Real(*value),
        LiteralValue::Text(value) => Value::Text(value.clone()),
        LiteralValue::Blob(value) => Value::Blob(value.clone()),
    }
}

pub fn tag_to_sql(tag: &LiteralTag) -> Value {
    match tag.stored_integer() {
        Some(value) => Value::Integer(value),
        None => Value::Text(tag.stored_text().unwrap_or_default()),
    }
}

/// Decodes a stored value. Returns [None] for SQL `NULL`.
pub fn literal_value_from_sql(value: ValueRef<'_>) -> Result<Option<LiteralValue>, StorageError> {
    Ok(match value {
        ValueRef::Null => None,
        ValueRef::Integer(value) => Some(LiteralValue::Integer(value)),
        ValueRef::Real(value) => Some(LiteralValue::Double(value)),
        ValueRef::Text(value) => Some(LiteralValue::Text(decode_utf8(value)?.to_owned())),
        ValueRef::Blob(value) => Some(LiteralValue::Blob(value.to_vec())),
    })
}

/// Decodes a stored tag. Returns [None] for SQL `NULL`, which marks a resource in a column that
/// may hold either kind of value.
pub fn tag_from_sql(value: ValueRef<'_>) -> Result<Option<LiteralTag>, StorageError> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(value) => Ok(Some(LiteralTag::from_stored_integer(value))),
        ValueRef::Text(value) => {
            let value = decode_utf8(value)?;
            LiteralTag::from_stored_text(value)
                .map(Some)
                .ok_or_else(|| StorageError::InternalError(format!("Invalid literal tag '{value}'.")))
        }
        ValueRef::Real(_) | ValueRef::Blob(_) => Err(StorageError::InternalError(
            "Literal tags must be integers or language markers.".to_owned(),
        )),
    }
}

/// Decodes a literal from its value and tag columns.
pub fn literal_from_sql(
    value: ValueRef<'_>,
    tag: ValueRef<'_>,
) -> Result<Option<Literal>, StorageError> {
    let Some(value) = literal_value_from_sql(value)? else {
        return Ok(None);
    };
    let tag = tag_from_sql(tag)?.unwrap_or(LiteralTag::Plain);
    Ok(Some(Literal::new(value, tag)))
}

fn decode_utf8(value: &[u8]) -> Result<&str, StorageError> {
    std::str::from_utf8(value)
        .map_err(|_| StorageError::InternalError("Stored text is not valid UTF-8.".to_owned()))
}

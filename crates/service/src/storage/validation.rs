use serde_json::Value;

use crate::errors::ServiceError;
use crate::storage::Catalog;

/// Characters that would corrupt the host's property encoding.
pub const FORBIDDEN_NAME_CHARS: [char; 7] = ['[', ']', '{', '}', '"', '\'', '\\'];

pub fn validate_catalog_name(name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::validation("catalog name must be a non-empty string"));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(ServiceError::Validation(format!("catalog name {name:?} contains invalid character {c:?}")));
    }
    Ok(())
}

pub fn validate_object_key(key: &str) -> Result<(), ServiceError> {
    if key.trim().is_empty() {
        return Err(ServiceError::validation("object key must be a non-empty string"));
    }
    Ok(())
}

/// Accept only JSON objects as catalog contents.
pub fn as_catalog(data: &Value) -> Result<&Catalog, ServiceError> {
    match data {
        Value::Object(map) => Ok(map),
        Value::Null => Err(ServiceError::validation("catalog data must not be null")),
        Value::Array(_) => Err(ServiceError::validation("catalog data must be an object, not an array")),
        other => Err(ServiceError::Validation(format!("catalog data must be an object, got {}", type_name(other)))),
    }
}

pub fn validate_size(size: usize, limit: usize) -> Result<(), ServiceError> {
    if size > limit {
        return Err(ServiceError::SizeLimit { size, limit });
    }
    Ok(())
}

pub(crate) fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

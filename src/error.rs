//! Errors raised by the dynamic (JSON value) entry points of the store.

use serde_json::Value;
use thiserror::Error;

/// Errors returned when a store is fed untyped JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// State and updates must be JSON objects.
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

impl StoreError {
    pub(crate) fn not_an_object(value: &Value) -> Self {
        let found = match value {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        };
        StoreError::NotAnObject { found }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_the_offending_kind() {
        let err = StoreError::not_an_object(&json!([1, 2]));
        assert_eq!(err, StoreError::NotAnObject { found: "an array" });
        assert_eq!(err.to_string(), "expected a JSON object, found an array");
    }
}

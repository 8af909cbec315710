use thiserror::Error;

use crate::validate::FieldErrors;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("no client intake has been imported")]
    NoIntake,

    #[error("form incomplete: {} field(s) need attention", .0.len())]
    Incomplete(FieldErrors),

    #[error("`{value}` is not a valid choice for `{key}`")]
    UnknownChoice { key: String, value: String },
}

/// A wire string that matches none of an enumeration's values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

//! Formatting helpers - compact collections, scalars and labelled data

pub mod compact;
pub mod scalar;

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

pub use compact::{
    compact_repr, compact_repr_hash_set, compact_repr_set, compact_repr_value,
    compact_repr_value_set,
};
pub use scalar::{data_print, fmt, fmt_value, Fmt};

/// Errors raised by the formatting helpers
#[derive(Debug, Error, Diagnostic)]
pub enum FormatError {
    /// The value's type is not handled by the routine
    #[error("{routine}: unsupported type: {kind}")]
    #[diagnostic(code(recipekit::format::unsupported_type))]
    UnsupportedType { routine: &'static str, kind: &'static str },
}

impl FormatError {
    pub(crate) fn unsupported(routine: &'static str, value: &Value) -> Self {
        FormatError::UnsupportedType {
            routine,
            kind: json_kind(value),
        }
    }
}

/// Name of a JSON value's type
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

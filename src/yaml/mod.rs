//! YAML document loading and diagnostics

pub mod diagnostics;

pub use diagnostics::{parse_document, span_for_pointer, YamlSyntaxError};

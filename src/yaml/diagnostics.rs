//! YAML parse errors and source locations for document diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML syntax error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("YAML syntax error in {filename}: {message}")]
#[diagnostic(code(recipekit::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    filename: String,
    message: String,
}

impl YamlSyntaxError {
    /// Create a syntax error from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            filename: filename.to_string(),
            message,
        }
    }

    /// The underlying parser message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Parse YAML (or JSON, which is a YAML subset) into a JSON value
pub fn parse_document(source: &str, filename: &str) -> Result<serde_json::Value, YamlSyntaxError> {
    serde_yml::from_str(source).map_err(|e| YamlSyntaxError::from_serde_error(&e, source, filename))
}

/// Convert 1-based line/column to a byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (i, text) in source.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            let col = text
                .char_indices()
                .nth(column.saturating_sub(1))
                .map(|(j, _)| j)
                .unwrap_or(text.len());
            return offset + col;
        }
        offset += text.len();
    }
    source.len().saturating_sub(1)
}

/// Find the span of the key named by the last component of a JSON pointer.
///
/// Array indices point at their parent key. Falls back to the first line.
pub fn span_for_pointer(source: &str, pointer: &str) -> SourceSpan {
    let parts: Vec<&str> = pointer.split('/').filter(|s| !s.is_empty()).collect();

    let key = match parts.as_slice() {
        [] => None,
        [.., parent, last] if last.parse::<usize>().is_ok() => Some(*parent),
        [.., last] => Some(*last),
    };

    key.and_then(|k| find_key_span(source, k))
        .unwrap_or_else(|| first_line_span(source))
}

fn first_line_span(source: &str) -> SourceSpan {
    let len = source.find('\n').unwrap_or(source.len()).max(1);
    (0, len).into()
}

/// Span of the first line whose content starts with `key:` (or `"key":`)
fn find_key_span(source: &str, key: &str) -> Option<SourceSpan> {
    let plain = format!("{}:", key);
    let quoted = format!("\"{}\":", key);

    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let body = line.trim_end_matches(['\r', '\n']);
        let trimmed = body.trim_start_matches([' ', '-', '{', ',']);
        if trimmed.starts_with(&plain) || trimmed.starts_with(&quoted) {
            let start = offset + (body.len() - trimmed.len());
            return Some((start, trimmed.len().max(1)).into());
        }
        offset += line.len();
    }
    None
}

/// Suggestions for common YAML mistakes
fn generate_help(message: &str) -> Option<String> {
    let msg_lower = message.to_lowercase();

    if msg_lower.contains("tab") {
        return Some("YAML requires spaces for indentation, not tabs.".to_string());
    }

    if msg_lower.contains("duplicate key") {
        return Some("Each key can only appear once. Remove or rename the duplicate key.".to_string());
    }

    if msg_lower.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have incorrect indentation.".to_string());
    }

    if msg_lower.contains("found unexpected ':'") || msg_lower.contains("did not find expected") {
        return Some("Quote values containing ':' or braces: \"https://host/{api}\"".to_string());
    }

    None
}

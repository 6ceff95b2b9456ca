//! Placeholder syntax for recipe templates
//!
//! A placeholder is a name in braces: `{name}`. Doubled braces (`{{`, `}}`)
//! are literal braces. Positional fields (`{}`, `{0}`), format specs
//! (`{name:>8}`), conversions (`{name!r}`) and attribute or index access
//! (`{name.attr}`, `{name[0]}`) are rejected.

use std::collections::BTreeSet;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// What is wrong with a template
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("'{{' is never closed")]
    UnclosedBrace,

    #[error("single '}}' outside a placeholder (write '}}}}' for a literal brace)")]
    UnmatchedClose,

    #[error("'{{' inside a placeholder")]
    NestedOpen,

    #[error("empty or positional placeholder")]
    Positional,

    #[error("placeholder '{0}' uses unsupported syntax ('{1}')")]
    Unsupported(String, char),
}

/// Template syntax error with the offending span
#[derive(Debug, Error, Diagnostic)]
#[error("invalid template: {kind}")]
#[diagnostic(
    code(recipekit::template::syntax),
    help("placeholders look like {{name}}; write {{{{ and }}}} for literal braces")
)]
pub struct TemplateSyntaxError {
    kind: SyntaxErrorKind,

    #[source_code]
    src: String,

    #[label("here")]
    span: SourceSpan,
}

impl TemplateSyntaxError {
    fn new(kind: SyntaxErrorKind, source: &str, start: usize, len: usize) -> Self {
        Self {
            kind,
            src: source.to_string(),
            span: (start, len.max(1)).into(),
        }
    }

    pub fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }

    /// Byte offset of the error in the template
    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}

/// A piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A template split into literal text and placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `source`, failing on the first syntax error
    pub fn parse(source: &str) -> Result<Self, TemplateSyntaxError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(TemplateSyntaxError::new(
                        SyntaxErrorKind::UnmatchedClose,
                        source,
                        i,
                        1,
                    ));
                }
                '{' => {
                    let name_start = i + 1;
                    let mut name_end = None;
                    for (j, n) in chars.by_ref() {
                        match n {
                            '}' => {
                                name_end = Some(j);
                                break;
                            }
                            '{' => {
                                return Err(TemplateSyntaxError::new(
                                    SyntaxErrorKind::NestedOpen,
                                    source,
                                    j,
                                    1,
                                ));
                            }
                            _ => {}
                        }
                    }
                    let Some(end) = name_end else {
                        return Err(TemplateSyntaxError::new(
                            SyntaxErrorKind::UnclosedBrace,
                            source,
                            i,
                            source.len() - i,
                        ));
                    };

                    let name = &source[name_start..end];
                    if let Some(kind) = check_name(name) {
                        return Err(TemplateSyntaxError::new(kind, source, i, end + 1 - i));
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The unparsed template text
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in order of first appearance, without repeats
    pub fn placeholder_order(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.placeholders_iter()
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// The set of placeholder names
    pub fn placeholders(&self) -> BTreeSet<&str> {
        self.placeholders_iter().collect()
    }

    fn placeholders_iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder using `lookup`.
    ///
    /// Returns the first name `lookup` has no value for as the error.
    pub fn render<'v, F>(&self, mut lookup: F) -> Result<String, &str>
    where
        F: FnMut(&str) -> Option<&'v str>,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match lookup(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => return Err(name.as_str()),
                },
            }
        }
        Ok(out)
    }
}

fn check_name(name: &str) -> Option<SyntaxErrorKind> {
    if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
        return Some(SyntaxErrorKind::Positional);
    }
    name.chars()
        .find(|c| matches!(c, ':' | '!' | '.' | '['))
        .map(|c| SyntaxErrorKind::Unsupported(name.to_string(), c))
}

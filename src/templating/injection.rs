//! Injecting keys and values into a template
//!
//! A template together with its key/value list is a *recipe*. Injection is
//! all-or-nothing: the placeholder names of the template must be exactly
//! the keys of the list, otherwise nothing is produced.

use std::collections::{BTreeSet, HashMap};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::templating::placeholder::{Template, TemplateSyntaxError};

/// Errors raised while checking or injecting a recipe
#[derive(Debug, Error, Diagnostic)]
pub enum RecipeError {
    /// Placeholders and keys differ
    #[error("parameter mismatch")]
    #[diagnostic(
        code(recipekit::recipe::parameter_mismatch),
        help("every placeholder needs exactly one key and every key needs a placeholder")
    )]
    ParameterMismatch(#[source] MismatchCause),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] TemplateSyntaxError),

    /// A cartesian key with nothing to expand
    #[error("no candidate values for key '{key}'")]
    #[diagnostic(code(recipekit::recipe::empty_values))]
    EmptyValues { key: String },
}

impl RecipeError {
    /// The mismatch behind a [`RecipeError::ParameterMismatch`]
    pub fn mismatch(&self) -> Option<&MismatchCause> {
        match self {
            RecipeError::ParameterMismatch(cause) => Some(cause),
            _ => None,
        }
    }
}

/// How the placeholder set and key set differ
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MismatchCause {
    /// A placeholder has no key; reported for the first one in template order
    #[error("no value for placeholder '{0}'")]
    MissingKey(String),

    /// Keys that match no placeholder, sorted
    #[error("key(s) without a matching placeholder: {}", .0.join(", "))]
    ExcessKeys(Vec<String>),
}

/// One key and the value injected for it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for KeyValue {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Require the placeholder set of `template` to equal `keys`
pub(crate) fn check_parameters<'k>(
    template: &Template,
    keys: impl IntoIterator<Item = &'k str>,
) -> Result<(), RecipeError> {
    let keys: BTreeSet<&str> = keys.into_iter().collect();

    if let Some(missing) = template
        .placeholder_order()
        .into_iter()
        .find(|name| !keys.contains(name))
    {
        return Err(RecipeError::ParameterMismatch(MismatchCause::MissingKey(
            missing.to_string(),
        )));
    }

    let placeholders = template.placeholders();
    let excess: Vec<String> = keys
        .difference(&placeholders)
        .map(|key| key.to_string())
        .collect();
    if !excess.is_empty() {
        return Err(RecipeError::ParameterMismatch(MismatchCause::ExcessKeys(
            excess,
        )));
    }

    Ok(())
}

/// Injects key/value lists into one template
#[derive(Debug, Clone)]
pub struct RecipeInjector {
    template: Template,
}

impl RecipeInjector {
    /// Parse `template`; syntax errors are reported here
    pub fn new(template: &str) -> Result<Self, RecipeError> {
        Ok(Self {
            template: Template::parse(template)?,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Check that placeholders and keys match exactly
    pub fn validate(&self, keyvalues: &[KeyValue]) -> Result<(), RecipeError> {
        check_parameters(&self.template, keyvalues.iter().map(|kv| kv.key.as_str()))
    }

    /// Validate, then substitute every placeholder.
    ///
    /// Duplicate keys resolve to the last value in the list.
    pub fn construct_string(&self, keyvalues: &[KeyValue]) -> Result<String, RecipeError> {
        self.validate(keyvalues)?;

        let values = kv_map(keyvalues);
        let rendered = self
            .template
            .render(|name| values.get(name).copied())
            .map_err(|missing| {
                RecipeError::ParameterMismatch(MismatchCause::MissingKey(missing.to_string()))
            })?;

        debug!(template = self.template.as_str(), "constructed string");
        Ok(rendered)
    }
}

/// Key to value, last write wins
fn kv_map(keyvalues: &[KeyValue]) -> HashMap<&str, &str> {
    let mut values: HashMap<&str, &str> = HashMap::with_capacity(keyvalues.len());
    for kv in keyvalues {
        if let Some(previous) = values.insert(kv.key.as_str(), kv.value.as_str()) {
            if previous != kv.value {
                warn!(
                    key = kv.key.as_str(),
                    previous,
                    value = kv.value.as_str(),
                    "duplicate key, using the later value"
                );
            }
        }
    }
    values
}

/// Parse `template` and inject `keyvalues` into it
pub fn construct_string(template: &str, keyvalues: &[KeyValue]) -> Result<String, RecipeError> {
    RecipeInjector::new(template)?.construct_string(keyvalues)
}

/// A template and the key/value list injected into it.
///
/// Serializes to the shape of the `template_recipe` common schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    pub template: String,
    pub keyvalues: Vec<KeyValue>,
}

impl Recipe {
    pub fn new(template: impl Into<String>, keyvalues: Vec<KeyValue>) -> Self {
        Self {
            template: template.into(),
            keyvalues,
        }
    }

    /// Produce the injected string
    pub fn inject(&self) -> Result<String, RecipeError> {
        construct_string(&self.template, &self.keyvalues)
    }
}

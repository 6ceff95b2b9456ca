//! Cartesian expansion of one template over many values per key
//!
//! Each key carries a list of candidate values and [`Expansions`] walks the
//! product of those lists, first key slowest. The injector itself is kept
//! for older callers that only ever read the first combination.

use serde::{Deserialize, Serialize};

use crate::templating::injection::{check_parameters, RecipeError};
use crate::templating::placeholder::Template;

/// One key and its candidate values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyValues {
    pub key: String,
    pub values: Vec<String>,
}

impl KeyValues {
    pub fn new<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lazy product of every value combination, rendered through a template.
///
/// Cloning restarts nothing; it forks the walk at the current position.
/// Call [`CartesianInjector::expansions`] again to start over.
#[derive(Debug, Clone)]
pub struct Expansions<'a> {
    template: &'a Template,
    axes: Vec<(&'a str, &'a [String])>,
    cursor: Vec<usize>,
    done: bool,
    /// Combinations left, when that count fits in a `usize`
    remaining: Option<usize>,
}

impl<'a> Expansions<'a> {
    fn new(template: &'a Template, axes: Vec<(&'a str, &'a [String])>) -> Self {
        let remaining = axes
            .iter()
            .try_fold(1usize, |acc, (_, values)| acc.checked_mul(values.len()));
        Self {
            template,
            cursor: vec![0; axes.len()],
            done: axes.iter().any(|(_, values)| values.is_empty()),
            axes,
            remaining,
        }
    }

    /// Combinations not yet yielded; `None` if the count overflows `usize`
    pub fn remaining(&self) -> Option<usize> {
        if self.done {
            Some(0)
        } else {
            self.remaining
        }
    }

    /// First key whose value list is empty
    fn empty_axis(&self) -> Option<&'a str> {
        self.axes
            .iter()
            .find(|(_, values)| values.is_empty())
            .map(|(key, _)| *key)
    }

    fn current(&self) -> String {
        let lookup = |name: &str| {
            self.axes
                .iter()
                .zip(&self.cursor)
                .find(|((key, _), _)| *key == name)
                .map(|((_, values), &i)| values[i].as_str())
        };
        // placeholders and keys were checked to be equal
        self.template.render(lookup).unwrap_or_default()
    }

    /// Step the odometer; false once every combination has been visited
    fn advance(&mut self) -> bool {
        for (i, (_, values)) in self.axes.iter().enumerate().rev() {
            self.cursor[i] += 1;
            if self.cursor[i] < values.len() {
                return true;
            }
            self.cursor[i] = 0;
        }
        false
    }
}

impl Iterator for Expansions<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        let rendered = self.current();
        self.remaining = self.remaining.map(|n| n.saturating_sub(1));
        self.done = !self.advance();
        Some(rendered)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining() {
            Some(n) => (n, Some(n)),
            None => (usize::MAX, None),
        }
    }
}

/// Injector for one template and many values per key
#[deprecated(
    note = "only the first combination is returned; use RecipeInjector, or CartesianInjector::expansions for the full product"
)]
#[derive(Debug, Clone)]
pub struct CartesianInjector {
    template: Template,
}

#[allow(deprecated)]
impl CartesianInjector {
    pub fn new(template: &str) -> Result<Self, RecipeError> {
        Ok(Self {
            template: Template::parse(template)?,
        })
    }

    /// Check that placeholders and keys match exactly
    pub fn validate(&self, keyvalues: &[KeyValues]) -> Result<(), RecipeError> {
        check_parameters(&self.template, keyvalues.iter().map(|kv| kv.key.as_str()))
    }

    /// Every combination of values, first key varying slowest.
    ///
    /// A repeated key keeps its first position and its last value list.
    pub fn expansions<'a>(
        &'a self,
        keyvalues: &'a [KeyValues],
    ) -> Result<Expansions<'a>, RecipeError> {
        self.validate(keyvalues)?;

        let mut axes: Vec<(&str, &[String])> = Vec::with_capacity(keyvalues.len());
        for kv in keyvalues {
            match axes.iter_mut().find(|(key, _)| *key == kv.key) {
                Some(axis) => axis.1 = kv.values.as_slice(),
                None => axes.push((kv.key.as_str(), kv.values.as_slice())),
            }
        }

        Ok(Expansions::new(&self.template, axes))
    }

    /// The first combination only
    pub fn construct_string(&self, keyvalues: &[KeyValues]) -> Result<String, RecipeError> {
        let mut expansions = self.expansions(keyvalues)?;
        if let Some(key) = expansions.empty_axis() {
            return Err(RecipeError::EmptyValues {
                key: key.to_string(),
            });
        }
        expansions.next().ok_or_else(|| RecipeError::EmptyValues {
            key: String::new(),
        })
    }
}

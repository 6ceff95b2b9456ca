//! Reference resolution for `$ref` URIs
//!
//! The `jsonschema` crate calls back into a [`Retrieve`] implementation for
//! every external reference it meets while compiling a schema. The
//! [`CommonRetriever`] answers for the common schema set first and hands
//! anything else to a delegate. The default delegate only knows schemas
//! registered in memory; it never touches the network or the filesystem.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jsonschema::{Retrieve, Uri};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::schema::common::{CommonLookup, CommonSchemas};

/// Why a reference could not be retrieved
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The path lies under the base identifier but names no fragment
    #[error("'{uri}' is not a common base schema (known: {known})")]
    UnknownFragment { uri: String, known: String },

    /// Nothing local matched and remote retrieval is not available
    #[error("'{uri}' is not a registered schema and remote resolution is disabled")]
    RemoteDisabled { uri: String },
}

/// Extract the path component of an absolute or relative URI.
///
/// `json-schema:///schemas/common/base` and `/schemas/common/base` both
/// yield `/schemas/common/base`. Query and fragment are dropped.
pub fn uri_path(uri: &str) -> &str {
    let end = uri.find(['?', '#']).unwrap_or(uri.len());
    let uri = &uri[..end];

    let after_scheme = match uri.find(':') {
        Some(i) if uri[..i].chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) => {
            &uri[i + 1..]
        }
        _ => uri,
    };

    match after_scheme.strip_prefix("//") {
        Some(rest) => rest.find('/').map(|i| &rest[i..]).unwrap_or(""),
        None => after_scheme,
    }
}

/// In-memory schemas registered by identifier.
///
/// Lookup is by the exact URI first, then by its path, so a schema
/// registered as `/schemas/app/item` answers `json-schema:///schemas/app/item`.
#[derive(Debug, Clone, Default)]
pub struct RegisteredSchemas {
    schemas: HashMap<String, Value>,
}

impl RegisteredSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` under `id`, replacing any previous entry
    pub fn insert(&mut self, id: impl Into<String>, schema: Value) {
        self.schemas.insert(id.into(), schema);
    }

    /// Register `schema` under its own `$id`; returns false if it has none
    pub fn insert_by_id(&mut self, schema: Value) -> bool {
        match schema.get("$id").and_then(Value::as_str).map(str::to_string) {
            Some(id) => {
                self.insert(id, schema);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn get(&self, uri: &str) -> Option<&Value> {
        self.schemas
            .get(uri)
            .or_else(|| self.schemas.get(uri_path(uri)))
    }
}

impl Retrieve for RegisteredSchemas {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri = uri.as_str();
        match self.get(uri) {
            Some(schema) => {
                debug!(uri, "resolved registered schema");
                Ok(schema.clone())
            }
            None => Err(Box::new(ResolveError::RemoteDisabled {
                uri: uri.to_string(),
            })),
        }
    }
}

/// Retriever that serves the common schema set before anything else
#[derive(Clone)]
pub struct CommonRetriever {
    delegate: Arc<dyn Retrieve + Send + Sync>,
}

impl CommonRetriever {
    /// Common schemas first, then the given registered schemas
    pub fn new(registered: RegisteredSchemas) -> Self {
        Self {
            delegate: Arc::new(registered),
        }
    }

    /// Common schemas first, then an arbitrary delegate
    pub fn with_delegate(delegate: impl Retrieve + Send + Sync + 'static) -> Self {
        Self {
            delegate: Arc::new(delegate),
        }
    }

    /// Resolve against the common schema set only.
    ///
    /// `Ok(None)` means the URI is not a common identifier and should be
    /// delegated.
    pub fn resolve_common(uri: &str) -> Result<Option<&'static Value>, ResolveError> {
        match CommonSchemas::lookup(uri_path(uri)) {
            CommonLookup::Found(doc) => Ok(Some(doc)),
            CommonLookup::UnknownFragment => Err(ResolveError::UnknownFragment {
                uri: uri.to_string(),
                known: CommonSchemas::ids().join(", "),
            }),
            CommonLookup::NotCommon => Ok(None),
        }
    }
}

impl Default for CommonRetriever {
    fn default() -> Self {
        Self::new(RegisteredSchemas::default())
    }
}

impl fmt::Debug for CommonRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonRetriever").finish_non_exhaustive()
    }
}

impl Retrieve for CommonRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        match Self::resolve_common(uri.as_str())? {
            Some(doc) => {
                debug!(uri = uri.as_str(), "resolved common schema");
                Ok(doc.clone())
            }
            None => self.delegate.retrieve(uri),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::common::{BASE_ID, TEMPLATE_RECIPE_ID};
    use serde_json::json;

    #[test]
    fn test_uri_path() {
        assert_eq!(uri_path("/schemas/common/base"), "/schemas/common/base");
        assert_eq!(
            uri_path("json-schema:///schemas/common/base"),
            "/schemas/common/base"
        );
        assert_eq!(
            uri_path("https://example.com/schemas/common/base/text#/x"),
            "/schemas/common/base/text"
        );
        assert_eq!(uri_path("urn:example:thing"), "example:thing");
        assert_eq!(uri_path("https://example.com"), "");
    }

    #[test]
    fn test_resolve_common_prefers_builtin() {
        let base = CommonRetriever::resolve_common("json-schema:///schemas/common/base").unwrap();
        assert_eq!(base.unwrap()["$id"], BASE_ID);

        let recipe = CommonRetriever::resolve_common(TEMPLATE_RECIPE_ID).unwrap();
        assert_eq!(recipe.unwrap()["$id"], TEMPLATE_RECIPE_ID);

        let fragment = CommonRetriever::resolve_common("/schemas/common/base/text").unwrap();
        assert_eq!(fragment.unwrap()["minLength"], 2);
    }

    #[test]
    fn test_resolve_common_unknown_fragment_errors() {
        let err = CommonRetriever::resolve_common("/schemas/common/base/nope").unwrap_err();
        assert!(matches!(err, ResolveError::UnknownFragment { .. }));
        assert!(err.to_string().contains("/schemas/common/base/keyvalues"));
    }

    #[test]
    fn test_resolve_common_defers_other_uris() {
        assert_eq!(
            CommonRetriever::resolve_common("https://example.com/item.json").unwrap(),
            None
        );
    }

    #[test]
    fn test_registered_lookup_by_path() {
        let mut registered = RegisteredSchemas::new();
        assert!(registered.insert_by_id(json!({"$id": "/schemas/app/item", "type": "string"})));
        assert!(!registered.insert_by_id(json!({"type": "string"})));
        assert_eq!(registered.len(), 1);
        assert!(registered.get("json-schema:///schemas/app/item").is_some());
        assert!(registered.get("/schemas/app/other").is_none());
    }
}

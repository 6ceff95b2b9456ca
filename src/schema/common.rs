//! Built-in common schemas
//!
//! Shared schema fragments that other schemas reference by identifier
//! instead of embedding them. The set is fixed at compile time and built
//! once per process.
//!
//! Two identifiers are exposed:
//!
//! - [`BASE_ID`] (`/schemas/common/base`) holds the primitive fragments
//!   under `$defs`. Each fragment is also addressable as a standalone
//!   document at `/schemas/common/base/<name>`.
//! - [`TEMPLATE_RECIPE_ID`] (`/schemas/common/template_recipe`) is the
//!   composite recipe schema.

use serde_json::{json, Value};
use std::sync::LazyLock;

/// Meta-schema URI used by every built-in schema
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// Identifier of the base fragment collection
pub const BASE_ID: &str = "/schemas/common/base";

/// Identifier of the template recipe schema
pub const TEMPLATE_RECIPE_ID: &str = "/schemas/common/template_recipe";

/// Names of the fragments defined under the base schema's `$defs`
pub const BASE_FRAGMENTS: &[&str] = &[
    "python_template",
    "url_template",
    "s3_uri",
    "text",
    "keyvalues",
];

static BASE: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": DRAFT_2020_12,
        "$id": BASE_ID,
        "schema_version": "1.0",
        "description": "A base collection of shared JSON schemas representing common patterns and data structures used across applications",
        "$defs": {
            "python_template": {
                "type": "string",
                "format": "uri-template"
            },
            "url_template": {
                "type": "string",
                "pattern": r"^https?://[^\s]*$",
                "format": "uri-template"
            },
            "s3_uri": {
                "type": "string",
                "pattern": r"^s3://([\w.-]+/)*[\w.-]+\.yml$"
            },
            "text": {
                "type": "string",
                "minLength": 2
            },
            "keyvalues": {
                "description": "List of objects that have both a key string and a value. Useful for injecting both keys and values into a template.",
                "type": "array",
                "uniqueItems": true,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["key", "value"],
                    "properties": {
                        "key": { "type": "string", "minLength": 1 },
                        "value": { "type": "string" }
                    }
                }
            }
        }
    })
});

static TEMPLATE_RECIPE: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": DRAFT_2020_12,
        "$id": TEMPLATE_RECIPE_ID,
        "schema_version": "1.0",
        "description": "A template plus an array of key value pairs that are injected into the template",
        "type": "object",
        "additionalProperties": false,
        "required": ["template", "keyvalues"],
        "properties": {
            "template": { "$ref": "/schemas/common/base/url_template" },
            "keyvalues": { "$ref": "/schemas/common/base/keyvalues" }
        }
    })
});

/// Standalone documents for each base fragment, keyed by fragment name
static FRAGMENTS: LazyLock<Vec<(&'static str, Value)>> = LazyLock::new(|| {
    BASE_FRAGMENTS
        .iter()
        .filter_map(|name| {
            let def = BASE.get("$defs")?.get(*name)?;
            let mut doc = json!({ "$schema": DRAFT_2020_12 });
            if let (Some(doc_map), Some(def_map)) = (doc.as_object_mut(), def.as_object()) {
                doc_map.extend(def_map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some((*name, doc))
        })
        .collect()
});

/// What a common identifier resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonLookup {
    /// A built-in document
    Found(&'static Value),
    /// The identifier lies under the base path but names no fragment
    UnknownFragment,
    /// The identifier is not a common schema identifier at all
    NotCommon,
}

/// Read-only access to the common schema set
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonSchemas;

impl CommonSchemas {
    /// The base schema document with all fragments under `$defs`
    pub fn base() -> &'static Value {
        &BASE
    }

    /// The template recipe schema document
    pub fn template_recipe() -> &'static Value {
        &TEMPLATE_RECIPE
    }

    /// A base fragment as a standalone document
    pub fn fragment(name: &str) -> Option<&'static Value> {
        FRAGMENTS
            .iter()
            .find(|(fragment, _)| *fragment == name)
            .map(|(_, doc)| doc)
    }

    /// Every addressable identifier, base first
    pub fn ids() -> Vec<String> {
        let mut ids = vec![BASE_ID.to_string()];
        ids.extend(BASE_FRAGMENTS.iter().map(|name| format!("{BASE_ID}/{name}")));
        ids.push(TEMPLATE_RECIPE_ID.to_string());
        ids
    }

    /// Short names accepted by [`CommonSchemas::by_name`]
    pub fn names() -> Vec<&'static str> {
        let mut names = vec!["base", "template_recipe"];
        names.extend_from_slice(BASE_FRAGMENTS);
        names
    }

    /// Look up a schema by short name (`base`, `template_recipe`, or a fragment name)
    pub fn by_name(name: &str) -> Option<&'static Value> {
        match name {
            "base" => Some(Self::base()),
            "template_recipe" => Some(Self::template_recipe()),
            other => Self::fragment(other),
        }
    }

    /// Resolve an identifier path.
    ///
    /// The base path is checked first and claims every sub-path under it,
    /// so `/schemas/common/base/nope` never reaches any other resolver.
    pub fn lookup(path: &str) -> CommonLookup {
        let path = path.trim_end_matches('/');
        if let Some(rest) = path.strip_prefix(BASE_ID) {
            if rest.is_empty() {
                return CommonLookup::Found(Self::base());
            }
            if let Some(name) = rest.strip_prefix('/') {
                return match Self::fragment(name) {
                    Some(doc) => CommonLookup::Found(doc),
                    None => CommonLookup::UnknownFragment,
                };
            }
        }
        if path == TEMPLATE_RECIPE_ID {
            return CommonLookup::Found(Self::template_recipe());
        }
        CommonLookup::NotCommon
    }

    /// Resolve an identifier path to a document, if it names one
    pub fn get(path: &str) -> Option<&'static Value> {
        match Self::lookup(path) {
            CommonLookup::Found(doc) => Some(doc),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let ids = CommonSchemas::ids();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len());
        assert_eq!(ids.len(), BASE_FRAGMENTS.len() + 2);
    }

    #[test]
    fn test_lookup_base_and_recipe() {
        assert_eq!(CommonSchemas::get(BASE_ID), Some(CommonSchemas::base()));
        assert_eq!(
            CommonSchemas::get(TEMPLATE_RECIPE_ID),
            Some(CommonSchemas::template_recipe())
        );
        assert_eq!(CommonSchemas::base()["$id"], BASE_ID);
    }

    #[test]
    fn test_lookup_fragment_subpath() {
        let doc = CommonSchemas::get("/schemas/common/base/s3_uri").unwrap();
        assert_eq!(doc["type"], "string");
        assert_eq!(doc["$schema"], DRAFT_2020_12);
        assert!(doc.get("$id").is_none());
    }

    #[test]
    fn test_lookup_unknown_fragment_is_claimed_by_base() {
        assert_eq!(
            CommonSchemas::lookup("/schemas/common/base/nope"),
            CommonLookup::UnknownFragment
        );
        assert_eq!(
            CommonSchemas::lookup("/schemas/common/other"),
            CommonLookup::NotCommon
        );
        assert_eq!(
            CommonSchemas::lookup("/schemas/common/base_v2"),
            CommonLookup::NotCommon
        );
        // only an exact match selects the recipe
        assert_eq!(
            CommonSchemas::lookup("/schemas/common/template_recipe/x"),
            CommonLookup::NotCommon
        );
    }

    #[test]
    fn test_by_name() {
        for name in CommonSchemas::names() {
            assert!(CommonSchemas::by_name(name).is_some(), "{name}");
        }
        assert!(CommonSchemas::by_name("missing").is_none());
    }
}

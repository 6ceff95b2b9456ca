//! Shared helper functions for CLI commands

use std::path::Path;

use miette::{IntoDiagnostic, Result, WrapErr};
use serde_json::Value;

use crate::core::Config;
use crate::schema::{CommonSchemas, SchemaValidator, ValidatorBuilder};
use crate::templating::{KeyValue, KeyValues};
use crate::yaml::parse_document;

/// Parse `key=value` (clap value parser)
pub fn parse_key_value(s: &str) -> Result<KeyValue, String> {
    let (key, value) = split_pair(s)?;
    Ok(KeyValue::new(key, value))
}

/// Parse `key=v1,v2,...` (clap value parser)
pub fn parse_key_values(s: &str) -> Result<KeyValues, String> {
    let (key, values) = split_pair(s)?;
    Ok(KeyValues::new(key, values.split(',')))
}

fn split_pair(s: &str) -> Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        Some(_) => Err(format!("empty key in '{}'", s)),
        None => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// Read and parse a YAML or JSON file, returning the source alongside
pub fn read_document(path: &Path) -> Result<(String, Value)> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read {}", path.display()))?;
    let value = parse_document(&content, &path.display().to_string())?;
    Ok((content, value))
}

/// A common schema by identifier or short name, or a schema file
pub fn resolve_schema(arg: &str) -> Result<Value> {
    if let Some(schema) = CommonSchemas::get(arg).or_else(|| CommonSchemas::by_name(arg)) {
        return Ok(schema.clone());
    }
    let path = Path::new(arg);
    if !path.exists() {
        return Err(miette::miette!(
            help = format!("known common schemas: {}", CommonSchemas::names().join(", ")),
            "'{}' is neither a common schema nor a file",
            arg
        ));
    }
    read_document(path).map(|(_, schema)| schema)
}

/// Build a validator honouring the configured schema directories
pub fn schema_validator(schema: Value, config: &Config) -> Result<SchemaValidator> {
    let validator = ValidatorBuilder::new(schema)
        .with_registered(config.registered_schemas()?)
        .validate_formats(config.validate_formats())
        .build();
    validator.compile()?;
    Ok(validator)
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("api=get_data").unwrap(),
            KeyValue::new("api", "get_data")
        );
        assert_eq!(
            parse_key_value("q=a=b").unwrap(),
            KeyValue::new("q", "a=b")
        );
        assert_eq!(parse_key_value("empty=").unwrap(), KeyValue::new("empty", ""));
        assert!(parse_key_value("=x").is_err());
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn test_parse_key_values() {
        assert_eq!(
            parse_key_values("version=1,2").unwrap(),
            KeyValues::new("version", ["1", "2"])
        );
    }

    #[test]
    fn test_resolve_schema_common() {
        assert_eq!(
            resolve_schema("template_recipe").unwrap(),
            *CommonSchemas::template_recipe()
        );
        assert_eq!(
            resolve_schema("/schemas/common/base/text").unwrap()["minLength"],
            2
        );
        assert!(resolve_schema("/definitely/not/here.json").is_err());
    }

    #[test]
    fn test_schema_validator_honours_skip_formats() {
        let schema = serde_json::json!({"$ref": "/schemas/common/base/python_template"});
        let malformed = serde_json::json!("x{a");

        let strict = schema_validator(schema.clone(), &Config::default()).unwrap();
        assert!(!strict.is_valid(&malformed).unwrap());

        let config = Config {
            skip_formats: Some(true),
            ..Config::default()
        };
        let lenient = schema_validator(schema, &config).unwrap();
        assert!(lenient.is_valid(&malformed).unwrap());
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a longer description", 10), "a longe...");
    }
}

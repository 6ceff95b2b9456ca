//! Schema validation with detailed error reporting

use std::fmt;
use std::sync::OnceLock;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Retrieve, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

use crate::schema::resolver::{CommonRetriever, RegisteredSchemas};
use crate::yaml::{parse_document, span_for_pointer, YamlSyntaxError};

/// Errors raised while building or applying a schema validator
#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    /// The candidate document violates the schema
    #[error("schema validation failed ({}):\n{violations}", .violations.summary())]
    #[diagnostic(code(recipekit::schema::validation))]
    Validation { violations: Violations },

    /// Like [`SchemaError::Validation`], located in the document source
    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    /// A `$ref` points at something that is neither common, registered,
    /// nor retrievable
    #[error("cannot resolve schema reference: {reason}")]
    #[diagnostic(
        code(recipekit::schema::reference),
        help("common schemas live under /schemas/common/base/<name> and /schemas/common/template_recipe")
    )]
    Reference { reason: String },

    /// The root schema itself is malformed
    #[error("invalid schema: {reason}")]
    #[diagnostic(code(recipekit::schema::invalid))]
    InvalidSchema { reason: String },

    /// The candidate document is not parseable
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),
}

impl SchemaError {
    /// Violations carried by this error, if it is a validation failure
    pub fn violations(&self) -> &[Violation] {
        match self {
            SchemaError::Validation { violations } => violations.as_slice(),
            SchemaError::Document(doc) => doc.violations.as_slice(),
            _ => &[],
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, SchemaError::Reference { .. })
    }
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending value; empty for the document root
    pub instance_path: String,
    /// JSON pointer to the schema keyword that failed
    pub schema_path: String,
    /// The violated keyword, e.g. `pattern` or `additionalProperties`
    pub rule: String,
    pub message: String,
    pub help: Option<String>,
}

impl Violation {
    fn from_error(error: &JsonSchemaError) -> Self {
        let schema_path = error.schema_path.to_string();
        let rule = schema_path
            .rsplit('/')
            .find(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
            .unwrap_or("schema")
            .to_string();

        Self {
            instance_path: error.instance_path.to_string(),
            schema_path,
            rule,
            message: format_schema_error(error),
            help: generate_help_message(error),
        }
    }

    fn location(&self) -> &str {
        if self.instance_path.is_empty() {
            "(root)"
        } else {
            &self.instance_path
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {} [{}]: {}", self.location(), self.rule, self.message)
    }
}

/// Collection of validation violations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }

    fn summary(&self) -> String {
        if self.0.len() == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", self.0.len())
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Validation failure pointing into the document source
#[derive(Debug, Error, Diagnostic)]
#[error("{filename}: schema validation failed ({summary})")]
#[diagnostic(code(recipekit::schema::validation))]
pub struct DocumentError {
    summary: String,
    filename: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    labels: Vec<LocatedViolation>,

    violations: Violations,
}

impl DocumentError {
    fn new(filename: &str, source: &str, violations: Violations) -> Self {
        let labels = violations
            .as_slice()
            .iter()
            .map(|v| LocatedViolation {
                span: span_for_pointer(source, &v.instance_path),
                message: v.message.clone(),
                hint: v.rule.clone(),
                help: v.help.clone(),
            })
            .collect();

        Self {
            summary: violations.summary(),
            filename: filename.to_string(),
            src: NamedSource::new(filename, source.to_string()),
            labels,
            violations,
        }
    }

    pub fn violations(&self) -> &[Violation] {
        self.violations.as_slice()
    }
}

/// A violation with its source label
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct LocatedViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

/// Builder for a [`SchemaValidator`].
///
/// References to the common schema set always resolve locally. Anything
/// else goes to the schemas registered here, or to a custom retriever.
pub struct ValidatorBuilder {
    root: JsonValue,
    registered: RegisteredSchemas,
    retriever: Option<CommonRetriever>,
    validate_formats: bool,
}

impl ValidatorBuilder {
    pub fn new(root_schema: JsonValue) -> Self {
        Self {
            root: root_schema,
            registered: RegisteredSchemas::new(),
            retriever: None,
            validate_formats: true,
        }
    }

    /// Make `schema` resolvable as `id`
    pub fn with_schema(mut self, id: impl Into<String>, schema: JsonValue) -> Self {
        self.registered.insert(id, schema);
        self
    }

    /// Make every schema in `registered` resolvable
    pub fn with_registered(mut self, registered: RegisteredSchemas) -> Self {
        self.registered = registered;
        self
    }

    /// Replace the fallback for non-common references.
    ///
    /// Registered schemas are ignored once a custom retriever is set.
    pub fn with_retriever(mut self, retriever: impl Retrieve + Send + Sync + 'static) -> Self {
        self.retriever = Some(CommonRetriever::with_delegate(retriever));
        self
    }

    /// Toggle `format` assertions (on by default)
    pub fn validate_formats(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    pub fn build(self) -> SchemaValidator {
        let retriever = self
            .retriever
            .unwrap_or_else(|| CommonRetriever::new(self.registered));
        SchemaValidator {
            root: self.root,
            retriever,
            validate_formats: self.validate_formats,
            compiled: OnceLock::new(),
        }
    }
}

/// Build a validator for `root_schema` with common schema resolution.
///
/// Nothing is checked here. Schema problems and unresolvable references
/// surface from the first call to [`SchemaValidator::validate`].
pub fn build_validator(root_schema: JsonValue) -> SchemaValidator {
    ValidatorBuilder::new(root_schema).build()
}

/// Why the root schema failed to compile
#[derive(Debug, Clone)]
enum CompileFailure {
    Reference(String),
    Invalid(String),
}

impl From<&CompileFailure> for SchemaError {
    fn from(failure: &CompileFailure) -> Self {
        match failure {
            CompileFailure::Reference(reason) => SchemaError::Reference {
                reason: reason.clone(),
            },
            CompileFailure::Invalid(reason) => SchemaError::InvalidSchema {
                reason: reason.clone(),
            },
        }
    }
}

/// Validator bound to one root schema and its reference resolver
pub struct SchemaValidator {
    root: JsonValue,
    retriever: CommonRetriever,
    validate_formats: bool,
    compiled: OnceLock<Result<JsonValidator, CompileFailure>>,
}

impl SchemaValidator {
    /// The root schema this validator is bound to
    pub fn schema(&self) -> &JsonValue {
        &self.root
    }

    /// Compile the root schema now instead of on first validation
    pub fn compile(&self) -> Result<(), SchemaError> {
        self.compiled().map(|_| ())
    }

    fn compiled(&self) -> Result<&JsonValidator, SchemaError> {
        self.compiled
            .get_or_init(|| {
                let mut opts = jsonschema::options();
                opts.with_draft(jsonschema::Draft::Draft202012);
                opts.should_validate_formats(self.validate_formats);
                opts.with_retriever(self.retriever.clone());

                opts.build(&self.root).map_err(|e| {
                    debug!(error = %e, "schema compilation failed");
                    match &e.kind {
                        ValidationErrorKind::Referencing(err) => {
                            CompileFailure::Reference(error_chain(err))
                        }
                        _ => CompileFailure::Invalid(e.to_string()),
                    }
                })
            })
            .as_ref()
            .map_err(SchemaError::from)
    }

    /// Validate a document, collecting every violation
    pub fn validate(&self, document: &JsonValue) -> Result<(), SchemaError> {
        let violations = self.violations(document)?;
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Validation { violations })
        }
    }

    /// Whether the document satisfies the schema
    pub fn is_valid(&self, document: &JsonValue) -> Result<bool, SchemaError> {
        Ok(self.compiled()?.is_valid(document))
    }

    /// All violations of `document`; empty when it is valid
    pub fn violations(&self, document: &JsonValue) -> Result<Violations, SchemaError> {
        let validator = self.compiled()?;
        let violations: Vec<Violation> = validator
            .iter_errors(document)
            .map(|e| Violation::from_error(&e))
            .collect();
        debug!(count = violations.len(), "validated document");
        Ok(Violations(violations))
    }

    /// Parse YAML or JSON content and validate it.
    ///
    /// Violations are reported against spans of `content`.
    pub fn validate_yaml(&self, content: &str, filename: &str) -> Result<JsonValue, SchemaError> {
        let document = parse_document(content, filename)?;
        let violations = self.violations(&document)?;
        if violations.is_empty() {
            Ok(document)
        } else {
            Err(DocumentError::new(filename, content, violations).into())
        }
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("root", &self.root)
            .field("validate_formats", &self.validate_formats)
            .field("compiled", &self.compiled.get().map(|c| c.is_ok()))
            .finish()
    }
}

/// Render an error and its sources as one line
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// Format a JSON Schema error into a user-friendly message
fn format_schema_error(error: &JsonSchemaError) -> String {
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let prop = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            format!("missing required field '{}'", prop)
        }
        ValidationErrorKind::Type { kind } => format!("wrong type: expected {:?}", kind),
        ValidationErrorKind::Pattern { pattern } => {
            format!("{} doesn't match pattern {}", error.instance, pattern)
        }
        ValidationErrorKind::MinLength { limit } => {
            format!("{} is too short: minimum {} characters", error.instance, limit)
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            format!("unknown field(s): {}", unexpected.join(", "))
        }
        ValidationErrorKind::Format { format } => {
            format!("{} is not a valid {}", error.instance, format)
        }
        ValidationErrorKind::UniqueItems => "array items are not unique".to_string(),
        _ => error.to_string(),
    }
}

/// Suggestions for fixing the error
fn generate_help_message(error: &JsonSchemaError) -> Option<String> {
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let prop = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            Some(format!("Add the '{}' field", prop))
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            if unexpected.len() == 1 {
                Some(format!("Remove the '{}' field or check spelling", unexpected[0]))
            } else {
                Some("Remove unknown fields or check spelling".to_string())
            }
        }
        ValidationErrorKind::Pattern { pattern } if pattern.starts_with("^s3:") => {
            Some("Expected s3://<bucket>/<path>/<file>.yml".to_string())
        }
        ValidationErrorKind::Pattern { pattern } if pattern.starts_with("^https?:") => {
            Some("Expected an http(s) URL without whitespace".to_string())
        }
        ValidationErrorKind::Type { kind } => Some(format!("Expected value of type: {:?}", kind)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::common::{CommonSchemas, DRAFT_2020_12, TEMPLATE_RECIPE_ID};
    use serde_json::json;

    fn ref_schema(reference: &str) -> JsonValue {
        json!({
            "$schema": DRAFT_2020_12,
            "type": "object",
            "properties": {
                "prop0": { "$ref": reference }
            }
        })
    }

    #[test]
    fn test_additional_properties_false_rejects_extra_keys() {
        let validator = build_validator(json!({
            "$schema": DRAFT_2020_12,
            "additionalProperties": false
        }));

        let err = validator.validate(&json!({"hi": "test"})).unwrap_err();
        let violations = err.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "additionalProperties");
        assert!(violations[0].message.contains("hi"));
        assert!(validator.validate(&json!({})).is_ok());
    }

    #[test]
    fn test_s3_uri_fragment_by_subpath() {
        let validator = build_validator(ref_schema("/schemas/common/base/s3_uri"));

        assert!(validator
            .validate(&json!({"prop0": "s3://bucket/path/file.yml"}))
            .is_ok());

        let err = validator
            .validate(&json!({"prop0": "https://host/"}))
            .unwrap_err();
        let violation = &err.violations()[0];
        assert_eq!(violation.instance_path, "/prop0");
        assert_eq!(violation.rule, "pattern");
    }

    #[test]
    fn test_s3_uri_fragment_by_pointer_into_base() {
        let validator = build_validator(ref_schema("/schemas/common/base#/$defs/s3_uri"));
        assert!(validator
            .validate(&json!({"prop0": "s3://bucket/file.yml"}))
            .is_ok());
        assert!(!validator.is_valid(&json!({"prop0": "s3://bucket/file.yaml"})).unwrap());
    }

    #[test]
    fn test_text_fragment_min_length() {
        let validator = build_validator(ref_schema("/schemas/common/base/text"));
        assert!(validator.is_valid(&json!({"prop0": "ok"})).unwrap());
        let err = validator.validate(&json!({"prop0": "x"})).unwrap_err();
        assert_eq!(err.violations()[0].rule, "minLength");
    }

    #[test]
    fn test_python_template_format_is_asserted() {
        let validator = build_validator(ref_schema("/schemas/common/base/python_template"));
        assert!(validator
            .is_valid(&json!({"prop0": "https://host/{api}/data.json"}))
            .unwrap());

        let err = validator.validate(&json!({"prop0": "x{a"})).unwrap_err();
        let violations = match err {
            SchemaError::Validation { violations } => violations.into_inner(),
            other => panic!("unexpected error: {other}"),
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].instance_path, "/prop0");
        assert_eq!(violations[0].rule, "format");
    }

    #[test]
    fn test_format_assertions_can_be_disabled() {
        let schema = ref_schema("/schemas/common/base/python_template");
        let validator = ValidatorBuilder::new(schema.clone())
            .validate_formats(false)
            .build();
        assert_eq!(validator.schema(), &schema);
        assert!(validator.validate(&json!({"prop0": "x{a"})).is_ok());
    }

    #[test]
    fn test_unknown_base_subpath_is_reference_error() {
        let validator = build_validator(ref_schema("/schemas/common/base/does_not_exist"));
        let err = validator.validate(&json!({"prop0": "x"})).unwrap_err();
        assert!(err.is_reference(), "unexpected error: {err}");
        // the failure is cached, not re-attempted differently
        assert!(validator.compile().unwrap_err().is_reference());
    }

    #[test]
    fn test_unregistered_remote_reference_is_reference_error() {
        let validator = build_validator(ref_schema("https://example.com/schemas/item.json"));
        let err = validator.compile().unwrap_err();
        assert!(err.is_reference());
        assert!(err.to_string().contains("remote resolution is disabled"));
    }

    #[test]
    fn test_registered_schema_resolves() {
        let validator = ValidatorBuilder::new(ref_schema("https://example.com/schemas/item.json"))
            .with_schema(
                "https://example.com/schemas/item.json",
                json!({"$schema": DRAFT_2020_12, "type": "integer"}),
            )
            .build();

        assert!(validator.is_valid(&json!({"prop0": 3})).unwrap());
        assert!(!validator.is_valid(&json!({"prop0": "3"})).unwrap());
    }

    #[test]
    fn test_template_recipe_schema() {
        let validator = build_validator(CommonSchemas::template_recipe().clone());

        let recipe = json!({
            "template": "https://host/{api}/{version}/data.json",
            "keyvalues": [
                {"key": "api", "value": "get_data"},
                {"key": "version", "value": "1.0"}
            ]
        });
        assert!(validator.validate(&recipe).is_ok());

        let bad_key = json!({
            "template": "https://host/{api}",
            "keyvalues": [{"key": "", "value": "x", "extra": 1}]
        });
        let err = validator.validate(&bad_key).unwrap_err();
        let rules: Vec<&str> = err.violations().iter().map(|v| v.rule.as_str()).collect();
        assert!(rules.contains(&"minLength"), "{rules:?}");
        assert!(rules.contains(&"additionalProperties"), "{rules:?}");
    }

    #[test]
    fn test_template_recipe_by_reference() {
        let validator = build_validator(ref_schema(TEMPLATE_RECIPE_ID));
        let err = validator
            .validate(&json!({"prop0": {"template": "ftp://host/{a}", "keyvalues": []}}))
            .unwrap_err();
        assert_eq!(err.violations()[0].instance_path, "/prop0/template");
    }

    #[test]
    fn test_keyvalues_unique_items() {
        let validator = build_validator(ref_schema("/schemas/common/base/keyvalues"));
        let duplicate = json!({"prop0": [
            {"key": "a", "value": "1"},
            {"key": "a", "value": "1"}
        ]});
        assert!(!validator.is_valid(&duplicate).unwrap());

        // same key, different value is not caught by uniqueItems
        let differing = json!({"prop0": [
            {"key": "a", "value": "1"},
            {"key": "a", "value": "2"}
        ]});
        assert!(validator.is_valid(&differing).unwrap());
    }

    #[test]
    fn test_validate_yaml_locates_violation() {
        let validator = build_validator(CommonSchemas::template_recipe().clone());
        let content = "template: \"https://host/{api}\"\nkeyvalues:\n  - key: api\n    value: v1\n    colour: red\n";

        let err = validator.validate_yaml(content, "recipe.yml").unwrap_err();
        match err {
            SchemaError::Document(doc) => {
                assert_eq!(doc.violations().len(), 1);
                assert_eq!(doc.violations()[0].instance_path, "/keyvalues/0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_yaml_syntax_error() {
        let validator = build_validator(json!({"$schema": DRAFT_2020_12}));
        let err = validator.validate_yaml("a: [1, 2\n", "bad.yml").unwrap_err();
        assert!(matches!(err, SchemaError::Syntax(_)));
    }

    #[test]
    fn test_validate_yaml_returns_document() {
        let validator = build_validator(json!({"$schema": DRAFT_2020_12, "type": "object"}));
        let doc = validator.validate_yaml("a: 1\n", "ok.yml").unwrap();
        assert_eq!(doc, json!({"a": 1}));
    }
}

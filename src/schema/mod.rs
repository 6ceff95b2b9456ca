//! Schema system - common schemas, reference resolution and validation

pub mod common;
pub mod resolver;
pub mod validator;

pub use common::{CommonSchemas, BASE_ID, TEMPLATE_RECIPE_ID};
pub use resolver::{CommonRetriever, RegisteredSchemas, ResolveError};
pub use validator::{
    build_validator, DocumentError, SchemaError, SchemaValidator, ValidatorBuilder, Violation,
    Violations,
};

//! Recipe Kit
//!
//! JSON Schema validation backed by a built-in set of common schemas,
//! template recipes that inject key/value pairs into `{placeholder}`
//! strings, and small formatting helpers for terminal output.

pub mod cli;
pub mod core;
pub mod formatting;
pub mod schema;
pub mod templating;
pub mod yaml;

//! Command implementations

pub mod compact;
pub mod completions;
pub mod expand;
pub mod inject;
pub mod schema;
pub mod validate;

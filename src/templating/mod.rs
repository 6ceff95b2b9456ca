//! Template recipes - placeholder parsing and injection

pub mod cartesian;
pub mod injection;
pub mod placeholder;

#[allow(deprecated)]
pub use cartesian::{CartesianInjector, Expansions, KeyValues};
pub use injection::{construct_string, KeyValue, MismatchCause, Recipe, RecipeError, RecipeInjector};
pub use placeholder::{Segment, SyntaxErrorKind, Template, TemplateSyntaxError};

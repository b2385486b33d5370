//! Configuration documents for the session factory pipeline
//!
//! This crate parses YAML configuration text into a resolved
//! [`Configuration`], resolving `${...}` placeholders against in-source
//! properties and caller overrides, selecting one environment and validating
//! the result.

pub mod loader;
pub mod parser;
pub mod properties;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, OVERRIDE_ENV_PREFIX};
pub use parser::YamlConfigParser;
pub use properties::PropertyResolver;
pub use schema::*;
pub use validation::*;

//! Shared types for the session factory pipeline
//!
//! This crate contains the error taxonomy, the per-call diagnostic context and
//! small helpers used by the configuration parser, the builder and the CLI.

pub mod diagnostics;
pub mod error;
pub mod utils;

use std::collections::BTreeMap;

// Re-export commonly used types
pub use diagnostics::ErrorContext;
pub use error::{
    wrap_error, BoxError, ConstructionError, ParseError, Result, SessionFactoryError,
    BUILD_ERROR_MESSAGE,
};

/// Caller-supplied property overrides, keyed by property name
pub type Properties = BTreeMap<String, String>;

//! Session factory construction
//!
//! This crate turns a configuration source (a character or byte stream) or an
//! already-parsed configuration into a session factory. The builder owns the
//! source for the duration of one call and guarantees it is closed and the
//! diagnostic context is reset on every exit path.

pub mod builder;
pub mod factory;
pub mod parser;
pub mod source;

pub use builder::SessionFactoryBuilder;
pub use factory::{DefaultConstructor, DefaultSessionFactory, FactoryConstructor, FactorySummary};
pub use parser::ConfigurationParser;
pub use source::{ConfigStream, ConfigurationSource, ReaderStream, SourceKind};

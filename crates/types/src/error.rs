//! Error types for the session factory pipeline

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Message carried by every error raised from a failed build
pub const BUILD_ERROR_MESSAGE: &str = "error building session factory";

/// Boxed cause retained by [`SessionFactoryError`]
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type alias for session factory builds
pub type Result<T> = std::result::Result<T, SessionFactoryError>;

/// Configuration parsing errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// Reading the configuration source failed
    #[error("Failed to read configuration source {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    /// The source contained no configuration
    #[error("Configuration source {resource} is empty")]
    Empty { resource: String },

    /// The document is not valid YAML or has the wrong shape
    #[error("Configuration syntax error in {resource}: {message}")]
    Syntax { resource: String, message: String },

    /// Environments are declared but none was requested and no default is set
    #[error("No environment specified and no default_environment declared")]
    MissingEnvironment,

    /// The requested environment is not declared
    #[error("Unknown environment: {id}")]
    UnknownEnvironment { id: String },

    /// A resolved value could not be converted to its target type
    #[error("Invalid configuration value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// The resolved configuration failed validation
    #[error("Configuration validation failed: {}", .issues.join("; "))]
    Validation { issues: Vec<String> },
}

/// Session factory construction errors
#[derive(Error, Debug)]
pub enum ConstructionError {
    /// The constructor refused the configuration
    #[error("Session factory construction rejected: {reason}")]
    Rejected { reason: String },
}

/// The single error kind reported by a failed build
///
/// Carries a fixed message, an optional rendering of the diagnostic
/// breadcrumbs captured before the context was reset, and the original cause.
#[derive(Debug)]
pub struct SessionFactoryError {
    message: String,
    context: Option<String>,
    cause: BoxError,
}

impl SessionFactoryError {
    /// Attach a diagnostic snapshot
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Diagnostic breadcrumbs recorded during the failed attempt
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// The wrapped original error
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// Whether the wrapped cause is a [`ParseError`]
    pub fn is_parse_error(&self) -> bool {
        self.cause.is::<ParseError>()
    }

    /// Whether the wrapped cause is a [`ConstructionError`]
    pub fn is_construction_error(&self) -> bool {
        self.cause.is::<ConstructionError>()
    }

    /// Recover the original cause
    pub fn into_cause(self) -> BoxError {
        self.cause
    }
}

impl fmt::Display for SessionFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.message, self.cause)?;
        if let Some(context) = &self.context {
            write!(f, "\n{context}")?;
        }
        Ok(())
    }
}

impl StdError for SessionFactoryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Wrap any failure into a [`SessionFactoryError`], keeping it as the cause
pub fn wrap_error(message: impl Into<String>, cause: impl Into<BoxError>) -> SessionFactoryError {
    SessionFactoryError {
        message: message.into(),
        context: None,
        cause: cause.into(),
    }
}

impl From<ParseError> for SessionFactoryError {
    fn from(err: ParseError) -> Self {
        wrap_error(BUILD_ERROR_MESSAGE, err)
    }
}

impl From<ConstructionError> for SessionFactoryError {
    fn from(err: ConstructionError) -> Self {
        wrap_error(BUILD_ERROR_MESSAGE, err)
    }
}

//! Session factory builder
//!
//! Every entry point funnels into [`SessionFactoryBuilder::build_in`], which
//! parses the source, constructs a factory, then unconditionally resets the
//! diagnostic context and closes the source before reporting the outcome.
//! A failure to close never replaces an earlier error and never fails an
//! otherwise successful build.

use crate::factory::{DefaultConstructor, FactoryConstructor};
use crate::parser::ConfigurationParser;
use crate::source::ConfigurationSource;
use config::{Configuration, YamlConfigParser};
use std::io::Read;
use tracing::{debug, info, info_span, warn};
use types::utils::generate_build_id;
use types::{wrap_error, BoxError, ErrorContext, Properties, Result, BUILD_ERROR_MESSAGE};

const READER_DESCRIPTION: &str = "<reader>";
const BYTES_DESCRIPTION: &str = "<bytes>";

/// Builds session factories from configuration sources
#[derive(Debug, Clone, Default)]
pub struct SessionFactoryBuilder<P = YamlConfigParser, C = DefaultConstructor> {
    parser: P,
    constructor: C,
}

impl SessionFactoryBuilder {
    /// Builder using the YAML parser and the default factory
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P, C> SessionFactoryBuilder<P, C>
where
    P: ConfigurationParser,
    C: FactoryConstructor,
{
    /// Builder with a custom parser and constructor
    pub fn with_parts(parser: P, constructor: C) -> Self {
        Self {
            parser,
            constructor,
        }
    }

    /// Build from a source using a fresh diagnostic context
    pub fn build(
        &self,
        source: ConfigurationSource,
        environment: Option<&str>,
        overrides: Option<&Properties>,
    ) -> Result<C::Factory> {
        let mut ctx = ErrorContext::new();
        self.build_in(source, environment, overrides, &mut ctx)
    }

    /// Build from a source, recording diagnostics in `ctx`
    ///
    /// `ctx` is empty when this returns and `source` has been closed exactly
    /// once, whatever the outcome.
    pub fn build_in(
        &self,
        mut source: ConfigurationSource,
        environment: Option<&str>,
        overrides: Option<&Properties>,
        ctx: &mut ErrorContext,
    ) -> Result<C::Factory> {
        let build_id = generate_build_id();
        let span = info_span!(
            "build_session_factory",
            %build_id,
            source = %source.description(),
            environment = environment.unwrap_or("<default>"),
        );
        let _guard = span.enter();

        let outcome = self.parse_and_construct(&mut source, environment, overrides, ctx);

        let diagnostics = if outcome.is_err() { ctx.snapshot() } else { None };
        ctx.reset();

        if let Err(e) = source.close() {
            warn!(error = %e, "Failed to close configuration source");
        }

        match outcome {
            Ok(factory) => {
                info!("Session factory built");
                Ok(factory)
            }
            Err(cause) => {
                warn!(error = %cause, "Session factory build failed");
                Err(wrap_error(BUILD_ERROR_MESSAGE, cause).with_context(diagnostics))
            }
        }
    }

    /// Construct a factory from an already-parsed configuration
    ///
    /// No source is involved and no diagnostic context is used.
    pub fn build_from_configuration(&self, config: Configuration) -> Result<C::Factory> {
        self.constructor
            .construct(config)
            .map_err(|e| wrap_error(BUILD_ERROR_MESSAGE, e))
    }

    pub fn build_from_reader<R>(&self, reader: R) -> Result<C::Factory>
    where
        R: Read + Send + 'static,
    {
        self.build(ConfigurationSource::characters(READER_DESCRIPTION, reader), None, None)
    }

    pub fn build_from_reader_with_environment<R>(
        &self,
        reader: R,
        environment: &str,
    ) -> Result<C::Factory>
    where
        R: Read + Send + 'static,
    {
        self.build(
            ConfigurationSource::characters(READER_DESCRIPTION, reader),
            Some(environment),
            None,
        )
    }

    pub fn build_from_reader_with_properties<R>(
        &self,
        reader: R,
        overrides: &Properties,
    ) -> Result<C::Factory>
    where
        R: Read + Send + 'static,
    {
        self.build(
            ConfigurationSource::characters(READER_DESCRIPTION, reader),
            None,
            Some(overrides),
        )
    }

    pub fn build_from_bytes<R>(&self, reader: R) -> Result<C::Factory>
    where
        R: Read + Send + 'static,
    {
        self.build(ConfigurationSource::bytes(BYTES_DESCRIPTION, reader), None, None)
    }

    pub fn build_from_bytes_with_environment<R>(
        &self,
        reader: R,
        environment: &str,
    ) -> Result<C::Factory>
    where
        R: Read + Send + 'static,
    {
        self.build(
            ConfigurationSource::bytes(BYTES_DESCRIPTION, reader),
            Some(environment),
            None,
        )
    }

    pub fn build_from_bytes_with_properties<R>(
        &self,
        reader: R,
        overrides: &Properties,
    ) -> Result<C::Factory>
    where
        R: Read + Send + 'static,
    {
        self.build(
            ConfigurationSource::bytes(BYTES_DESCRIPTION, reader),
            None,
            Some(overrides),
        )
    }

    fn parse_and_construct(
        &self,
        source: &mut ConfigurationSource,
        environment: Option<&str>,
        overrides: Option<&Properties>,
        ctx: &mut ErrorContext,
    ) -> std::result::Result<C::Factory, BoxError> {
        debug!("Parsing configuration");
        let config = self.parser.parse(source, environment, overrides, ctx)?;

        debug!(
            environment = config.environment_id().unwrap_or("<none>"),
            "Constructing session factory"
        );
        ctx.activity("constructing session factory");
        let factory = self.constructor.construct(config)?;

        Ok(factory)
    }
}

//! Seam between the builder and the configuration parser

use crate::source::ConfigurationSource;
use config::{Configuration, YamlConfigParser};
use types::{ErrorContext, ParseError, Properties};

/// Turns a configuration source into a resolved [`Configuration`]
///
/// Implementations read the source but never close it; the builder owns
/// release. Breadcrumbs go into `ctx`.
pub trait ConfigurationParser: Send + Sync {
    fn parse(
        &self,
        source: &mut ConfigurationSource,
        environment: Option<&str>,
        overrides: Option<&Properties>,
        ctx: &mut ErrorContext,
    ) -> Result<Configuration, ParseError>;
}

impl ConfigurationParser for YamlConfigParser {
    fn parse(
        &self,
        source: &mut ConfigurationSource,
        environment: Option<&str>,
        overrides: Option<&Properties>,
        ctx: &mut ErrorContext,
    ) -> Result<Configuration, ParseError> {
        let resource = source.description().to_string();
        ctx.resource(resource.as_str()).activity("reading configuration source");

        let text = source.read_to_text()?;
        self.parse_str(&text, &resource, environment, overrides, ctx)
    }
}

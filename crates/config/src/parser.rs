//! YAML configuration parser
//!
//! Turns configuration text into a resolved [`Configuration`]:
//!
//! 1. the `properties` block is read and caller overrides are laid on top,
//! 2. `${...}` placeholders are substituted everywhere else,
//! 3. the typed document is read and one environment is selected,
//! 4. the result is validated.
//!
//! Progress is recorded in the caller's [`ErrorContext`] so a failure can say
//! where it happened.

use crate::properties::{flatten_properties, PropertyResolver};
use crate::schema::{ConfigDocument, Configuration, Environment};
use crate::validation::ConfigValidator;
use serde_yaml::Value;
use tracing::{debug, warn};
use types::{ErrorContext, ParseError, Properties};

const PROPERTIES_KEY: &str = "properties";

/// Parser for YAML configuration documents
#[derive(Debug, Clone, Default)]
pub struct YamlConfigParser;

impl YamlConfigParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse configuration text read from `resource`, rejecting it when
    /// validation reports errors
    pub fn parse_str(
        &self,
        text: &str,
        resource: &str,
        environment: Option<&str>,
        overrides: Option<&Properties>,
        ctx: &mut ErrorContext,
    ) -> Result<Configuration, ParseError> {
        let config = self.resolve_str(text, resource, environment, overrides, ctx)?;

        ctx.activity("validating configuration");
        let report = ConfigValidator::validate(&config);
        for warning in &report.warnings {
            warn!(%resource, field = %warning.field, "{}", warning.message);
        }
        if report.has_errors() {
            return Err(ParseError::Validation {
                issues: report.error_messages(),
            });
        }

        debug!(
            %resource,
            environment = config.environment_id().unwrap_or("<none>"),
            "Configuration parsed"
        );
        Ok(config)
    }

    /// Steps 1-3 of [`parse_str`](Self::parse_str): the configuration is
    /// resolved but not validated
    pub fn resolve_str(
        &self,
        text: &str,
        resource: &str,
        environment: Option<&str>,
        overrides: Option<&Properties>,
        ctx: &mut ErrorContext,
    ) -> Result<Configuration, ParseError> {
        ctx.resource(resource).activity("parsing configuration");

        if text.trim().is_empty() {
            return Err(ParseError::Empty {
                resource: resource.to_string(),
            });
        }

        let mut root: Value = serde_yaml::from_str(text).map_err(|e| ParseError::Syntax {
            resource: resource.to_string(),
            message: e.to_string(),
        })?;

        ctx.activity("loading properties");
        let mapping = root.as_mapping_mut().ok_or_else(|| ParseError::Syntax {
            resource: resource.to_string(),
            message: "top level must be a mapping".to_string(),
        })?;
        let in_source = mapping.remove(PROPERTIES_KEY).unwrap_or(Value::Null);
        let mut variables = flatten_properties(in_source).map_err(|message| {
            ParseError::InvalidValue {
                field: PROPERTIES_KEY.to_string(),
                message,
            }
        })?;
        if let Some(overrides) = overrides {
            debug!(count = overrides.len(), "Applying property overrides");
            variables.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        ctx.activity("resolving placeholders");
        let unresolved = PropertyResolver::new(&variables).resolve_tree(&mut root);
        for placeholder in &unresolved {
            warn!(%resource, %placeholder, "Unresolved placeholder left in configuration");
            ctx.note(format!("Unresolved placeholder ${{{placeholder}}}"));
        }

        ctx.activity("reading configuration document");
        let document: ConfigDocument =
            serde_yaml::from_value(root).map_err(|e| ParseError::Syntax {
                resource: resource.to_string(),
                message: e.to_string(),
            })?;

        ctx.activity("selecting environment");
        let environment = Self::select_environment(&document, environment, ctx)?;

        Ok(Configuration::from_parts(
            environment,
            variables,
            document.settings,
            document.type_aliases,
            document.mappers,
        ))
    }

    /// Pick the requested environment, falling back to `default_environment`
    fn select_environment(
        document: &ConfigDocument,
        requested: Option<&str>,
        ctx: &mut ErrorContext,
    ) -> Result<Option<Environment>, ParseError> {
        let id = match requested.or(document.default_environment.as_deref()) {
            Some(id) => id,
            None if document.environments.is_empty() => return Ok(None),
            None => return Err(ParseError::MissingEnvironment),
        };

        ctx.object(format!("environment {id}"));
        let config = document
            .environments
            .get(id)
            .ok_or_else(|| ParseError::UnknownEnvironment { id: id.to_string() })?;

        Ok(Some(Environment {
            id: id.to_string(),
            transaction_manager: config.transaction_manager,
            data_source: config.data_source.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataSourceKind, ExecutorType, TransactionManagerKind};

    const TWO_ENVIRONMENTS: &str = r#"
properties:
  driver: org.h2.Driver
  pool_size: 15
settings:
  lazy_loading_enabled: true
  default_executor_type: reuse
default_environment: dev
environments:
  dev:
    data_source:
      driver: ${driver}
      url: ${url:jdbc:h2:mem:dev}
      max_active_connections: ${pool_size}
  prod:
    transaction_manager: managed
    data_source:
      kind: unpooled
      driver: ${driver}
      url: jdbc:postgresql://db/prod
type_aliases:
  Blog: domain.blog.Blog
mappers:
  - resource: mappers/BlogMapper.xml
"#;

    fn parse(
        text: &str,
        environment: Option<&str>,
        overrides: Option<&Properties>,
    ) -> (Result<Configuration, ParseError>, ErrorContext) {
        let mut ctx = ErrorContext::new();
        let result =
            YamlConfigParser::new().parse_str(text, "test.yaml", environment, overrides, &mut ctx);
        (result, ctx)
    }

    #[test]
    fn test_default_environment_selected() {
        let (result, _) = parse(TWO_ENVIRONMENTS, None, None);
        let config = result.unwrap();

        let env = config.environment().unwrap();
        assert_eq!(env.id, "dev");
        assert_eq!(env.transaction_manager, TransactionManagerKind::Jdbc);
        assert_eq!(env.data_source.driver, "org.h2.Driver");
        assert_eq!(env.data_source.url, "jdbc:h2:mem:dev");
        assert_eq!(env.data_source.max_active_connections, 15);
        assert!(config.settings().lazy_loading_enabled);
        assert_eq!(config.settings().default_executor_type, ExecutorType::Reuse);
        assert_eq!(config.type_aliases()["Blog"], "domain.blog.Blog");
        assert_eq!(config.mappers().len(), 1);
        assert_eq!(config.variable("pool_size"), Some("15"));
    }

    #[test]
    fn test_explicit_environment_selected() {
        let (result, _) = parse(TWO_ENVIRONMENTS, Some("prod"), None);
        let config = result.unwrap();

        let env = config.environment().unwrap();
        assert_eq!(env.id, "prod");
        assert_eq!(env.transaction_manager, TransactionManagerKind::Managed);
        assert_eq!(env.data_source.kind, DataSourceKind::Unpooled);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut overrides = Properties::new();
        overrides.insert("driver".to_string(), "test-driver".to_string());
        overrides.insert("url".to_string(), "jdbc:test".to_string());

        let (result, _) = parse(TWO_ENVIRONMENTS, None, Some(&overrides));
        let config = result.unwrap();

        let data_source = &config.environment().unwrap().data_source;
        assert_eq!(data_source.driver, "test-driver");
        assert_eq!(data_source.url, "jdbc:test");
        assert_eq!(config.variable("driver"), Some("test-driver"));
    }

    #[test]
    fn test_unknown_environment() {
        let (result, ctx) = parse(TWO_ENVIRONMENTS, Some("qa"), None);
        assert!(matches!(result, Err(ParseError::UnknownEnvironment { id }) if id == "qa"));

        let rendered = ctx.snapshot().unwrap();
        assert!(rendered.contains("test.yaml"));
        assert!(rendered.contains("environment qa"));
        assert!(rendered.contains("selecting environment"));
    }

    #[test]
    fn test_missing_environment() {
        let text = r#"
environments:
  dev:
    data_source:
      driver: d
      url: u
"#;
        let (result, _) = parse(text, None, None);
        assert!(matches!(result, Err(ParseError::MissingEnvironment)));
    }

    #[test]
    fn test_no_environments() {
        let (result, _) = parse("settings:\n  cache_enabled: false\n", None, None);
        let config = result.unwrap();
        assert!(config.environment().is_none());
        assert!(!config.settings().cache_enabled);
    }

    #[test]
    fn test_empty_source() {
        let (result, ctx) = parse("  \n\t", None, None);
        assert!(matches!(result, Err(ParseError::Empty { .. })));
        assert!(!ctx.is_empty());
    }

    #[test]
    fn test_syntax_errors() {
        let (result, _) = parse("environments: [unclosed", None, None);
        assert!(matches!(result, Err(ParseError::Syntax { .. })));

        let (result, _) = parse("- just\n- a list\n", None, None);
        assert!(matches!(result, Err(ParseError::Syntax { .. })));

        let (result, _) = parse("settings:\n  no_such_setting: true\n", None, None);
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_scalar_fields_from_placeholders() {
        let text = r#"
properties:
  lazy: "true"
  timeout: "30"
settings:
  lazy_loading_enabled: ${lazy}
  default_statement_timeout_seconds: ${timeout}
  cache_enabled: ${cache:false}
environments:
  dev:
    data_source:
      driver: 42
      url: jdbc:h2:mem:dev
      max_idle_connections: " 3 "
"#;
        let (result, _) = parse(text, Some("dev"), None);
        let config = result.unwrap();

        assert!(config.settings().lazy_loading_enabled);
        assert!(!config.settings().cache_enabled);
        assert_eq!(config.settings().default_statement_timeout_seconds, Some(30));
        let data_source = &config.environment().unwrap().data_source;
        assert_eq!(data_source.driver, "42");
        assert_eq!(data_source.max_idle_connections, 3);

        let (result, _) = parse("settings:\n  cache_enabled: maybe\n", None, None);
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_validation_failure() {
        let text = r#"
default_environment: dev
environments:
  dev:
    data_source:
      driver: ""
      url: jdbc:h2:mem:dev
"#;
        let (result, ctx) = parse(text, None, None);
        match result {
            Err(ParseError::Validation { issues }) => {
                assert_eq!(issues, vec!["environments.dev.data_source.driver: Driver cannot be empty"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(ctx.to_string().contains("validating configuration"));

        let mut ctx = ErrorContext::new();
        let config = YamlConfigParser::new()
            .resolve_str(text, "test.yaml", None, None, &mut ctx)
            .unwrap();
        let report = ConfigValidator::validate(&config);
        assert_eq!(
            report.error_messages(),
            vec!["environments.dev.data_source.driver: Driver cannot be empty"]
        );
    }

    #[test]
    fn test_unresolved_placeholder_is_kept() {
        let text = r#"
default_environment: dev
environments:
  dev:
    data_source:
      driver: ${driver}
      url: jdbc:h2:mem:dev
"#;
        let (result, ctx) = parse(text, None, None);
        let config = result.unwrap();
        assert_eq!(config.environment().unwrap().data_source.driver, "${driver}");
        assert_eq!(ctx.notes(), ["Unresolved placeholder ${driver}".to_string()]);
    }
}

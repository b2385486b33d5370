//! Configuration validation utilities

use crate::schema::{Configuration, DataSourceKind, Environment};
use std::collections::HashSet;

/// Statement timeouts above this many seconds are reported as suspicious
const MAX_REASONABLE_TIMEOUT_SECONDS: u64 = 3600;

/// Pool sizes above this are reported as suspicious
const MAX_REASONABLE_POOL_SIZE: u32 = 100;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a resolved configuration
    pub fn validate(config: &Configuration) -> ValidationReport {
        let mut report = ValidationReport::new();

        if let Some(environment) = config.environment() {
            Self::validate_environment(environment, &mut report);
        }

        Self::validate_settings(config, &mut report);
        Self::validate_type_aliases(config, &mut report);
        Self::validate_mappers(config, &mut report);

        report
    }

    fn validate_environment(environment: &Environment, report: &mut ValidationReport) {
        if environment.id.trim().is_empty() {
            report.add_error("environments", "Environment id cannot be empty");
        }

        let data_source = &environment.data_source;
        let prefix = format!("environments.{}.data_source", environment.id);

        match data_source.kind {
            DataSourceKind::Jndi => {
                if data_source.jndi_name.as_deref().map_or(true, str::is_empty) {
                    report.add_error(
                        &format!("{prefix}.jndi_name"),
                        "A jndi data source requires jndi_name",
                    );
                }
            }
            DataSourceKind::Pooled | DataSourceKind::Unpooled => {
                if data_source.driver.is_empty() {
                    report.add_error(&format!("{prefix}.driver"), "Driver cannot be empty");
                }
                if data_source.url.is_empty() {
                    report.add_error(&format!("{prefix}.url"), "Connection URL cannot be empty");
                }
            }
        }

        if data_source.kind == DataSourceKind::Pooled {
            if data_source.max_active_connections == 0 {
                report.add_error(
                    &format!("{prefix}.max_active_connections"),
                    "Max active connections cannot be 0",
                );
            } else if data_source.max_active_connections > MAX_REASONABLE_POOL_SIZE {
                report.add_warning(
                    &format!("{prefix}.max_active_connections"),
                    "Max active connections is very high",
                );
            }

            if data_source.max_idle_connections > data_source.max_active_connections {
                report.add_warning(
                    &format!("{prefix}.max_idle_connections"),
                    "Max idle connections is greater than max active connections",
                );
            }
        }

        let fields = [
            ("driver", Some(data_source.driver.as_str())),
            ("url", Some(data_source.url.as_str())),
            ("username", data_source.username.as_deref()),
            ("password", data_source.password.as_deref()),
        ];
        for (field, value) in fields {
            if value.is_some_and(|v| v.contains("${")) {
                report.add_warning(
                    &format!("{prefix}.{field}"),
                    "Value still contains an unresolved ${...} placeholder",
                );
            }
        }
    }

    fn validate_settings(config: &Configuration, report: &mut ValidationReport) {
        match config.settings().default_statement_timeout_seconds {
            Some(0) => {
                report.add_error(
                    "settings.default_statement_timeout_seconds",
                    "Statement timeout cannot be 0",
                );
            }
            Some(timeout) if timeout > MAX_REASONABLE_TIMEOUT_SECONDS => {
                report.add_warning(
                    "settings.default_statement_timeout_seconds",
                    &format!("Statement timeout is very high ({timeout}s)"),
                );
            }
            _ => {}
        }
    }

    fn validate_type_aliases(config: &Configuration, report: &mut ValidationReport) {
        for (alias, target) in config.type_aliases() {
            if alias.trim().is_empty() {
                report.add_error("type_aliases", "Alias name cannot be empty");
            }
            if target.trim().is_empty() {
                report.add_error("type_aliases", &format!("Alias {alias} has an empty target"));
            }
        }
    }

    fn validate_mappers(config: &Configuration, report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for (index, mapper) in config.mappers().iter().enumerate() {
            let field = format!("mappers[{index}]");
            if mapper.location_count() != 1 {
                report.add_error(
                    &field,
                    "Exactly one of resource, class or package must be set",
                );
                continue;
            }

            if let Some(location) = mapper.location() {
                if location.trim().is_empty() {
                    report.add_error(&field, "Mapper location cannot be empty");
                } else if !seen.insert(location) {
                    report.add_error(&field, &format!("Duplicate mapper location: {location}"));
                }
            }
        }
    }
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    /// Errors rendered as `field: message`
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ValidationIssue::to_string).collect()
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} errors, {} warnings", self.errors.len(), self.warnings.len())
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataSourceConfig, MapperConfig, Settings, TransactionManagerKind};
    use std::collections::BTreeMap;
    use types::Properties;

    fn environment(data_source: DataSourceConfig) -> Environment {
        Environment {
            id: "dev".to_string(),
            transaction_manager: TransactionManagerKind::Jdbc,
            data_source,
        }
    }

    fn valid_data_source() -> DataSourceConfig {
        DataSourceConfig {
            driver: "org.h2.Driver".to_string(),
            url: "jdbc:h2:mem:dev".to_string(),
            ..DataSourceConfig::default()
        }
    }

    #[test]
    fn test_valid_configuration() {
        let config = Configuration::from_parts(
            Some(environment(valid_data_source())),
            Properties::new(),
            Settings::default(),
            BTreeMap::new(),
            vec![MapperConfig {
                resource: Some("mappers/BlogMapper.xml".to_string()),
                ..MapperConfig::default()
            }],
        );

        let report = ConfigValidator::validate(&config);
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_data_source_errors() {
        let config = Configuration::from_parts(
            Some(environment(DataSourceConfig {
                max_active_connections: 0,
                ..DataSourceConfig::default()
            })),
            Properties::new(),
            Settings::default(),
            BTreeMap::new(),
            Vec::new(),
        );

        let report = ConfigValidator::validate(&config);
        let fields: Vec<_> = report.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"environments.dev.data_source.driver"));
        assert!(fields.contains(&"environments.dev.data_source.url"));
        assert!(fields.contains(&"environments.dev.data_source.max_active_connections"));
    }

    #[test]
    fn test_jndi_requires_name() {
        let config = Configuration::from_parts(
            Some(environment(DataSourceConfig {
                kind: DataSourceKind::Jndi,
                ..DataSourceConfig::default()
            })),
            Properties::new(),
            Settings::default(),
            BTreeMap::new(),
            Vec::new(),
        );

        let report = ConfigValidator::validate(&config);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field, "environments.dev.data_source.jndi_name");
    }

    #[test]
    fn test_unresolved_placeholder_warning() {
        let config = Configuration::from_parts(
            Some(environment(DataSourceConfig {
                driver: "${driver}".to_string(),
                ..valid_data_source()
            })),
            Properties::new(),
            Settings::default(),
            BTreeMap::new(),
            Vec::new(),
        );

        let report = ConfigValidator::validate(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].field, "environments.dev.data_source.driver");
    }

    #[test]
    fn test_mapper_and_settings_errors() {
        let settings = Settings {
            default_statement_timeout_seconds: Some(0),
            ..Settings::default()
        };
        let resource = MapperConfig {
            resource: Some("a.xml".to_string()),
            ..MapperConfig::default()
        };
        let ambiguous = MapperConfig {
            resource: Some("b.xml".to_string()),
            class: Some("b.Mapper".to_string()),
            ..MapperConfig::default()
        };

        let config = Configuration::from_parts(
            None,
            Properties::new(),
            settings,
            BTreeMap::new(),
            vec![resource.clone(), resource, ambiguous],
        );

        let report = ConfigValidator::validate(&config);
        assert_eq!(report.errors.len(), 3);
        assert!(report
            .error_messages()
            .iter()
            .any(|m| m == "mappers[1]: Duplicate mapper location: a.xml"));
        assert_eq!(report.summary(), "Validation: 3 errors, 0 warnings");
    }
}

//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::Properties;

/// Configuration document as written in YAML, after placeholder resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// In-source property defaults used by `${...}` placeholders
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
    /// Global settings
    #[serde(default)]
    pub settings: Settings,
    /// Environment selected when the caller does not name one
    pub default_environment: Option<String>,
    /// Named environments
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
    /// Short names for fully qualified types
    #[serde(default)]
    pub type_aliases: BTreeMap<String, String>,
    /// Mapper locations
    #[serde(default)]
    pub mappers: Vec<MapperConfig>,
}

/// Global settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Enable the second-level cache
    #[serde(default = "default_true", deserialize_with = "scalar::parsed")]
    pub cache_enabled: bool,
    /// Load associations lazily
    #[serde(default = "default_false", deserialize_with = "scalar::parsed")]
    pub lazy_loading_enabled: bool,
    /// Map `snake_case` columns onto `camelCase` properties
    #[serde(default = "default_false", deserialize_with = "scalar::parsed")]
    pub map_underscore_to_camel_case: bool,
    /// Retrieve generated keys after inserts
    #[serde(default = "default_false", deserialize_with = "scalar::parsed")]
    pub use_generated_keys: bool,
    /// Executor used by sessions unless overridden
    #[serde(default)]
    pub default_executor_type: ExecutorType,
    /// Statement timeout in seconds
    #[serde(default, deserialize_with = "scalar::optional_parsed")]
    pub default_statement_timeout_seconds: Option<u64>,
}

/// Statement executor strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorType {
    #[default]
    Simple,
    Reuse,
    Batch,
}

/// One named environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Transaction manager kind
    #[serde(default)]
    pub transaction_manager: TransactionManagerKind,
    /// Data source settings
    pub data_source: DataSourceConfig,
}

/// How transactions are managed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionManagerKind {
    /// Commit and rollback on the connection directly
    #[default]
    Jdbc,
    /// Leave transactions to the container
    Managed,
}

/// Data source settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Data source kind
    #[serde(default)]
    pub kind: DataSourceKind,
    /// Driver name
    #[serde(default, deserialize_with = "scalar::text")]
    pub driver: String,
    /// Connection URL
    #[serde(default, deserialize_with = "scalar::text")]
    pub url: String,
    /// Login user
    #[serde(default, deserialize_with = "scalar::optional_text")]
    pub username: Option<String>,
    /// Login password
    #[serde(default, deserialize_with = "scalar::optional_text")]
    pub password: Option<String>,
    /// Directory name when the data source is looked up
    #[serde(default, deserialize_with = "scalar::optional_text")]
    pub jndi_name: Option<String>,
    /// Maximum active pooled connections
    #[serde(
        default = "default_max_active_connections",
        deserialize_with = "scalar::parsed"
    )]
    pub max_active_connections: u32,
    /// Maximum idle pooled connections
    #[serde(
        default = "default_max_idle_connections",
        deserialize_with = "scalar::parsed"
    )]
    pub max_idle_connections: u32,
}

/// Data source kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    #[default]
    Pooled,
    Unpooled,
    Jndi,
}

/// Mapper location; exactly one field must be set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

/// The environment a configuration was resolved against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub id: String,
    pub transaction_manager: TransactionManagerKind,
    pub data_source: DataSourceConfig,
}

/// Fully resolved configuration handed to the session factory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Configuration {
    environment: Option<Environment>,
    variables: Properties,
    settings: Settings,
    type_aliases: BTreeMap<String, String>,
    mappers: Vec<MapperConfig>,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_max_active_connections() -> u32 {
    10
}

fn default_max_idle_connections() -> u32 {
    5
}

impl Configuration {
    /// Assemble a configuration from resolved parts
    pub fn from_parts(
        environment: Option<Environment>,
        variables: Properties,
        settings: Settings,
        type_aliases: BTreeMap<String, String>,
        mappers: Vec<MapperConfig>,
    ) -> Self {
        Self {
            environment,
            variables,
            settings,
            type_aliases,
            mappers,
        }
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    /// Id of the selected environment, if any
    pub fn environment_id(&self) -> Option<&str> {
        self.environment.as_ref().map(|env| env.id.as_str())
    }

    /// Properties after caller overrides were applied
    pub fn variables(&self) -> &Properties {
        &self.variables
    }

    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn type_aliases(&self) -> &BTreeMap<String, String> {
        &self.type_aliases
    }

    pub fn mappers(&self) -> &[MapperConfig] {
        &self.mappers
    }
}

impl ConfigDocument {
    /// Example document written by `ConfigLoader::create_example`
    pub fn example() -> Self {
        let mut properties = Properties::new();
        properties.insert("driver".to_string(), "org.h2.Driver".to_string());
        properties.insert("url".to_string(), "jdbc:h2:mem:dev".to_string());
        properties.insert("username".to_string(), "sa".to_string());

        let data_source = DataSourceConfig {
            driver: "${driver}".to_string(),
            url: "${url}".to_string(),
            username: Some("${username}".to_string()),
            password: Some("${password:}".to_string()),
            ..DataSourceConfig::default()
        };

        let mut environments = BTreeMap::new();
        environments.insert(
            "dev".to_string(),
            EnvironmentConfig {
                transaction_manager: TransactionManagerKind::Jdbc,
                data_source,
            },
        );

        let mut type_aliases = BTreeMap::new();
        type_aliases.insert("Blog".to_string(), "domain.blog.Blog".to_string());

        Self {
            properties,
            settings: Settings::default(),
            default_environment: Some("dev".to_string()),
            environments,
            type_aliases,
            mappers: vec![MapperConfig {
                resource: Some("mappers/BlogMapper.xml".to_string()),
                ..MapperConfig::default()
            }],
        }
    }
}

impl MapperConfig {
    /// The single location this entry points at
    pub fn location(&self) -> Option<&str> {
        self.resource
            .as_deref()
            .or(self.class.as_deref())
            .or(self.package.as_deref())
    }

    /// Number of location fields that are set
    pub fn location_count(&self) -> usize {
        [&self.resource, &self.class, &self.package]
            .iter()
            .filter(|field| field.is_some())
            .count()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_enabled: default_true(),
            lazy_loading_enabled: default_false(),
            map_underscore_to_camel_case: default_false(),
            use_generated_keys: default_false(),
            default_executor_type: ExecutorType::default(),
            default_statement_timeout_seconds: None,
        }
    }
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            kind: DataSourceKind::default(),
            driver: String::new(),
            url: String::new(),
            username: None,
            password: None,
            jndi_name: None,
            max_active_connections: default_max_active_connections(),
            max_idle_connections: default_max_idle_connections(),
        }
    }
}

/// Scalar fields accept both YAML scalars and their string form, since
/// placeholder substitution always yields strings
mod scalar {
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer};
    use serde_yaml::Value;
    use std::fmt::Display;
    use std::str::FromStr;

    /// String field; numbers and booleans are kept as written
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        into_text(Value::deserialize(deserializer)?)
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            value => into_text(value).map(Some),
        }
    }

    /// Number or boolean field; a string is parsed after trimming
    pub fn parsed<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + FromStr,
        T::Err: Display,
    {
        from_value(Value::deserialize(deserializer)?)
    }

    pub fn optional_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + FromStr,
        T::Err: Display,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::String(text) if text.trim().is_empty() => Ok(None),
            value => from_value(value).map(Some),
        }
    }

    fn into_text<E: Error>(value: Value) -> Result<String, E> {
        match value {
            Value::String(text) => Ok(text),
            Value::Number(number) => Ok(number.to_string()),
            Value::Bool(flag) => Ok(flag.to_string()),
            Value::Tagged(tagged) => into_text(tagged.value),
            other => Err(E::custom(format!(
                "invalid type: {}, expected a string",
                kind(&other)
            ))),
        }
    }

    fn from_value<T, E>(value: Value) -> Result<T, E>
    where
        T: DeserializeOwned + FromStr,
        T::Err: Display,
        E: Error,
    {
        match value {
            Value::String(text) => text
                .trim()
                .parse()
                .map_err(|e| E::custom(format!("invalid value '{}': {}", text, e))),
            other => serde_yaml::from_value(other).map_err(E::custom),
        }
    }

    fn kind(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            _ => "scalar",
        }
    }
}

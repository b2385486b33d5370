//! Configuration file helpers: example generation and property override loading

use crate::properties::flatten_properties;
use crate::schema::ConfigDocument;
use anyhow::{anyhow, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;
use types::Properties;

/// Environment variable prefix for property overrides
pub const OVERRIDE_ENV_PREFIX: &str = "SQLSESSION_PROP_";

/// Loader for configuration-related files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Assemble property overrides from, in increasing precedence:
    /// an optional YAML properties file, `<env_prefix>*` environment
    /// variables, and explicit `key=value` pairs.
    pub fn load_overrides(
        properties_file: Option<&Path>,
        env_prefix: &str,
        pairs: &[(String, String)],
    ) -> Result<Properties> {
        let mut figment = Figment::new();

        if let Some(path) = properties_file {
            if !path.exists() {
                return Err(anyhow!("Properties file not found: {}", path.display()));
            }
            figment = figment.merge(Yaml::file(path));
        }

        let explicit: Properties = pairs.iter().cloned().collect();
        let values: BTreeMap<String, Value> = figment
            .merge(Env::prefixed(env_prefix))
            .merge(Serialized::defaults(explicit))
            .extract()
            .context("Failed to load property overrides")?;

        let mapping: Mapping = values
            .into_iter()
            .map(|(key, value)| (Value::String(key), value))
            .collect();

        flatten_properties(Value::Mapping(mapping))
            .map_err(|e| anyhow!("Invalid property override: {}", e))
    }

    /// Get the example configuration document
    pub fn example() -> ConfigDocument {
        ConfigDocument::example()
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = serde_yaml::to_string(&Self::example())
            .context("Failed to serialize example configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }
}

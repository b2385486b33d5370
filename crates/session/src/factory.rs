//! Session factories and the constructors that produce them

use chrono::{DateTime, Utc};
use config::Configuration;
use serde::Serialize;
use std::sync::Arc;
use types::utils::generate_build_id;
use types::ConstructionError;

/// Builds a session factory from a resolved configuration
pub trait FactoryConstructor: Send + Sync {
    /// The factory type produced
    type Factory;

    /// Construct one factory. Called at most once per build.
    fn construct(&self, config: Configuration) -> Result<Self::Factory, ConstructionError>;
}

impl<F, T> FactoryConstructor for F
where
    F: Fn(Configuration) -> Result<T, ConstructionError> + Send + Sync,
{
    type Factory = T;

    fn construct(&self, config: Configuration) -> Result<T, ConstructionError> {
        self(config)
    }
}

/// Produces [`DefaultSessionFactory`] values; never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstructor;

impl FactoryConstructor for DefaultConstructor {
    type Factory = DefaultSessionFactory;

    fn construct(&self, config: Configuration) -> Result<DefaultSessionFactory, ConstructionError> {
        Ok(DefaultSessionFactory::new(config))
    }
}

/// Session factory backed by one immutable configuration
#[derive(Debug, Clone)]
pub struct DefaultSessionFactory {
    id: String,
    created_at: DateTime<Utc>,
    configuration: Arc<Configuration>,
}

/// Serializable overview of a factory
#[derive(Debug, Clone, Serialize)]
pub struct FactorySummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub environment: Option<String>,
    pub type_aliases: usize,
    pub mappers: usize,
}

impl DefaultSessionFactory {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            id: generate_build_id(),
            created_at: Utc::now(),
            configuration: Arc::new(configuration),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn environment_id(&self) -> Option<&str> {
        self.configuration.environment_id()
    }

    pub fn summary(&self) -> FactorySummary {
        FactorySummary {
            id: self.id.clone(),
            created_at: self.created_at,
            environment: self.environment_id().map(str::to_string),
            type_aliases: self.configuration.type_aliases().len(),
            mappers: self.configuration.mappers().len(),
        }
    }
}

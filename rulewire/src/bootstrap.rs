//! Turning [ContainerConfig] into a ready [Container].

use crate::config::ContainerConfig;
use crate::loader::{apply_rules, rule_file_loader, LoaderError};
use config::ConfigError;
use derive_more::Constructor;
use rulewire_di::container::Container;
use rulewire_di::error::TypeRegistryError;
use rulewire_di::type_registry::TypeRegistry;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Error reading configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Error registering types: {0}")]
    Registry(#[from] TypeRegistryError),
    #[error("Error loading rules: {0}")]
    RuleFile(#[from] LoaderError),
}

/// Creates containers with all statically registered types and rules from configured files.
#[derive(Constructor, Clone, Debug)]
pub struct Bootstrap {
    config: ContainerConfig,
}

impl Bootstrap {
    /// Creates a bootstrap with configuration read from the environment.
    pub fn from_environment() -> Result<Self, BootstrapError> {
        Ok(Self::new(ContainerConfig::init_from_environment()?))
    }

    #[inline]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn build(&self) -> Result<Container, BootstrapError> {
        if self.config.install_tracing_logger {
            // another subscriber might already be installed by the application
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .try_init();
        }

        info!("Registering types...");

        let type_registry = TypeRegistry::from_inventory(self.config.allow_type_overriding)?;
        let mut container = Container::new(type_registry);

        for rule_file in &self.config.rule_files {
            info!(%rule_file, "Loading rules...");

            let count = apply_rules(rule_file_loader(rule_file)?.as_ref(), &mut container)?;
            info!(%rule_file, count, "Rules loaded.");
        }

        Ok(container)
    }
}

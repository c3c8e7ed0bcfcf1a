//! Container configuration is created with opinionated default values, which can then be
//! overwritten by environment variables prefixed with `RULEWIRE_` or `rulewire.json` file.
//! Lists, like `RULEWIRE_RULE_FILES`, are comma-separated in environment variables.

use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "RULEWIRE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "rulewire.json";

/// Configuration used by [Bootstrap](crate::bootstrap::Bootstrap).
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct ContainerConfig {
    /// Should a default tracing logger be installed when building the container.
    pub install_tracing_logger: bool,

    /// Rule files, applied in order. Files with the `xml` extension are read as XML, others as JSON.
    pub rule_files: Vec<String>,

    /// Allow registering multiple types with the same identifier. The last registered one wins.
    pub allow_type_overriding: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            rule_files: Vec::new(),
            allow_type_overriding: false,
        }
    }
}

impl From<OptionalContainerConfig> for ContainerConfig {
    fn from(value: OptionalContainerConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            rule_files: value.rule_files.unwrap_or(default.rule_files),
            allow_type_overriding: value
                .allow_type_overriding
                .unwrap_or(default.allow_type_overriding),
        }
    }
}

impl ContainerConfig {
    pub fn with_install_tracing_logger(mut self, install_tracing_logger: bool) -> Self {
        self.install_tracing_logger = install_tracing_logger;
        self
    }

    pub fn with_rule_file<T: ToString>(mut self, rule_file: T) -> Self {
        self.rule_files.push(rule_file.to_string());
        self
    }

    pub fn with_allow_type_overriding(mut self, allow_type_overriding: bool) -> Self {
        self.allow_type_overriding = allow_type_overriding;
        self
    }

    /// Reads the config from [CONFIG_FILE] and the environment.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Self::init_from_sources(
            File::with_name(CONFIG_FILE).required(false),
            Environment::with_prefix(CONFIG_ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("rule_files"),
        )
    }

    fn init_from_sources<F, E>(file: F, environment: E) -> Result<Self, ConfigError>
    where
        F: Source + Send + Sync + 'static,
        E: Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()
            .and_then(|config| config.try_deserialize::<OptionalContainerConfig>())
            .map(|config| config.into())
    }
}

#[derive(Deserialize)]
struct OptionalContainerConfig {
    install_tracing_logger: Option<bool>,
    rule_files: Option<Vec<String>>,
    allow_type_overriding: Option<bool>,
}

#[cfg(test)]
mod tests {
    use crate::config::ContainerConfig;
    use config::{Environment, File, FileFormat};
    use std::collections::HashMap;

    #[test]
    fn should_use_defaults() {
        let config = ContainerConfig::init_from_sources(
            File::from_str("{}", FileFormat::Json),
            Environment::default().source(Some(HashMap::new())),
        )
        .unwrap();

        assert!(config.install_tracing_logger);
        assert!(config.rule_files.is_empty());
        assert!(!config.allow_type_overriding);
    }

    #[test]
    fn should_read_file() {
        let config = ContainerConfig::init_from_sources(
            File::from_str(
                r#"{"install_tracing_logger": false, "rule_files": ["a.json", "b.json"]}"#,
                FileFormat::Json,
            ),
            Environment::default().source(Some(HashMap::new())),
        )
        .unwrap();

        assert!(!config.install_tracing_logger);
        assert_eq!(config.rule_files, vec!["a.json", "b.json"]);
    }

    #[test]
    fn should_override_file_with_environment() {
        let config = ContainerConfig::init_from_sources(
            File::from_str(r#"{"allow_type_overriding": false}"#, FileFormat::Json),
            Environment::with_prefix("RULEWIRE")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("rule_files")
                .source(Some(HashMap::from([
                    (
                        "RULEWIRE_ALLOW_TYPE_OVERRIDING".to_string(),
                        "true".to_string(),
                    ),
                    (
                        "RULEWIRE_RULE_FILES".to_string(),
                        "first.json,second.json".to_string(),
                    ),
                ]))),
        )
        .unwrap();

        assert!(config.allow_type_overriding);
        assert_eq!(config.rule_files, vec!["first.json", "second.json"]);
    }
}

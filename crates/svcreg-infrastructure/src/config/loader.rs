//! Configuration loader
//!
//! Loads [`AppConfig`] from defaults, a TOML file and environment variables
//! through Figment.

use crate::config::AppConfig;
use crate::constants::{
    CONFIG_ENV_PREFIX, CONFIG_ENV_SEPARATOR, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME,
    RESOURCE_PROVIDERS,
};
use crate::error_ext::ErrorContext;
use crate::logging::{log_config_loaded, parse_log_level};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::env;
use std::path::{Path, PathBuf};
use svcreg_application::ports::registry::{
    list_remote_access_providers, list_service_registry_providers,
};
use svcreg_domain::error::{Error, Result};

/// Configuration loader service
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Sources are merged in this order (later sources override earlier):
    /// 1. Default values from `AppConfig::default()`
    /// 2. TOML configuration file (if it exists)
    /// 3. Environment variables with prefix (e.g., `SVCREG__REGISTRY__PROVIDER`)
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                figment = figment.merge(Toml::file(config_path));
                log_config_loaded(config_path, true);
            } else {
                log_config_loaded(config_path, false);
            }
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            log_config_loaded(&default_path, true);
        }

        // Double underscore keeps snake_case keys intact (SVCREG__REGISTRY__MAX_CONNECTIONS)
        figment = figment.merge(
            Env::prefixed(&format!("{}{CONFIG_ENV_SEPARATOR}", self.env_prefix))
                .split(CONFIG_ENV_SEPARATOR),
        );

        let app_config: AppConfig = figment
            .extract()
            .config_context("Failed to extract configuration")?;

        validate_app_config(&app_config)?;
        Ok(app_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &AppConfig, path: P) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(config).context("Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), toml_string).io_context(format!(
            "Failed to write config file {}",
            path.as_ref().display()
        ))?;

        Ok(())
    }

    /// Get the configured file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// First existing default configuration file
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let candidates = [
            Some(current_dir.join(DEFAULT_CONFIG_FILENAME)),
            Some(
                current_dir
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME),
            ),
            dirs::config_dir().map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME)),
            dirs::home_dir().map(|d| {
                d.join(format!(".{DEFAULT_CONFIG_DIR}"))
                    .join(DEFAULT_CONFIG_FILENAME)
            }),
        ];

        candidates.into_iter().flatten().find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate application configuration
pub fn validate_app_config(config: &AppConfig) -> Result<()> {
    parse_log_level(&config.logging.level)?;
    validate_registry_config(config)?;
    validate_access_config(config)?;
    Ok(())
}

fn validate_registry_config(config: &AppConfig) -> Result<()> {
    let registry = &config.registry;
    if !list_service_registry_providers()
        .iter()
        .any(|(name, _)| *name == registry.provider)
    {
        return Err(Error::configuration(format!(
            "Unknown registry provider '{}'",
            registry.provider
        )));
    }
    if RESOURCE_PROVIDERS.contains(&registry.provider.as_str()) && registry.location.is_none() {
        return Err(Error::configuration(format!(
            "Registry provider '{}' requires a location",
            registry.provider
        )));
    }
    if registry.max_connections == 0 {
        return Err(Error::configuration(
            "Registry max_connections cannot be 0",
        ));
    }
    if registry.operation_timeout_secs == 0 {
        return Err(Error::configuration(
            "Registry operation_timeout_secs cannot be 0",
        ));
    }
    Ok(())
}

fn validate_access_config(config: &AppConfig) -> Result<()> {
    if !list_remote_access_providers()
        .iter()
        .any(|(name, _)| *name == config.access.provider)
    {
        return Err(Error::configuration(format!(
            "Unknown remote access provider '{}'",
            config.access.provider
        )));
    }
    if config.access.remote_timeout_secs == 0 {
        return Err(Error::configuration(
            "Remote access remote_timeout_secs cannot be 0",
        ));
    }
    Ok(())
}

//! Registry backend configuration

use crate::constants::{
    DEFAULT_MAX_CONNECTIONS, DEFAULT_OPERATION_TIMEOUT_SECS, DEFAULT_REGISTRY_PROVIDER,
    DEFAULT_SERVICES_DIR,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use svcreg_application::ports::registry::ServiceRegistryProviderConfig;

/// `[registry]` section
///
/// Only the keys relevant to the selected provider are used:
///
/// | Provider | Keys |
/// |----------|------|
/// | `json`, `yaml` | `location`, `watch` |
/// | `sql` | `url`, `max_connections`, `operation_timeout_secs` |
/// | `directory` | `base_dn` |
/// | `memory` | none |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Backend name as registered in the provider registry
    pub provider: String,
    /// Directory of service definition files
    pub location: Option<PathBuf>,
    /// Watch `location` for external changes
    pub watch: bool,
    /// Database URL
    pub url: Option<String>,
    /// Database pool size
    pub max_connections: u32,
    /// Bound of a single database operation
    pub operation_timeout_secs: u64,
    /// Base DN of the service entries
    pub base_dn: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_REGISTRY_PROVIDER.to_string(),
            location: Some(PathBuf::from(DEFAULT_SERVICES_DIR)),
            watch: false,
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            base_dn: None,
        }
    }
}

impl RegistryConfig {
    /// Convert to the provider registry's configuration
    pub fn to_provider_config(&self) -> ServiceRegistryProviderConfig {
        let mut config = ServiceRegistryProviderConfig::new(&self.provider)
            .with_watch(self.watch)
            .with_max_connections(self.max_connections)
            .with_operation_timeout(Duration::from_secs(self.operation_timeout_secs));
        if let Some(location) = &self.location {
            config = config.with_location(location);
        }
        if let Some(url) = &self.url {
            config = config.with_url(url);
        }
        if let Some(base_dn) = &self.base_dn {
            config = config.with_base_dn(base_dn);
        }
        config
    }
}

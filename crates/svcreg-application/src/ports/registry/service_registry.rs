//! Service Registry Provider Registry
//!
//! Auto-registration system for registry backends. Backends register
//! themselves via `#[linkme::distributed_slice(SERVICE_REGISTRY_PROVIDERS)]`
//! and are selected by name from configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use svcreg_domain::events::SharedEventPublisher;
use svcreg_domain::ports::ServiceRegistry;

/// Configuration for registry backend creation
///
/// Contains every option a backend might need. Backends use what they need
/// and ignore the rest.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistryProviderConfig {
    /// Backend name (e.g., "memory", "json", "yaml", "sql", "directory")
    pub provider: String,
    /// Directory holding service files (resource backends)
    pub location: Option<PathBuf>,
    /// Watch `location` and reload changed files
    pub watch: bool,
    /// Database connection URL (relational backend)
    pub url: Option<String>,
    /// Maximum pooled connections (relational backend)
    pub max_connections: Option<u32>,
    /// Upper bound for a single storage operation
    pub operation_timeout: Option<Duration>,
    /// Base DN holding service entries (directory backend)
    pub base_dn: Option<String>,
    /// Additional provider-specific configuration
    pub extra: HashMap<String, String>,
}

impl ServiceRegistryProviderConfig {
    /// Create a new config with the given provider name
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    /// Set the storage location
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Enable or disable watching the storage location
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Set the database URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the connection pool size
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// Set the per-operation timeout
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Set the directory base DN
    pub fn with_base_dn(mut self, base_dn: impl Into<String>) -> Self {
        self.base_dn = Some(base_dn.into());
        self
    }

    /// Add extra configuration
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Factory signature shared by all registry backends
pub type ServiceRegistryFactory = fn(
    &ServiceRegistryProviderConfig,
    SharedEventPublisher,
) -> Result<Arc<dyn ServiceRegistry>, String>;

/// Registry entry for registry backends
pub struct ServiceRegistryProviderEntry {
    /// Unique backend name (e.g., "memory", "json")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Factory function to create backend instances
    pub factory: ServiceRegistryFactory,
}

#[linkme::distributed_slice]
pub static SERVICE_REGISTRY_PROVIDERS: [ServiceRegistryProviderEntry] = [..];

/// Resolve a registry backend by name
///
/// # Returns
/// * `Ok(Arc<dyn ServiceRegistry>)` - Created backend instance
/// * `Err(String)` - Error message if the backend is unknown or creation failed
pub fn resolve_service_registry_provider(
    config: &ServiceRegistryProviderConfig,
    publisher: SharedEventPublisher,
) -> Result<Arc<dyn ServiceRegistry>, String> {
    let provider_name = &config.provider;

    if let Some(entry) = SERVICE_REGISTRY_PROVIDERS
        .iter()
        .find(|entry| entry.name == provider_name)
    {
        return (entry.factory)(config, publisher);
    }

    let available: Vec<&str> = SERVICE_REGISTRY_PROVIDERS.iter().map(|e| e.name).collect();
    Err(format!(
        "Unknown service registry provider '{provider_name}'. Available providers: {available:?}"
    ))
}

/// List all registered registry backends as (name, description)
pub fn list_service_registry_providers() -> Vec<(&'static str, &'static str)> {
    SERVICE_REGISTRY_PROVIDERS
        .iter()
        .map(|e| (e.name, e.description))
        .collect()
}

//! Remote Access Check Provider Registry

use std::sync::Arc;
use std::time::Duration;

use svcreg_domain::ports::RemoteAccessCheckProvider;

/// Configuration for remote access check provider creation
#[derive(Debug, Clone, Default)]
pub struct RemoteAccessProviderConfig {
    /// Provider name (e.g., "http", "null")
    pub provider: String,
    /// Request timeout
    pub timeout: Option<Duration>,
    /// User agent sent with each request
    pub user_agent: Option<String>,
}

impl RemoteAccessProviderConfig {
    /// Create a new config with the given provider name
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Registry entry for remote access check providers
pub struct RemoteAccessProviderEntry {
    /// Unique provider name
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Factory function to create provider instances
    pub factory: fn(&RemoteAccessProviderConfig) -> Result<Arc<dyn RemoteAccessCheckProvider>, String>,
}

#[linkme::distributed_slice]
pub static REMOTE_ACCESS_PROVIDERS: [RemoteAccessProviderEntry] = [..];

/// Resolve a remote access check provider by name
pub fn resolve_remote_access_provider(
    config: &RemoteAccessProviderConfig,
) -> Result<Arc<dyn RemoteAccessCheckProvider>, String> {
    let provider_name = &config.provider;

    if let Some(entry) = REMOTE_ACCESS_PROVIDERS
        .iter()
        .find(|entry| entry.name == provider_name)
    {
        return (entry.factory)(config);
    }

    let available: Vec<&str> = REMOTE_ACCESS_PROVIDERS.iter().map(|e| e.name).collect();
    Err(format!(
        "Unknown remote access provider '{provider_name}'. Available providers: {available:?}"
    ))
}

/// List all registered remote access check providers as (name, description)
pub fn list_remote_access_providers() -> Vec<(&'static str, &'static str)> {
    REMOTE_ACCESS_PROVIDERS
        .iter()
        .map(|e| (e.name, e.description))
        .collect()
}

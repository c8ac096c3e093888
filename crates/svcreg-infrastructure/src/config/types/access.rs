use crate::constants::{
    DEFAULT_REMOTE_ACCESS_PROVIDER, DEFAULT_REMOTE_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use svcreg_application::ports::registry::RemoteAccessProviderConfig;

/// `[access]` section, used by remote endpoint access strategies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Remote access checker (`http` or `null`)
    pub provider: String,
    /// Request timeout of a remote check
    pub remote_timeout_secs: u64,
    /// User agent sent with remote checks
    pub user_agent: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_REMOTE_ACCESS_PROVIDER.to_string(),
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AccessConfig {
    /// Convert to the remote access provider registry's configuration
    pub fn to_provider_config(&self) -> RemoteAccessProviderConfig {
        RemoteAccessProviderConfig::new(&self.provider)
            .with_timeout(Duration::from_secs(self.remote_timeout_secs))
            .with_user_agent(&self.user_agent)
    }
}

//! Null remote access checker

use async_trait::async_trait;
use std::sync::Arc;
use svcreg_application::ports::registry::{
    REMOTE_ACCESS_PROVIDERS, RemoteAccessProviderConfig, RemoteAccessProviderEntry,
};
use svcreg_domain::error::{Error, Result};
use svcreg_domain::ports::RemoteAccessCheckProvider;

/// Checker used when no HTTP client is configured
#[derive(Debug, Default)]
pub struct NullRemoteAccessCheckProvider;

impl NullRemoteAccessCheckProvider {
    /// Create a new null checker
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteAccessCheckProvider for NullRemoteAccessCheckProvider {
    async fn check(&self, endpoint_url: &str, _principal_id: &str) -> Result<u16> {
        Err(Error::policy(format!(
            "no remote access checker configured for {endpoint_url}"
        )))
    }

    fn provider_name(&self) -> &str {
        "null"
    }
}

#[linkme::distributed_slice(REMOTE_ACCESS_PROVIDERS)]
static NULL_REMOTE_ACCESS: RemoteAccessProviderEntry = RemoteAccessProviderEntry {
    name: "null",
    description: "Rejects every remote access check",
    factory: null_factory,
};

fn null_factory(
    _config: &RemoteAccessProviderConfig,
) -> std::result::Result<Arc<dyn RemoteAccessCheckProvider>, String> {
    Ok(Arc::new(NullRemoteAccessCheckProvider::new()))
}

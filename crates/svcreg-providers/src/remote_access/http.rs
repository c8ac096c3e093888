//! HTTP Remote Access Checker
//!
//! Issues `GET {endpoint}?username={principal}` and hands the status code
//! back to the access strategy, which compares it against its allow-list.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use svcreg_providers::remote_access::HttpRemoteAccessCheckProvider;
//!
//! let client = reqwest::Client::builder()
//!     .timeout(Duration::from_secs(5))
//!     .build()
//!     .unwrap();
//! let checker = HttpRemoteAccessCheckProvider::new(client, Duration::from_secs(5));
//! ```

use crate::constants::REMOTE_ACCESS_DEFAULT_TIMEOUT;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use svcreg_application::ports::registry::{
    REMOTE_ACCESS_PROVIDERS, RemoteAccessProviderConfig, RemoteAccessProviderEntry,
};
use svcreg_domain::constants::REMOTE_ACCESS_USERNAME_PARAM;
use svcreg_domain::error::{Error, Result};
use svcreg_domain::ports::RemoteAccessCheckProvider;
use tracing::debug;

/// reqwest-based remote access checker
#[derive(Debug, Clone)]
pub struct HttpRemoteAccessCheckProvider {
    http_client: Client,
    timeout: Duration,
}

impl HttpRemoteAccessCheckProvider {
    /// Create a checker around an existing client
    pub fn new(http_client: Client, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl RemoteAccessCheckProvider for HttpRemoteAccessCheckProvider {
    async fn check(&self, endpoint_url: &str, principal_id: &str) -> Result<u16> {
        let response = self
            .http_client
            .get(endpoint_url)
            .query(&[(REMOTE_ACCESS_USERNAME_PARAM, principal_id)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::policy(format!(
                        "remote access check timed out after {:?}",
                        self.timeout
                    ))
                } else {
                    Error::policy_with_source("remote access check failed", e)
                }
            })?;

        let status = response.status().as_u16();
        debug!(endpoint = endpoint_url, status, "Remote access check answered");
        Ok(status)
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}

fn http_factory(
    config: &RemoteAccessProviderConfig,
) -> std::result::Result<Arc<dyn RemoteAccessCheckProvider>, String> {
    let timeout = config.timeout.unwrap_or(REMOTE_ACCESS_DEFAULT_TIMEOUT);
    let mut builder = Client::builder().timeout(timeout);
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }
    let http_client = builder
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

    Ok(Arc::new(HttpRemoteAccessCheckProvider::new(
        http_client,
        timeout,
    )))
}

#[linkme::distributed_slice(REMOTE_ACCESS_PROVIDERS)]
static HTTP_REMOTE_ACCESS: RemoteAccessProviderEntry = RemoteAccessProviderEntry {
    name: "http",
    description: "HTTP GET against the strategy's endpoint with a request timeout",
    factory: http_factory,
};

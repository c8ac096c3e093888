//! Remote Access Check Port
//!
//! Port for access strategies that delegate the decision to an external
//! HTTP endpoint. The strategy only interprets the status code; transport,
//! timeouts and TLS belong to the implementation.

use crate::error::Result;
use async_trait::async_trait;

/// Remote Access Check Provider Port
///
/// # Implementations
///
/// - **Http**: reqwest-based client with a request timeout
/// - **Null**: always fails, so remote strategies deny access
#[async_trait]
pub trait RemoteAccessCheckProvider: Send + Sync + std::fmt::Debug {
    /// Ask `endpoint_url` whether `principal_id` may access the service
    ///
    /// # Returns
    /// The HTTP status code returned by the endpoint. Transport failures and
    /// timeouts are errors; callers must treat them as "denied".
    async fn check(&self, endpoint_url: &str, principal_id: &str) -> Result<u16>;

    /// Get the name/identifier of this provider implementation
    fn provider_name(&self) -> &str;
}

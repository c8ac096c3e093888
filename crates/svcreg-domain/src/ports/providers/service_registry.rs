//! Service Registry Port
//!
//! Storage contract shared by every backend. Backends persist whole
//! records; they never evaluate policies (expiration included).

use crate::entities::RegisteredService;
use crate::error::Result;
use async_trait::async_trait;

/// Service Registry Port
///
/// # Contract
///
/// - `save` validates first; nothing is persisted for a rejected record
/// - a record carrying `INITIAL_IDENTIFIER_VALUE` gets a fresh id, any other
///   id is an upsert
/// - a fresh id is above every id the backend has stored or handed out, so a
///   deleted id is not handed out again by the same instance; only `sql`
///   keeps that guarantee across restarts
/// - `load` may run alongside `save` and `delete`; it can return a snapshot
///   that misses a concurrent write but never undoes one
/// - `delete` of an unknown id succeeds and returns `false`
/// - `load` returns every readable record ordered by id, publishing one
///   `ServiceLoaded` event each; unreadable records are skipped and logged
///
/// # Implementations
///
/// `memory`, `json`, `yaml`, `sql`, `directory`
#[async_trait]
pub trait ServiceRegistry: Send + Sync + std::fmt::Debug {
    /// Persist a registration and return it with its assigned id
    async fn save(&self, service: RegisteredService) -> Result<RegisteredService>;

    /// Remove a registration; `true` when something was removed
    async fn delete(&self, service: &RegisteredService) -> Result<bool>;

    /// Every stored registration, ordered by id
    async fn load(&self) -> Result<Vec<RegisteredService>>;

    /// Registration by id
    async fn find_service_by_id(&self, id: i64) -> Result<Option<RegisteredService>>;

    /// Winning registration whose pattern matches `service_id`
    ///
    /// Lookups never publish events.
    async fn find_service_by_service_id(&self, service_id: &str) -> Result<Option<RegisteredService>>;

    /// Number of stored registrations
    async fn size(&self) -> Result<u64>;

    /// Get the name/identifier of this provider implementation
    fn provider_name(&self) -> &str;
}

//! Application service interfaces

use async_trait::async_trait;
use svcreg_domain::entities::RegisteredService;
use svcreg_domain::error::Result;

/// Predicate used to select services from the loaded snapshot
pub type ServicePredicate<'a> = &'a (dyn Fn(&RegisteredService) -> bool + Send + Sync);

/// Services manager interface
///
/// Fronts a `ServiceRegistry` with a cached snapshot and applies expiration
/// rules on every lookup.
#[async_trait]
pub trait ServicesManagerInterface: Send + Sync {
    /// Reload every service from the registry; returns how many were kept
    async fn load(&self) -> Result<usize>;

    /// Persist a service and refresh the snapshot
    async fn save(&self, service: RegisteredService) -> Result<RegisteredService>;

    /// Remove a service by id, returning it when it existed
    async fn delete(&self, id: i64) -> Result<Option<RegisteredService>>;

    /// Winning service for a requesting URL
    async fn find_service_by(&self, service_id: &str) -> Result<Option<RegisteredService>>;

    /// Service by id
    async fn find_service_by_id(&self, id: i64) -> Result<Option<RegisteredService>>;

    /// Whether some service covers the requesting URL
    async fn matches_existing_service(&self, service_id: &str) -> Result<bool>;

    /// Every service in evaluation order
    fn get_all_services(&self) -> Vec<RegisteredService>;

    /// Services satisfying `predicate`, in evaluation order
    fn find_services_by(&self, predicate: ServicePredicate<'_>) -> Vec<RegisteredService>;

    /// Number of services in the snapshot
    fn count(&self) -> usize;
}

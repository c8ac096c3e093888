//! In-Memory Service Registry
//!
//! Process-local registry backed by a concurrent map. Contents are lost on
//! restart; useful for tests and for seeding from another source.
//!
//! Ids are never reused within one instance, even after the newest service
//! is deleted.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use svcreg_application::ports::registry::{
    SERVICE_REGISTRY_PROVIDERS, ServiceRegistryProviderConfig, ServiceRegistryProviderEntry,
};
use svcreg_domain::entities::{RegisteredService, find_first_match};
use svcreg_domain::error::Result;
use svcreg_domain::events::{DomainEvent, SharedEventPublisher};
use svcreg_domain::ports::ServiceRegistry;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Registry keeping services in a `DashMap`
#[derive(Debug)]
pub struct InMemoryServiceRegistry {
    services: DashMap<i64, RegisteredService>,
    /// Serializes id assignment
    id_lock: Mutex<()>,
    /// Highest id ever stored
    last_id: AtomicI64,
    publisher: SharedEventPublisher,
}

impl InMemoryServiceRegistry {
    /// Create an empty registry
    pub fn new(publisher: SharedEventPublisher) -> Self {
        Self {
            services: DashMap::new(),
            id_lock: Mutex::new(()),
            last_id: AtomicI64::new(0),
            publisher,
        }
    }

    /// Create a registry pre-filled with services (ids are kept as given)
    pub fn with_services(
        publisher: SharedEventPublisher,
        services: impl IntoIterator<Item = RegisteredService>,
    ) -> Self {
        let registry = Self::new(publisher);
        for service in services {
            registry.last_id.fetch_max(service.id, Ordering::AcqRel);
            registry.services.insert(service.id, service);
        }
        registry
    }

    fn next_id(&self) -> i64 {
        self.services
            .iter()
            .map(|entry| *entry.key())
            .fold(self.last_id.load(Ordering::Acquire), i64::max)
            .max(0)
            + 1
    }

    fn sorted(&self) -> Vec<RegisteredService> {
        let mut services: Vec<RegisteredService> =
            self.services.iter().map(|entry| entry.value().clone()).collect();
        services.sort_by_key(|s| s.id);
        services
    }
}

#[async_trait]
impl ServiceRegistry for InMemoryServiceRegistry {
    async fn save(&self, mut service: RegisteredService) -> Result<RegisteredService> {
        service.validate()?;
        let _guard = self.id_lock.lock().await;
        if service.is_new() {
            service.id = self.next_id();
        }
        debug!(id = service.id, name = %service.name, "Saving service in memory");
        self.last_id.fetch_max(service.id, Ordering::AcqRel);
        self.services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn delete(&self, service: &RegisteredService) -> Result<bool> {
        Ok(self.services.remove(&service.id).is_some())
    }

    async fn load(&self) -> Result<Vec<RegisteredService>> {
        let services = self.sorted();
        for service in &services {
            if let Err(e) = self.publisher.publish(DomainEvent::loaded(service)).await {
                warn!(id = service.id, error = %e, "Failed to publish load event");
            }
        }
        Ok(services)
    }

    async fn find_service_by_id(&self, id: i64) -> Result<Option<RegisteredService>> {
        Ok(self.services.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_service_by_service_id(&self, service_id: &str) -> Result<Option<RegisteredService>> {
        let services = self.sorted();
        Ok(find_first_match(&services, service_id).cloned())
    }

    async fn size(&self) -> Result<u64> {
        Ok(self.services.len() as u64)
    }

    fn provider_name(&self) -> &str {
        "memory"
    }
}

#[linkme::distributed_slice(SERVICE_REGISTRY_PROVIDERS)]
static MEMORY_REGISTRY: ServiceRegistryProviderEntry = ServiceRegistryProviderEntry {
    name: "memory",
    description: "Process-local registry backed by a concurrent map",
    factory: memory_registry_factory,
};

fn memory_registry_factory(
    _config: &ServiceRegistryProviderConfig,
    publisher: SharedEventPublisher,
) -> std::result::Result<Arc<dyn ServiceRegistry>, String> {
    Ok(Arc::new(InMemoryServiceRegistry::new(publisher)))
}

//! Services Manager Use Case
//!
//! Serves registered services from an in-memory snapshot filled by the
//! configured `ServiceRegistry`. Reads are lock-free; every write and every
//! refresh goes through a single async mutex and then swaps the snapshot.
//!
//! Expiration is enforced here, never in the registries:
//!
//! | State | Lookup result |
//! |-------|---------------|
//! | not expired | the service |
//! | expired, `delete_when_expired` | `None`; the service is deleted from the registry |
//! | expired, kept | a copy with service access disabled |

use crate::ports::services::{ServicePredicate, ServicesManagerInterface};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use svcreg_domain::entities::RegisteredService;
use svcreg_domain::error::Result;
use svcreg_domain::events::{DomainEvent, SharedEventPublisher};
use svcreg_domain::ports::ServiceRegistry;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Clone)]
struct CompiledService {
    pattern: Regex,
    service: Arc<RegisteredService>,
}

/// Immutable view of the loaded services
#[derive(Default)]
struct ServiceSnapshot {
    by_id: HashMap<i64, Arc<RegisteredService>>,
    /// Services with a usable pattern, sorted by evaluation order then id
    ordered: Vec<CompiledService>,
}

impl ServiceSnapshot {
    fn build(services: Vec<Arc<RegisteredService>>) -> Self {
        let mut snapshot = Self::default();
        for service in services {
            snapshot.insert(service);
        }
        snapshot.sort();
        snapshot
    }

    fn insert(&mut self, service: Arc<RegisteredService>) {
        match service.compile_pattern() {
            Ok(pattern) => self.ordered.push(CompiledService {
                pattern,
                service: Arc::clone(&service),
            }),
            Err(e) => warn!(
                id = service.id,
                name = %service.name,
                error = %e,
                "Service pattern does not compile; it will never match"
            ),
        }
        self.by_id.insert(service.id, service);
    }

    fn sort(&mut self) {
        self.ordered
            .sort_by_key(|compiled| compiled.service.evaluation_key());
    }

    fn with(&self, service: Arc<RegisteredService>) -> Self {
        let mut next = self.without(service.id);
        next.insert(service);
        next.sort();
        next
    }

    fn without(&self, id: i64) -> Self {
        let mut by_id = self.by_id.clone();
        by_id.remove(&id);
        Self {
            by_id,
            ordered: self
                .ordered
                .iter()
                .filter(|compiled| compiled.service.id != id)
                .cloned()
                .collect(),
        }
    }

    fn find(&self, url: &str) -> Option<&Arc<RegisteredService>> {
        self.ordered
            .iter()
            .find(|compiled| compiled.pattern.is_match(url))
            .map(|compiled| &compiled.service)
    }

    fn sorted(&self) -> Vec<&Arc<RegisteredService>> {
        let mut services: Vec<_> = self.by_id.values().collect();
        services.sort_by_key(|service| service.evaluation_key());
        services
    }
}

/// Cached, expiration-aware front of a service registry
pub struct ServicesManager {
    registry: Arc<dyn ServiceRegistry>,
    publisher: SharedEventPublisher,
    snapshot: ArcSwap<ServiceSnapshot>,
    write_lock: Mutex<()>,
}

impl ServicesManager {
    /// Create a manager with an empty snapshot; call `load` to fill it
    pub fn new(registry: Arc<dyn ServiceRegistry>, publisher: SharedEventPublisher) -> Self {
        Self {
            registry,
            publisher,
            snapshot: ArcSwap::from_pointee(ServiceSnapshot::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Underlying registry
    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    /// Reload the snapshot every `interval` until `cancel` fires
    ///
    /// A failed reload is logged and the previous snapshot stays in place.
    pub fn spawn_reload_task(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the caller already loaded.
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("Service reload task stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = manager.load().await {
                            warn!(error = %e, "Periodic service reload failed");
                        }
                    }
                }
            }
        })
    }

    async fn publish(&self, event: DomainEvent) {
        if let Err(e) = self.publisher.publish(event).await {
            warn!(error = %e, "Failed to publish registry event");
        }
    }

    /// Apply the expiration rules to a candidate found in the snapshot
    async fn resolve(&self, candidate: Arc<RegisteredService>) -> Result<Option<RegisteredService>> {
        let now = Utc::now();
        if !candidate.is_expired_at(now) {
            return Ok(Some(candidate.as_ref().clone()));
        }
        if candidate.should_delete_when_expired(now) {
            self.evict_expired(&candidate).await?;
            return Ok(None);
        }
        debug!(
            id = candidate.id,
            name = %candidate.name,
            "Service expired; returning it with access disabled"
        );
        Ok(Some(candidate.with_access_disabled()))
    }

    async fn evict_expired(&self, service: &RegisteredService) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        // A concurrent save may have replaced the record since it was read.
        let current = self.snapshot.load_full();
        let still_expired = current
            .by_id
            .get(&service.id)
            .is_some_and(|s| s.should_delete_when_expired(Utc::now()));
        if !still_expired {
            return Ok(());
        }

        info!(id = service.id, name = %service.name, "Deleting expired service");
        self.registry.delete(service).await?;
        self.snapshot.store(Arc::new(current.without(service.id)));
        self.publish(DomainEvent::expired(service)).await;
        Ok(())
    }

    fn present(service: &RegisteredService) -> Option<RegisteredService> {
        let now = Utc::now();
        if service.should_delete_when_expired(now) {
            None
        } else if service.is_expired_at(now) {
            Some(service.with_access_disabled())
        } else {
            Some(service.clone())
        }
    }
}

#[async_trait]
impl ServicesManagerInterface for ServicesManager {
    async fn load(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let services = self.registry.load().await?;
        let now = Utc::now();
        let mut kept = Vec::with_capacity(services.len());
        for service in services {
            if !service.should_delete_when_expired(now) {
                kept.push(Arc::new(service));
                continue;
            }
            info!(id = service.id, name = %service.name, "Deleting expired service");
            match self.registry.delete(&service).await {
                Ok(_) => self.publish(DomainEvent::expired(&service)).await,
                Err(e) => warn!(id = service.id, error = %e, "Failed to delete expired service"),
            }
        }

        let count = kept.len();
        self.snapshot.store(Arc::new(ServiceSnapshot::build(kept)));
        info!(
            count,
            registry = self.registry.provider_name(),
            "Loaded registered services"
        );
        Ok(count)
    }

    async fn save(&self, service: RegisteredService) -> Result<RegisteredService> {
        let _guard = self.write_lock.lock().await;

        let saved = self.registry.save(service).await?;
        let current = self.snapshot.load();
        self.snapshot
            .store(Arc::new(current.with(Arc::new(saved.clone()))));
        debug!(id = saved.id, name = %saved.name, "Saved service");
        self.publish(DomainEvent::saved(&saved)).await;
        Ok(saved)
    }

    async fn delete(&self, id: i64) -> Result<Option<RegisteredService>> {
        let _guard = self.write_lock.lock().await;

        let current = self.snapshot.load_full();
        let existing = match current.by_id.get(&id) {
            Some(service) => Some(service.as_ref().clone()),
            None => self.registry.find_service_by_id(id).await?,
        };
        let Some(service) = existing else {
            debug!(id, "Nothing to delete");
            return Ok(None);
        };

        self.registry.delete(&service).await?;
        self.snapshot.store(Arc::new(current.without(id)));
        self.publish(DomainEvent::deleted(&service)).await;
        Ok(Some(service))
    }

    async fn find_service_by(&self, service_id: &str) -> Result<Option<RegisteredService>> {
        let snapshot = self.snapshot.load_full();
        match snapshot.find(service_id) {
            Some(candidate) => self.resolve(Arc::clone(candidate)).await,
            None => Ok(None),
        }
    }

    async fn find_service_by_id(&self, id: i64) -> Result<Option<RegisteredService>> {
        let candidate = self.snapshot.load().by_id.get(&id).cloned();
        match candidate {
            Some(candidate) => self.resolve(candidate).await,
            None => Ok(None),
        }
    }

    async fn matches_existing_service(&self, service_id: &str) -> Result<bool> {
        Ok(self.find_service_by(service_id).await?.is_some())
    }

    fn get_all_services(&self) -> Vec<RegisteredService> {
        self.snapshot
            .load()
            .sorted()
            .into_iter()
            .filter_map(|service| Self::present(service))
            .collect()
    }

    fn find_services_by(&self, predicate: ServicePredicate<'_>) -> Vec<RegisteredService> {
        self.get_all_services()
            .into_iter()
            .filter(|service| predicate(service))
            .collect()
    }

    fn count(&self) -> usize {
        self.snapshot.load().by_id.len()
    }
}

//! Directory Service Registry
//!
//! Maps services onto directory entries under a base DN:
//!
//! | Attribute | Value |
//! |-----------|-------|
//! | dn | `uid={id},{base_dn}` |
//! | objectClass | `top`, `registeredService` |
//! | uid | service id |
//! | cn | service name |
//! | serviceId | service pattern |
//! | description | full record as JSON |
//!
//! All traffic goes through the [`DirectoryConnection`] port. The `directory`
//! provider entry wires an [`InMemoryDirectory`]; other connections can be
//! passed to [`DirectoryServiceRegistry::new`].
//!
//! New ids come from the raw `uid` of every service entry, readable or not,
//! and from the ids this instance handed out before.

pub mod in_memory;

pub use in_memory::InMemoryDirectory;

use crate::constants::{
    DIRECTORY_BODY_ATTRIBUTE, DIRECTORY_DEFAULT_BASE_DN, DIRECTORY_ID_ATTRIBUTE,
    DIRECTORY_NAME_ATTRIBUTE, DIRECTORY_OBJECT_CLASS, DIRECTORY_OBJECT_CLASS_ATTRIBUTE,
    DIRECTORY_SERVICE_ID_ATTRIBUTE,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use svcreg_application::ports::registry::{
    SERVICE_REGISTRY_PROVIDERS, ServiceRegistryProviderConfig, ServiceRegistryProviderEntry,
};
use svcreg_domain::entities::{RegisteredService, find_first_match};
use svcreg_domain::error::{Error, Result};
use svcreg_domain::events::{DomainEvent, SharedEventPublisher};
use svcreg_domain::ports::{DirectoryConnection, DirectoryEntry, DirectoryFilter};
use svcreg_domain::ports::ServiceRegistry;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Service registry stored as directory entries
#[derive(Debug)]
pub struct DirectoryServiceRegistry {
    connection: Arc<dyn DirectoryConnection>,
    base_dn: String,
    write_lock: Mutex<()>,
    last_id: AtomicI64,
    publisher: SharedEventPublisher,
}

impl DirectoryServiceRegistry {
    /// Create a registry over `connection`, storing entries below `base_dn`
    pub fn new(
        connection: Arc<dyn DirectoryConnection>,
        base_dn: impl Into<String>,
        publisher: SharedEventPublisher,
    ) -> Self {
        Self {
            connection,
            base_dn: base_dn.into(),
            write_lock: Mutex::new(()),
            last_id: AtomicI64::new(0),
            publisher,
        }
    }

    /// Base DN holding the service entries
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// DN of the entry for service `id`
    pub fn dn_for(&self, id: i64) -> String {
        format!("{DIRECTORY_ID_ATTRIBUTE}={id},{}", self.base_dn)
    }

    fn object_class_filter() -> DirectoryFilter {
        DirectoryFilter::equals(DIRECTORY_OBJECT_CLASS_ATTRIBUTE, DIRECTORY_OBJECT_CLASS)
    }

    /// Filter selecting the entry of service `id`
    pub fn id_filter(id: i64) -> DirectoryFilter {
        DirectoryFilter::And(vec![
            Self::object_class_filter(),
            DirectoryFilter::equals(DIRECTORY_ID_ATTRIBUTE, id.to_string()),
        ])
    }

    /// Filter selecting every service entry that carries a pattern
    pub fn services_filter() -> DirectoryFilter {
        DirectoryFilter::And(vec![
            Self::object_class_filter(),
            DirectoryFilter::Present(DIRECTORY_SERVICE_ID_ATTRIBUTE.to_string()),
        ])
    }

    /// Map a service onto its directory entry
    pub fn to_entry(&self, service: &RegisteredService) -> Result<DirectoryEntry> {
        let body = serde_json::to_string(service)?;
        Ok(DirectoryEntry::new(self.dn_for(service.id))
            .with_attribute(DIRECTORY_OBJECT_CLASS_ATTRIBUTE, "top")
            .with_attribute(DIRECTORY_OBJECT_CLASS_ATTRIBUTE, DIRECTORY_OBJECT_CLASS)
            .with_attribute(DIRECTORY_ID_ATTRIBUTE, service.id.to_string())
            .with_attribute(DIRECTORY_NAME_ATTRIBUTE, service.name.clone())
            .with_attribute(DIRECTORY_SERVICE_ID_ATTRIBUTE, service.service_id.clone())
            .with_attribute(DIRECTORY_BODY_ATTRIBUTE, body))
    }

    /// Rebuild a service from its directory entry
    pub fn from_entry(entry: &DirectoryEntry) -> Result<RegisteredService> {
        let body = entry.first_value(DIRECTORY_BODY_ATTRIBUTE).ok_or_else(|| {
            Error::serialization(format!(
                "entry {} has no {DIRECTORY_BODY_ATTRIBUTE} attribute",
                entry.dn
            ))
        })?;
        let mut service: RegisteredService = serde_json::from_str(body)?;
        if let Some(id) = entry
            .first_value(DIRECTORY_ID_ATTRIBUTE)
            .and_then(|uid| uid.parse().ok())
        {
            service.id = id;
        }
        Ok(service)
    }

    /// Highest `uid` among all service entries, including ones that fail to decode
    async fn highest_stored_id(&self) -> Result<Option<i64>> {
        let entries = self
            .connection
            .search(&self.base_dn, &Self::object_class_filter())
            .await?;
        Ok(entries
            .iter()
            .filter_map(|entry| entry.first_value(DIRECTORY_ID_ATTRIBUTE))
            .filter_map(|uid| uid.parse::<i64>().ok())
            .max())
    }

    /// Every decodable service, ordered by id
    async fn read_all(&self) -> Result<Vec<RegisteredService>> {
        let entries = self
            .connection
            .search(&self.base_dn, &Self::services_filter())
            .await?;
        let mut services: Vec<RegisteredService> = entries
            .iter()
            .filter_map(|entry| match Self::from_entry(entry) {
                Ok(service) => Some(service),
                Err(e) => {
                    warn!(dn = %entry.dn, error = %e, "Skipping malformed service entry");
                    None
                }
            })
            .collect();
        services.sort_by_key(|s| s.id);
        Ok(services)
    }
}

#[async_trait]
impl ServiceRegistry for DirectoryServiceRegistry {
    async fn save(&self, mut service: RegisteredService) -> Result<RegisteredService> {
        service.validate()?;
        let _guard = self.write_lock.lock().await;

        if service.is_new() {
            let highest = self
                .highest_stored_id()
                .await?
                .unwrap_or(0)
                .max(self.last_id.load(Ordering::Acquire));
            service.id = highest.max(0) + 1;
        }

        let entry = self.to_entry(&service)?;
        if self.connection.lookup(&entry.dn).await?.is_some() {
            debug!(dn = %entry.dn, "Updating service entry");
            self.connection.modify(entry).await?;
        } else {
            debug!(dn = %entry.dn, "Adding service entry");
            self.connection.add(entry).await?;
        }
        self.last_id.fetch_max(service.id, Ordering::AcqRel);
        Ok(service)
    }

    async fn delete(&self, service: &RegisteredService) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        self.connection.delete(&self.dn_for(service.id)).await
    }

    async fn load(&self) -> Result<Vec<RegisteredService>> {
        let services = self.read_all().await?;
        for service in &services {
            if let Err(e) = self.publisher.publish(DomainEvent::loaded(service)).await {
                warn!(id = service.id, error = %e, "Failed to publish load event");
            }
        }
        Ok(services)
    }

    async fn find_service_by_id(&self, id: i64) -> Result<Option<RegisteredService>> {
        let entries = self
            .connection
            .search(&self.base_dn, &Self::id_filter(id))
            .await?;
        entries.first().map(Self::from_entry).transpose()
    }

    async fn find_service_by_service_id(&self, service_id: &str) -> Result<Option<RegisteredService>> {
        let services = self.read_all().await?;
        Ok(find_first_match(&services, service_id).cloned())
    }

    async fn size(&self) -> Result<u64> {
        let entries = self
            .connection
            .search(&self.base_dn, &Self::services_filter())
            .await?;
        Ok(entries.len() as u64)
    }

    fn provider_name(&self) -> &str {
        "directory"
    }
}

#[linkme::distributed_slice(SERVICE_REGISTRY_PROVIDERS)]
static DIRECTORY_REGISTRY: ServiceRegistryProviderEntry = ServiceRegistryProviderEntry {
    name: "directory",
    description: "Directory entries under a base DN (in-process directory)",
    factory: directory_registry_factory,
};

fn directory_registry_factory(
    config: &ServiceRegistryProviderConfig,
    publisher: SharedEventPublisher,
) -> std::result::Result<Arc<dyn ServiceRegistry>, String> {
    let base_dn = config
        .base_dn
        .clone()
        .unwrap_or_else(|| DIRECTORY_DEFAULT_BASE_DN.to_string());
    Ok(Arc::new(DirectoryServiceRegistry::new(
        Arc::new(InMemoryDirectory::new()),
        base_dn,
        publisher,
    )))
}

//! Resource-Based Service Registries
//!
//! One file per service, named `{name}-{id}.{ext}`, inside a single
//! directory. JSON and YAML share everything except the codec.
//!
//! ## Writes
//!
//! Writers hold an async mutex, write `.{file}.tmp` next to the target and
//! rename it into place. Files for the same id under an older name are
//! removed after the rename. Temporary files are never loaded.
//!
//! `load` and the watcher take the same mutex before touching the cache, so
//! a scan never overwrites a save that finished after it started.
//!
//! New ids are one above the highest id on disk, in the cache, or handed out
//! earlier by this instance. Deleting the newest service does not free its id
//! until the registry is reopened.
//!
//! ## Watching
//!
//! With `watch` enabled, a notify watcher keeps the in-memory cache in step
//! with files edited outside the process (see [`watcher`]).

mod watcher;

use crate::constants::{
    JSON_EXTENSION, TEMP_FILE_PREFIX, TEMP_FILE_SUFFIX, YAML_EXTENSION, YAML_EXTENSION_ALT,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use svcreg_application::ports::registry::{
    SERVICE_REGISTRY_PROVIDERS, ServiceRegistryProviderConfig, ServiceRegistryProviderEntry,
};
use svcreg_domain::entities::{RegisteredService, find_first_match};
use svcreg_domain::error::{Error, Result};
use svcreg_domain::events::{DomainEvent, SharedEventPublisher};
use svcreg_domain::ports::ServiceRegistry;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use watcher::WatcherHandle;

/// On-disk encoding of service definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFormat {
    /// Pretty-printed JSON, `.json`
    Json,
    /// YAML, written as `.yml`, read from `.yml` and `.yaml`
    #[cfg(feature = "registry-yaml")]
    Yaml,
}

impl ResourceFormat {
    /// Extension used for new files
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => JSON_EXTENSION,
            #[cfg(feature = "registry-yaml")]
            Self::Yaml => YAML_EXTENSION,
        }
    }

    /// Whether a file with this extension belongs to the format
    pub fn accepts(self, extension: &str) -> bool {
        match self {
            Self::Json => extension.eq_ignore_ascii_case(JSON_EXTENSION),
            #[cfg(feature = "registry-yaml")]
            Self::Yaml => {
                extension.eq_ignore_ascii_case(YAML_EXTENSION)
                    || extension.eq_ignore_ascii_case(YAML_EXTENSION_ALT)
            }
        }
    }

    /// Encode a service
    pub fn serialize(self, service: &RegisteredService) -> Result<String> {
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(service)?),
            #[cfg(feature = "registry-yaml")]
            Self::Yaml => serde_yaml::to_string(service)
                .map_err(|e| Error::serialization(format!("YAML encoding failed: {e}"))),
        }
    }

    /// Decode a service
    pub fn deserialize(self, body: &str) -> Result<RegisteredService> {
        match self {
            Self::Json => Ok(serde_json::from_str(body)?),
            #[cfg(feature = "registry-yaml")]
            Self::Yaml => serde_yaml::from_str(body)
                .map_err(|e| Error::serialization(format!("YAML decoding failed: {e}"))),
        }
    }

    fn provider_name(self) -> &'static str {
        match self {
            Self::Json => "json",
            #[cfg(feature = "registry-yaml")]
            Self::Yaml => "yaml",
        }
    }
}

/// Directory contents plus the cache built from them
#[derive(Debug)]
pub(crate) struct ResourceState {
    directory: PathBuf,
    format: ResourceFormat,
    services: DashMap<i64, RegisteredService>,
    /// Guards the directory and cache for writers, loads and the watcher
    write_lock: Mutex<()>,
    /// Highest id this instance has seen
    last_id: AtomicI64,
}

impl ResourceState {
    fn file_name(&self, service: &RegisteredService) -> String {
        format!("{}-{}.{}", service.name, service.id, self.format.extension())
    }

    /// Whether `path` is a definition file of this registry
    fn is_definition(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if file_name.starts_with(TEMP_FILE_PREFIX) || file_name.ends_with(TEMP_FILE_SUFFIX) {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.format.accepts(e))
    }

    /// Id encoded in a file name, `{name}-{id}.{ext}`
    fn id_from_path(path: &Path) -> Option<i64> {
        let stem = path.file_stem()?.to_str()?;
        let (_, id) = stem.rsplit_once('-')?;
        id.parse().ok()
    }

    fn read_service(&self, path: &Path) -> Result<RegisteredService> {
        let body = fs::read_to_string(path)
            .map_err(|e| Error::io_with_source(format!("failed to read {}", path.display()), e))?;
        self.format.deserialize(&body)
    }

    fn definition_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.directory).map_err(|e| {
            Error::io_with_source(format!("failed to list {}", self.directory.display()), e)
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && self.is_definition(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn files_for_id(&self, id: i64) -> Result<Vec<PathBuf>> {
        Ok(self
            .definition_files()?
            .into_iter()
            .filter(|path| Self::id_from_path(path) == Some(id))
            .collect())
    }

    /// Read every definition; unreadable files are logged and skipped
    fn scan(&self) -> Result<Vec<RegisteredService>> {
        let mut services: Vec<RegisteredService> = Vec::new();
        for path in self.definition_files()? {
            match self.read_service(&path) {
                Ok(service) => services.push(service),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable service definition"),
            }
        }
        services.sort_by_key(|s| s.id);
        services.dedup_by(|later, earlier| {
            let duplicate = later.id == earlier.id;
            if duplicate {
                warn!(id = later.id, "Several files define the same service id; keeping the first");
            }
            duplicate
        });
        Ok(services)
    }

    /// Atomically write `service` and drop older files for its id
    fn write_service(&self, service: &RegisteredService) -> Result<PathBuf> {
        let file_name = self.file_name(service);
        let target = self.directory.join(&file_name);
        let temp = self
            .directory
            .join(format!("{TEMP_FILE_PREFIX}{file_name}{TEMP_FILE_SUFFIX}"));

        let body = self.format.serialize(service)?;
        fs::write(&temp, body)
            .map_err(|e| Error::io_with_source(format!("failed to write {}", temp.display()), e))?;
        if let Err(e) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(Error::io_with_source(
                format!("failed to move {} into place", target.display()),
                e,
            ));
        }

        for stale in self.files_for_id(service.id)? {
            if stale != target {
                debug!(path = %stale.display(), "Removing stale service definition");
                fs::remove_file(&stale).map_err(|e| {
                    Error::io_with_source(format!("failed to remove {}", stale.display()), e)
                })?;
            }
        }
        Ok(target)
    }

    fn remove_service(&self, id: i64) -> Result<bool> {
        let files = self.files_for_id(id)?;
        for path in &files {
            fs::remove_file(path).map_err(|e| {
                Error::io_with_source(format!("failed to remove {}", path.display()), e)
            })?;
        }
        Ok(!files.is_empty())
    }

    fn replace_cache(&self, services: &[RegisteredService]) {
        for service in services {
            self.services.insert(service.id, service.clone());
        }
        self.services
            .retain(|id, _| services.iter().any(|service| service.id == *id));
    }

    fn record_id(&self, id: i64) {
        self.last_id.fetch_max(id, Ordering::AcqRel);
    }

    /// Unreadable files still reserve the id in their name
    fn next_id(&self) -> Result<i64> {
        let on_disk = self
            .definition_files()?
            .iter()
            .filter_map(|path| Self::id_from_path(path))
            .max();
        let cached = self.services.iter().map(|entry| *entry.key()).max();
        let highest = on_disk
            .into_iter()
            .chain(cached)
            .fold(self.last_id.load(Ordering::Acquire), i64::max);
        Ok(highest.max(0) + 1)
    }
}

/// Run blocking file work off the async workers
async fn blocking<T, F>(state: &Arc<ResourceState>, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&ResourceState) -> Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| Error::internal(format!("file task failed: {e}")))?
}

/// Directory-of-files service registry
#[derive(Debug)]
pub struct ResourceServiceRegistry {
    state: Arc<ResourceState>,
    publisher: SharedEventPublisher,
    watcher: Option<WatcherHandle>,
}

impl ResourceServiceRegistry {
    /// Open (creating if needed) `directory` and read the existing definitions
    pub fn new(
        directory: impl Into<PathBuf>,
        format: ResourceFormat,
        publisher: SharedEventPublisher,
    ) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| {
            Error::io_with_source(format!("failed to create {}", directory.display()), e)
        })?;

        let state = Arc::new(ResourceState {
            directory,
            format,
            services: DashMap::new(),
            write_lock: Mutex::new(()),
            last_id: AtomicI64::new(0),
        });
        let services = state.scan()?;
        state.replace_cache(&services);
        if let Some(highest) = services.iter().map(|s| s.id).max() {
            state.record_id(highest);
        }
        info!(
            directory = %state.directory.display(),
            format = format.provider_name(),
            count = services.len(),
            "Opened resource service registry"
        );

        Ok(Self {
            state,
            publisher,
            watcher: None,
        })
    }

    /// Start watching the directory; requires a running tokio runtime
    pub fn with_watch(mut self) -> Result<Self> {
        self.watcher = Some(watcher::spawn(Arc::clone(&self.state))?);
        Ok(self)
    }

    /// Directory holding the definitions
    pub fn directory(&self) -> &Path {
        &self.state.directory
    }

    /// Whether a watcher is attached
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    fn sorted(&self) -> Vec<RegisteredService> {
        let mut services: Vec<RegisteredService> = self
            .state
            .services
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        services.sort_by_key(|s| s.id);
        services
    }
}

#[async_trait]
impl ServiceRegistry for ResourceServiceRegistry {
    async fn save(&self, service: RegisteredService) -> Result<RegisteredService> {
        service.validate()?;
        let _guard = self.state.write_lock.lock().await;
        let (service, path) = blocking(&self.state, move |state| {
            let mut service = service;
            if service.is_new() {
                service.id = state.next_id()?;
            }
            let path = state.write_service(&service)?;
            state.record_id(service.id);
            Ok((service, path))
        })
        .await?;
        debug!(id = service.id, path = %path.display(), "Saved service definition");

        self.state.services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn delete(&self, service: &RegisteredService) -> Result<bool> {
        let _guard = self.state.write_lock.lock().await;
        let id = service.id;
        let removed_file = blocking(&self.state, move |state| state.remove_service(id)).await?;
        let removed_cached = self.state.services.remove(&id).is_some();
        Ok(removed_file || removed_cached)
    }

    async fn load(&self) -> Result<Vec<RegisteredService>> {
        let services = {
            let _guard = self.state.write_lock.lock().await;
            let services = blocking(&self.state, ResourceState::scan).await?;
            self.state.replace_cache(&services);
            services
        };
        for service in &services {
            if let Err(e) = self.publisher.publish(DomainEvent::loaded(service)).await {
                warn!(id = service.id, error = %e, "Failed to publish load event");
            }
        }
        Ok(services)
    }

    async fn find_service_by_id(&self, id: i64) -> Result<Option<RegisteredService>> {
        Ok(self.state.services.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_service_by_service_id(&self, service_id: &str) -> Result<Option<RegisteredService>> {
        let services = self.sorted();
        Ok(find_first_match(&services, service_id).cloned())
    }

    async fn size(&self) -> Result<u64> {
        Ok(self.state.services.len() as u64)
    }

    fn provider_name(&self) -> &str {
        self.state.format.provider_name()
    }
}

fn open_resource_registry(
    config: &ServiceRegistryProviderConfig,
    publisher: SharedEventPublisher,
    format: ResourceFormat,
) -> std::result::Result<Arc<dyn ServiceRegistry>, String> {
    let location = config.location.clone().ok_or_else(|| {
        format!(
            "The {} service registry requires a location",
            format.provider_name()
        )
    })?;
    let mut registry = ResourceServiceRegistry::new(location, format, publisher)
        .map_err(|e| format!("Failed to open service directory: {e}"))?;
    if config.watch {
        tokio::runtime::Handle::try_current()
            .map_err(|_| "Watching a service directory requires a tokio runtime".to_string())?;
        registry = registry
            .with_watch()
            .map_err(|e| format!("Failed to watch service directory: {e}"))?;
    }
    Ok(Arc::new(registry))
}

#[cfg(feature = "registry-json")]
#[linkme::distributed_slice(SERVICE_REGISTRY_PROVIDERS)]
static JSON_REGISTRY: ServiceRegistryProviderEntry = ServiceRegistryProviderEntry {
    name: "json",
    description: "One JSON file per service in a directory, optionally watched",
    factory: json_registry_factory,
};

#[cfg(feature = "registry-json")]
fn json_registry_factory(
    config: &ServiceRegistryProviderConfig,
    publisher: SharedEventPublisher,
) -> std::result::Result<Arc<dyn ServiceRegistry>, String> {
    open_resource_registry(config, publisher, ResourceFormat::Json)
}

#[cfg(feature = "registry-yaml")]
#[linkme::distributed_slice(SERVICE_REGISTRY_PROVIDERS)]
static YAML_REGISTRY: ServiceRegistryProviderEntry = ServiceRegistryProviderEntry {
    name: "yaml",
    description: "One YAML file per service in a directory, optionally watched",
    factory: yaml_registry_factory,
};

#[cfg(feature = "registry-yaml")]
fn yaml_registry_factory(
    config: &ServiceRegistryProviderConfig,
    publisher: SharedEventPublisher,
) -> std::result::Result<Arc<dyn ServiceRegistry>, String> {
    open_resource_registry(config, publisher, ResourceFormat::Yaml)
}

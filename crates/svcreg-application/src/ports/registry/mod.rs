//! Provider Registry System
//!
//! Defines the auto-registration infrastructure for plugin providers.
//! Uses the `linkme` crate for compile-time registration of providers
//! that can be discovered and instantiated at runtime.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Provider Registration Flow                    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  1. Provider defines:  #[linkme::distributed_slice(PROVIDERS)]  │
//! │                        static ENTRY: ProviderEntry = ...        │
//! │                              ↓                                  │
//! │  2. Registry declares: #[linkme::distributed_slice]             │
//! │                        pub static PROVIDERS: [Entry] = [..]     │
//! │                              ↓                                  │
//! │  3. Resolver queries:  PROVIDERS.iter()                         │
//! │                              ↓                                  │
//! │  4. Config selects:    "provider = json" → JsonServiceRegistry  │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Registering a Backend (in svcreg-providers)
//!
//! ```ignore
//! use svcreg_application::ports::registry::{ServiceRegistryProviderEntry, SERVICE_REGISTRY_PROVIDERS};
//!
//! #[linkme::distributed_slice(SERVICE_REGISTRY_PROVIDERS)]
//! static MEMORY_REGISTRY: ServiceRegistryProviderEntry = ServiceRegistryProviderEntry {
//!     name: "memory",
//!     description: "In-memory registry",
//!     factory: |_config, publisher| Ok(Arc::new(InMemoryServiceRegistry::new(publisher))),
//! };
//! ```
//!
//! ### Resolving a Backend (in svcreg-infrastructure)
//!
//! ```ignore
//! use svcreg_application::ports::registry::resolve_service_registry_provider;
//!
//! let config = ServiceRegistryProviderConfig::new("json").with_location("/etc/svcreg/services");
//! let registry = resolve_service_registry_provider(&config, publisher)?;
//! ```

pub mod remote_access;
pub mod service_registry;

pub use remote_access::{
    REMOTE_ACCESS_PROVIDERS, RemoteAccessProviderConfig, RemoteAccessProviderEntry,
    list_remote_access_providers, resolve_remote_access_provider,
};
pub use service_registry::{
    SERVICE_REGISTRY_PROVIDERS, ServiceRegistryFactory, ServiceRegistryProviderConfig,
    ServiceRegistryProviderEntry, list_service_registry_providers,
    resolve_service_registry_provider,
};

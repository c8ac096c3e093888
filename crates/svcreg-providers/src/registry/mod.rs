//! Service Registry Backends
//!
//! Every backend registers itself in `SERVICE_REGISTRY_PROVIDERS` and is
//! selected by name from configuration.
//!
//! | Name | Type | Medium |
//! |------|------|--------|
//! | `memory` | InMemoryServiceRegistry | Process memory |
//! | `json` | ResourceServiceRegistry | One `.json` file per service |
//! | `yaml` | ResourceServiceRegistry | One `.yml` file per service |
//! | `sql` | SqlServiceRegistry | SQLite through sqlx |
//! | `directory` | DirectoryServiceRegistry | Directory entries under a base DN |

#[cfg(feature = "registry-directory")]
pub mod directory;
#[cfg(feature = "registry-memory")]
pub mod memory;
#[cfg(any(feature = "registry-json", feature = "registry-yaml"))]
pub mod resource;
#[cfg(feature = "registry-sql")]
pub mod sql;

#[cfg(feature = "registry-directory")]
pub use directory::{DirectoryServiceRegistry, InMemoryDirectory};
#[cfg(feature = "registry-memory")]
pub use memory::InMemoryServiceRegistry;
#[cfg(any(feature = "registry-json", feature = "registry-yaml"))]
pub use resource::{ResourceFormat, ResourceServiceRegistry};
#[cfg(feature = "registry-sql")]
pub use sql::SqlServiceRegistry;

//! # svcreg - Provider Implementations
//!
//! User-selectable implementations of the ports defined in `svcreg-domain`.
//! Each implementation registers itself in a linkme slice declared by
//! `svcreg-application`, so linking this crate is enough to make it
//! resolvable by name.
//!
//! ## Provider Categories
//!
//! | Category | Port | Implementations |
//! |----------|------|-----------------|
//! | Registry | `ServiceRegistry` | memory, json, yaml, sql, directory |
//! | Events | `EventPublisher` | Tokio, Null |
//! | Remote access | `RemoteAccessCheckProvider` | Http, Null |
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! svcreg-providers = { version = "0.1", default-features = false, features = ["registry-json"] }
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use svcreg_providers::events::TokioEventPublisher;
//! use svcreg_providers::registry::{ResourceFormat, ResourceServiceRegistry};
//! ```

// Re-export svcreg-domain types commonly used with providers
pub use svcreg_domain::error::{Error, Result};
pub use svcreg_domain::ports::{DirectoryConnection, RemoteAccessCheckProvider, ServiceRegistry};

/// Provider-specific constants
pub mod constants;

/// Event publisher implementations
///
/// Implements the `EventPublisher` port.
pub mod events;

/// Service registry backends
///
/// Implements the `ServiceRegistry` port for each storage medium.
pub mod registry;

/// Remote access check implementations
///
/// Implements the `RemoteAccessCheckProvider` port.
pub mod remote_access;

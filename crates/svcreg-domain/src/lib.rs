//! # svcreg Domain
//!
//! Core types of the authentication-service registry: registered services,
//! the policies attached to them, and the ports that outer layers implement.
//!
//! ## Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`entities`] | [`RegisteredService`], [`Principal`] |
//! | [`policies`] | Access, attribute release, expiration, multifactor, username |
//! | [`persistent_id`] | Shibboleth-compatible persistent identifiers |
//! | [`events`] | Lifecycle events and the publisher port |
//! | [`ports`] | Registry, directory and remote access ports |
//! | [`value_objects`] | Contacts, properties, keys, proxy policy |
//!
//! ## Example
//!
//! ```
//! use svcreg_domain::entities::{Principal, RegisteredService};
//! use svcreg_domain::policies::AttributeReleasePolicy;
//!
//! let service = RegisteredService::new(r"https://app\.example\.org/.*", "App")
//!     .with_attribute_release_policy(AttributeReleasePolicy::return_allowed(["mail"]));
//! assert!(service.matches("https://app.example.org/login"));
//!
//! let principal = Principal::new("alice")
//!     .with_attribute("mail", "alice@example.org")
//!     .with_attribute("phone", "555-0100");
//! let released = service
//!     .attribute_release_policy
//!     .get_attributes(&principal, &service.name);
//! assert_eq!(released.len(), 1);
//! ```

/// Domain layer constants
pub mod constants;
/// Domain entities
pub mod entities;
/// Error handling types
pub mod error;
/// Domain events
pub mod events;
/// Persistent identifier generation
pub mod persistent_id;
/// Service policies
pub mod policies;
/// Port interfaces
pub mod ports;
/// Value objects
pub mod value_objects;

pub use entities::{Attributes, Principal, RegisteredService};
pub use error::{Error, Result};
pub use persistent_id::PersistentIdGenerator;

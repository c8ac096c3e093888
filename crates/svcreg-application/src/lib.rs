//! Application Layer - svcreg
//!
//! Use cases and provider registries of the authentication-service registry,
//! arranged according to Clean Architecture principles.
//!
//! ## Use Cases
//!
//! - [`ServicesManager`]: cached, expiration-aware access to registered services
//!
//! ## Ports (Interfaces)
//!
//! - `ports::registry::*`: linkme registries for registry backends and remote access checkers
//! - `ports::services::*`: use case interfaces
//!
//! ## Dependencies
//!
//! This crate depends only on:
//! - `svcreg-domain`: entities, policies and port traits
//! - Pure Rust libraries for async, snapshots and logging

pub mod ports;
pub mod use_cases;

pub use ports::*;
pub use use_cases::*;

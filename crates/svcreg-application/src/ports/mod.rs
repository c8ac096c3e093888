//! Application Ports
//!
//! - **registry/** - linkme provider registries (registry backends, remote access checkers)
//! - **services** - use case interfaces

pub mod registry;
pub mod services;

pub use services::{ServicePredicate, ServicesManagerInterface};

//! # svcreg
//!
//! Registry of the services allowed to use an authentication server.
//!
//! A registered service is matched against request URLs by a regular
//! expression and carries the policies applied at authentication time:
//! access strategy, attribute release, expiration, multifactor and the
//! username presented to the service.
//!
//! ## Example
//!
//! ```ignore
//! use svcreg::infrastructure::{ConfigLoader, bootstrap};
//! use svcreg::domain::Principal;
//!
//! let config = ConfigLoader::new().load()?;
//! let ctx = bootstrap(config).await?;
//! let decision = ctx
//!     .evaluate("https://app.example.org/login", &Principal::new("alice"))
//!     .await?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - entities, policies, persistent ids, errors and ports
//! - `application` - services manager and provider registries
//! - `providers` - storage backends, remote access checkers, event publishers
//! - `infrastructure` - configuration, logging and bootstrap

/// Domain layer - entities, policies and ports
pub mod domain {
    pub use svcreg_domain::*;
}

/// Application layer - services manager and provider registries
pub mod application {
    pub use svcreg_application::*;
}

/// Provider implementations
pub mod providers {
    pub use svcreg_providers::*;
}

/// Infrastructure layer - configuration, logging and bootstrap
pub mod infrastructure {
    pub use svcreg_infrastructure::*;
}

pub mod cli;

pub use domain::*;
pub use infrastructure::{AppContext, bootstrap};

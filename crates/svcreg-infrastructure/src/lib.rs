//! # Infrastructure Layer
//!
//! Cross-cutting concerns and wiring for svcreg.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Figment-based configuration (defaults, TOML, environment) |
//! | [`logging`] | tracing subscriber setup with optional rolling file |
//! | [`error_ext`] | Context helpers mapping foreign errors to domain errors |
//! | [`bootstrap`] | Resolves providers and starts the services manager |
//! | [`constants`] | Infrastructure defaults |

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error_ext;
pub mod logging;

pub use bootstrap::{AccessDecision, AppContext, bootstrap};
pub use config::{AppConfig, ConfigLoader};
pub use error_ext::ErrorContext;

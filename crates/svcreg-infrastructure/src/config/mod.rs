//! Configuration
//!
//! [`AppConfig`] is assembled by [`ConfigLoader`] from defaults, a TOML file
//! and `SVCREG__*` environment variables.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::*;

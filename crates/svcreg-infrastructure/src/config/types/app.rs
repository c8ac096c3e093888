//! Main application configuration

use super::{AccessConfig, LoggingConfig, ManagerConfig, RegistryConfig};
use serde::{Deserialize, Serialize};

/// Root configuration, one table per section of `svcreg.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging output
    pub logging: LoggingConfig,
    /// Service registry backend
    pub registry: RegistryConfig,
    /// Services manager refresh
    pub manager: ManagerConfig,
    /// Remote access checks
    pub access: AccessConfig,
}

//! Configuration types module

pub mod access;
pub mod app;
pub mod logging;
pub mod manager;
pub mod registry;

pub use access::AccessConfig;
pub use app::AppConfig;
pub use logging::LoggingConfig;
pub use manager::ManagerConfig;
pub use registry::RegistryConfig;

//! Use case implementations

pub mod services_manager;

pub use services_manager::ServicesManager;

//! Domain Port Interfaces
//!
//! Boundary contracts between the domain and the outer layers. Providers
//! implement them; the application layer depends only on the traits.

/// External service provider ports
pub mod providers;

pub use providers::{
    DirectoryConnection, DirectoryEntry, DirectoryFilter, RemoteAccessCheckProvider,
    ServiceRegistry,
};

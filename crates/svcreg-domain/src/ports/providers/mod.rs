//! External Provider Ports
//!
//! | Port | Description |
//! |------|-------------|
//! | ServiceRegistry | Persistence of registered services |
//! | DirectoryConnection | LDAP-shaped entry store used by the directory backend |
//! | RemoteAccessCheckProvider | HTTP decision endpoint for access strategies |

/// Directory connection port
pub mod directory;
/// Remote access check port
pub mod remote_access;
/// Service registry port
pub mod service_registry;

pub use directory::{DirectoryConnection, DirectoryEntry, DirectoryFilter, escape_filter_value};
pub use remote_access::RemoteAccessCheckProvider;
pub use service_registry::ServiceRegistry;

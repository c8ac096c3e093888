//! Domain Value Objects
//!
//! | Value Object | Description |
//! |--------------|-------------|
//! | [`ServiceContact`] | Person responsible for a service |
//! | [`ServiceProperty`] | Multi-valued custom property |
//! | [`ServicePublicKey`] | Key used to encrypt released values |
//! | [`ProxyPolicy`] | Proxy ticket permissions |

/// Auxiliary service metadata
pub mod service_metadata;

pub use service_metadata::{ProxyPolicy, ServiceContact, ServiceProperty, ServicePublicKey};

//! Remote Access Check Providers
//!
//! | Provider | Description |
//! |----------|-------------|
//! | HttpRemoteAccessCheckProvider | reqwest GET against the decision endpoint |
//! | NullRemoteAccessCheckProvider | Always fails, so remote strategies deny |

#[cfg(feature = "remote-http")]
pub mod http;
pub mod null;

#[cfg(feature = "remote-http")]
pub use http::HttpRemoteAccessCheckProvider;
pub use null::NullRemoteAccessCheckProvider;

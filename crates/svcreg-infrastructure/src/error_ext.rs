//! Error extension utilities
//!
//! Infrastructure code talks to figment, toml and the file system. These
//! helpers lift their errors into the domain [`Error`], prefixing a message
//! and keeping the original error as the source where the variant has one.

use std::fmt;
use svcreg_domain::error::{Error, Result};

/// Attach a message to a foreign error and pick the domain variant
///
/// ```ignore
/// use svcreg_infrastructure::error_ext::ErrorContext;
///
/// let body = std::fs::read_to_string(&path)
///     .io_context(format!("Failed to read {}", path.display()))?;
/// ```
pub trait ErrorContext<T> {
    /// Unexpected failure (`Error::Internal`)
    fn context(self, message: impl fmt::Display) -> Result<T>;

    /// File system failure (`Error::Io`)
    fn io_context(self, message: impl fmt::Display) -> Result<T>;

    /// Unreadable or inconsistent settings (`Error::Configuration`)
    fn config_context(self, message: impl fmt::Display) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl fmt::Display) -> Result<T> {
        self.map_err(|err| Error::internal(format!("{message}: {err}")))
    }

    fn io_context(self, message: impl fmt::Display) -> Result<T> {
        self.map_err(|err| Error::io_with_source(format!("{message}: {err}"), err))
    }

    fn config_context(self, message: impl fmt::Display) -> Result<T> {
        self.map_err(|err| Error::configuration_with_source(format!("{message}: {err}"), err))
    }
}

/// Turn a missing value into `Error::NotFound`
pub trait OptionExt<T> {
    /// `resource` names what was looked up, e.g. `registered service 7`
    fn or_not_found(self, resource: impl fmt::Display) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, resource: impl fmt::Display) -> Result<T> {
        self.ok_or_else(|| Error::not_found(resource.to_string()))
    }
}

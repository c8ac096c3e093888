//! Registration expiration

use super::time::parse_instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// When a registration stops being valid and what happens then
///
/// Only the services manager consults this policy; registries store it verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationPolicy {
    /// RFC 3339 instant or `YYYY-MM-DD` (midnight UTC); absent never expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    /// Remove the registration once it has expired
    pub delete_when_expired: bool,
    /// Notify the service contacts when the registration is removed
    pub notify_when_deleted: bool,
}

impl ExpirationPolicy {
    /// Create a policy expiring at `expiration_date`
    pub fn new(expiration_date: impl Into<String>, delete_when_expired: bool) -> Self {
        Self {
            expiration_date: Some(expiration_date.into()),
            delete_when_expired,
            notify_when_deleted: false,
        }
    }

    /// Parsed expiration instant
    pub fn expiration_instant(&self) -> Option<DateTime<Utc>> {
        self.expiration_date.as_deref().and_then(parse_instant)
    }

    /// Whether the registration has expired at `now`
    ///
    /// A date that cannot be parsed is logged and treated as "not expired".
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let Some(raw) = self.expiration_date.as_deref().filter(|d| !d.trim().is_empty()) else {
            return false;
        };
        match parse_instant(raw) {
            Some(expires) => now >= expires,
            None => {
                warn!(value = raw, "Unparseable expiration date; treating as not expired");
                false
            }
        }
    }

    /// Whether the registration has expired now
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

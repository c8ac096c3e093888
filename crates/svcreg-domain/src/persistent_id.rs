//! Shibboleth-compatible persistent identifiers
//!
//! Derives a stable, per-service, non-reversible identifier for a principal.
//! The digest is SHA-1 because existing identifiers must keep their format;
//! it is not a security choice.

use crate::constants::{PERSISTENT_ID_SALT_LENGTH, PERSISTENT_ID_SEPARATOR};
use crate::entities::Principal;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::sync::OnceLock;
use tracing::debug;

/// Persistent id generator following the Shibboleth algorithm
///
/// The salt is initialized at most once. A generator created without a salt
/// picks a random one on its first `generate` call and keeps it, so ids are
/// only reproducible across instances if that salt is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GeneratorRecord", into = "GeneratorRecord")]
pub struct PersistentIdGenerator {
    salt: OnceLock<String>,
    attribute: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct GeneratorRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attribute: Option<String>,
}

impl From<GeneratorRecord> for PersistentIdGenerator {
    fn from(record: GeneratorRecord) -> Self {
        let salt = OnceLock::new();
        if let Some(value) = record.salt.filter(|s| !s.trim().is_empty()) {
            let _ = salt.set(value);
        }
        Self {
            salt,
            attribute: record.attribute,
        }
    }
}

impl From<PersistentIdGenerator> for GeneratorRecord {
    fn from(generator: PersistentIdGenerator) -> Self {
        Self {
            salt: generator.salt.get().cloned(),
            attribute: generator.attribute,
        }
    }
}

impl PersistentIdGenerator {
    /// Create a generator with a fixed salt (blank means "generate lazily")
    pub fn new(salt: impl Into<String>) -> Self {
        Self::from(GeneratorRecord {
            salt: Some(salt.into()),
            attribute: None,
        })
    }

    /// Use the given principal attribute instead of the principal id
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Current salt, if one has been set or generated
    pub fn salt(&self) -> Option<&str> {
        self.salt.get().map(String::as_str)
    }

    /// Principal attribute used as the identifier source
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Generate the persistent id of `principal_id` for `service_id`
    ///
    /// A blank `service_id` is left out of the digest.
    pub fn generate(&self, principal_id: &str, service_id: &str) -> String {
        let salt = self.salt.get_or_init(random_salt);
        debug!(
            principal = principal_id,
            service = service_id,
            "Generating persistent identifier"
        );

        let mut hasher = Sha1::new();
        if !service_id.trim().is_empty() {
            hasher.update(service_id.as_bytes());
            hasher.update([PERSISTENT_ID_SEPARATOR]);
        }
        hasher.update(principal_id.as_bytes());
        hasher.update([PERSISTENT_ID_SEPARATOR]);
        hasher.update(salt.replace('\n', " ").as_bytes());

        STANDARD.encode(hasher.finalize())
    }

    /// Generate the persistent id for a principal, honoring the configured attribute
    pub fn generate_for_principal(&self, principal: &Principal, service_id: &str) -> String {
        let principal_id = self
            .attribute
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .and_then(|name| principal.first_value(name))
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(principal.id.as_str());
        self.generate(principal_id, service_id)
    }
}

fn random_salt() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PERSISTENT_ID_SALT_LENGTH)
        .map(char::from)
        .collect()
}

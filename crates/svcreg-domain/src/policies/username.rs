//! Username attribute providers
//!
//! Decide which identifier a service sees for the authenticated principal.

use crate::entities::Principal;
use crate::persistent_id::PersistentIdGenerator;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Case transformation applied to a resolved username
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CanonicalizationMode {
    /// Leave as-is
    #[default]
    None,
    /// Upper-case
    Upper,
    /// Lower-case
    Lower,
}

impl CanonicalizationMode {
    /// Apply the transformation
    pub fn apply(self, value: &str) -> String {
        match self {
            Self::None => value.to_string(),
            Self::Upper => value.to_uppercase(),
            Self::Lower => value.to_lowercase(),
        }
    }
}

/// Username released to a service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UsernameAttributeProvider {
    /// The principal id
    #[default]
    Default,
    /// The first value of a principal attribute
    PrincipalAttribute {
        /// Attribute to read
        username_attribute: String,
        /// Case transformation
        #[serde(default)]
        canonicalization_mode: CanonicalizationMode,
    },
    /// A persistent pseudonymous identifier
    Anonymous {
        /// Identifier generator
        #[serde(default)]
        persistent_id_generator: PersistentIdGenerator,
    },
}

impl UsernameAttributeProvider {
    /// Username `service_id` should see for `principal`
    pub fn resolve_username(&self, principal: &Principal, service_id: &str) -> String {
        match self {
            Self::Default => principal.id.clone(),
            Self::PrincipalAttribute {
                username_attribute,
                canonicalization_mode,
            } => {
                let value = principal.first_value(username_attribute).unwrap_or_else(|| {
                    warn!(
                        principal = %principal.id,
                        attribute = %username_attribute,
                        "Username attribute missing; using the principal id"
                    );
                    principal.id.as_str()
                });
                canonicalization_mode.apply(value)
            }
            Self::Anonymous {
                persistent_id_generator,
            } => {
                let id = persistent_id_generator.generate_for_principal(principal, service_id);
                debug!(service = service_id, "Resolved anonymous username");
                id
            }
        }
    }
}

//! Consent metadata carried by attribute release policies
//!
//! The registry stores and exposes consent settings but never prompts for
//! consent; the web flow decides what to do with them.

use crate::entities::Attributes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which released attributes need user consent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentPolicy {
    /// Whether consent is requested at all
    pub enabled: bool,
    /// Attributes never shown on the consent screen
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub excluded_attributes: BTreeSet<String>,
    /// When non-empty, only these attributes are shown
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub included_attributes: BTreeSet<String>,
}

impl Default for ConsentPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            excluded_attributes: BTreeSet::new(),
            included_attributes: BTreeSet::new(),
        }
    }
}

impl ConsentPolicy {
    /// Names of released attributes that should be put to the user
    pub fn consentable_attributes<'a>(&self, released: &'a Attributes) -> BTreeSet<&'a str> {
        if !self.enabled {
            return BTreeSet::new();
        }
        released
            .keys()
            .filter(|name| !self.excluded_attributes.contains(*name))
            .filter(|name| {
                self.included_attributes.is_empty() || self.included_attributes.contains(*name)
            })
            .map(String::as_str)
            .collect()
    }
}

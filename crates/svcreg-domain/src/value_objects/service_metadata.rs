//! Auxiliary service metadata
//!
//! Stored with a registration and returned verbatim; none of these values
//! influence policy evaluation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Person or team responsible for a service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceContact {
    /// Contact name
    pub name: String,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Department
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Multi-valued custom property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceProperty {
    /// Property values
    pub values: BTreeSet<String>,
}

impl ServiceProperty {
    /// Build a property from values
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Smallest value, if any
    pub fn first_value(&self) -> Option<&str> {
        self.values.iter().next().map(String::as_str)
    }
}

/// Public key used to encrypt values released to the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePublicKey {
    /// Where the key material lives (file path or URL)
    pub location: String,
    /// Key algorithm
    #[serde(default = "default_key_algorithm")]
    pub algorithm: String,
}

fn default_key_algorithm() -> String {
    "RSA".to_string()
}

/// Whether a service may obtain proxy tickets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProxyPolicy {
    /// Proxying is refused
    #[default]
    Refuse,
    /// Proxying allowed for callback URLs matching a pattern
    Regex {
        /// Callback URL pattern (complete, case-insensitive match)
        pattern: String,
    },
}

impl ProxyPolicy {
    /// Whether `callback_url` may receive a proxy-granting ticket
    pub fn is_allowed_to_proxy(&self, callback_url: &str) -> bool {
        match self {
            Self::Refuse => false,
            Self::Regex { pattern } => Regex::new(&format!("(?i)^(?:{pattern})$"))
                .map(|regex| regex.is_match(callback_url))
                .unwrap_or(false),
        }
    }
}

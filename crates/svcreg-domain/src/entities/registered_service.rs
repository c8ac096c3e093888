//! Registered service entity

use crate::constants::{DEFAULT_EVALUATION_ORDER, INITIAL_IDENTIFIER_VALUE, SERVICE_NAME_PATTERN};
use crate::error::{Error, Result};
use crate::policies::{
    AccessStrategy, AttributeReleasePolicy, ExpirationPolicy, MultifactorPolicy,
    UsernameAttributeProvider,
};
use crate::value_objects::{ProxyPolicy, ServiceContact, ServiceProperty, ServicePublicKey};
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A client application allowed to use the authentication server
///
/// `service_id` is a regular expression matched against the complete
/// requesting URL, case-insensitively. When several registrations match,
/// the lowest `evaluation_order` wins and equal orders fall back to the
/// lowest `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredService {
    /// Registry-assigned key; `INITIAL_IDENTIFIER_VALUE` until first saved
    #[serde(default = "initial_identifier")]
    pub id: i64,
    /// URL pattern
    pub service_id: String,
    /// Display name, also used in storage identifiers
    pub name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// UI theme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Information page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_url: Option<String>,
    /// Privacy statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_url: Option<String>,
    /// Single logout endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logout_url: Option<String>,
    /// Rank among overlapping patterns (lower wins)
    #[serde(default = "default_evaluation_order")]
    pub evaluation_order: i32,
    /// Access strategy
    #[serde(default)]
    pub access_strategy: AccessStrategy,
    /// Attribute release policy
    #[serde(default)]
    pub attribute_release_policy: AttributeReleasePolicy,
    /// Registration expiration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_policy: Option<ExpirationPolicy>,
    /// Multifactor requirements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multifactor_policy: Option<MultifactorPolicy>,
    /// Username released to the service
    #[serde(default)]
    pub username_attribute_provider: UsernameAttributeProvider,
    /// Proxy ticket permissions
    #[serde(default)]
    pub proxy_policy: ProxyPolicy,
    /// Key for encrypting released values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<ServicePublicKey>,
    /// Responsible contacts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<ServiceContact>,
    /// Custom properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ServiceProperty>,
    /// Authentication handlers that must succeed for this service
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required_handlers: BTreeSet<String>,
}

fn initial_identifier() -> i64 {
    INITIAL_IDENTIFIER_VALUE
}

fn default_evaluation_order() -> i32 {
    DEFAULT_EVALUATION_ORDER
}

impl RegisteredService {
    /// Create an unsaved registration with default policies
    pub fn new(service_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: INITIAL_IDENTIFIER_VALUE,
            service_id: service_id.into(),
            name: name.into(),
            description: None,
            theme: None,
            information_url: None,
            privacy_url: None,
            logout_url: None,
            evaluation_order: DEFAULT_EVALUATION_ORDER,
            access_strategy: AccessStrategy::default(),
            attribute_release_policy: AttributeReleasePolicy::default(),
            expiration_policy: None,
            multifactor_policy: None,
            username_attribute_provider: UsernameAttributeProvider::default(),
            proxy_policy: ProxyPolicy::default(),
            public_key: None,
            contacts: Vec::new(),
            properties: BTreeMap::new(),
            required_handlers: BTreeSet::new(),
        }
    }

    /// Set the identifier
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Set the evaluation order
    pub fn with_evaluation_order(mut self, order: i32) -> Self {
        self.evaluation_order = order;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the access strategy
    pub fn with_access_strategy(mut self, strategy: impl Into<AccessStrategy>) -> Self {
        self.access_strategy = strategy.into();
        self
    }

    /// Set the attribute release policy
    pub fn with_attribute_release_policy(mut self, policy: AttributeReleasePolicy) -> Self {
        self.attribute_release_policy = policy;
        self
    }

    /// Set the expiration policy
    pub fn with_expiration_policy(mut self, policy: ExpirationPolicy) -> Self {
        self.expiration_policy = Some(policy);
        self
    }

    /// Set the multifactor policy
    pub fn with_multifactor_policy(mut self, policy: MultifactorPolicy) -> Self {
        self.multifactor_policy = Some(policy);
        self
    }

    /// Set the username provider
    pub fn with_username_attribute_provider(mut self, provider: UsernameAttributeProvider) -> Self {
        self.username_attribute_provider = provider;
        self
    }

    /// Add a custom property
    pub fn with_property(mut self, name: impl Into<String>, property: ServiceProperty) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Whether the registration has never been saved
    pub fn is_new(&self) -> bool {
        self.id == INITIAL_IDENTIFIER_VALUE
    }

    /// Compile `service_id` as an anchored, case-insensitive pattern
    pub fn compile_pattern(&self) -> Result<Regex> {
        Ok(RegexBuilder::new(&format!("^(?:{})$", self.service_id))
            .case_insensitive(true)
            .build()?)
    }

    /// Whether `url` is covered by this registration
    ///
    /// An uncompilable pattern matches nothing.
    pub fn matches(&self, url: &str) -> bool {
        self.compile_pattern()
            .map(|regex| regex.is_match(url))
            .unwrap_or(false)
    }

    /// Reject definitions that must never reach storage
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::validation("service name must not be blank"));
        }
        if name.contains("..") || !Regex::new(SERVICE_NAME_PATTERN)?.is_match(&self.name) {
            return Err(Error::validation(format!(
                "service name '{}' must start with a letter, digit or '_' and may only contain letters, digits, spaces, '_', '-' and '.'",
                self.name
            )));
        }
        if self.service_id.trim().is_empty() {
            return Err(Error::validation("service id pattern must not be blank"));
        }
        self.compile_pattern().map_err(|e| {
            Error::validation(format!("service id '{}' is not a valid pattern: {e}", self.service_id))
        })?;
        Ok(())
    }

    /// Whether the expiration policy reports expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_policy
            .as_ref()
            .is_some_and(|policy| policy.is_expired_at(now))
    }

    /// Whether the registration is expired and must be removed
    pub fn should_delete_when_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_policy
            .as_ref()
            .is_some_and(|policy| policy.delete_when_expired && policy.is_expired_at(now))
    }

    /// Copy with service access switched off, other fields untouched
    pub fn with_access_disabled(&self) -> Self {
        let mut copy = self.clone();
        copy.access_strategy = self.access_strategy.disabled();
        copy
    }

    /// Sort key used when choosing among overlapping patterns
    pub fn evaluation_key(&self) -> (i32, i64) {
        (self.evaluation_order, self.id)
    }
}

/// Sort registrations by evaluation order, then id
pub fn sort_by_evaluation_order<S: std::borrow::Borrow<RegisteredService>>(services: &mut [S]) {
    services.sort_by_key(|s| s.borrow().evaluation_key());
}

/// The winning registration for `url` among `services`
pub fn find_first_match<'a, I>(services: I, url: &str) -> Option<&'a RegisteredService>
where
    I: IntoIterator<Item = &'a RegisteredService>,
{
    services
        .into_iter()
        .filter(|s| s.matches(url))
        .min_by_key(|s| s.evaluation_key())
}

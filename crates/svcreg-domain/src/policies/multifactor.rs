//! Multifactor authentication requirements per service

use crate::entities::Principal;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Behavior when a required multifactor provider is unavailable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FailureMode {
    /// Deny authentication
    #[default]
    Closed,
    /// Continue without the second factor
    Open,
    /// Continue and pretend the factor was satisfied
    Phantom,
    /// No failure handling configured
    None,
}

/// Second-factor requirements of a service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultifactorPolicy {
    /// Identifiers of the providers that may satisfy the requirement
    pub multifactor_authentication_providers: BTreeSet<String>,
    /// Behavior when a provider is unreachable
    pub failure_mode: FailureMode,
    /// Principal attribute that triggers the requirement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_attribute_name_trigger: Option<String>,
    /// Pattern the trigger attribute value must match completely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_attribute_value_to_match: Option<String>,
    /// Allow principals to bypass the requirement
    pub bypass_enabled: bool,
}

impl MultifactorPolicy {
    /// Require one of the given providers
    pub fn new<I, V>(providers: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            multifactor_authentication_providers: providers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Only trigger when `attribute` has a value matching `pattern`
    pub fn with_trigger(mut self, attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.principal_attribute_name_trigger = Some(attribute.into());
        self.principal_attribute_value_to_match = Some(pattern.into());
        self
    }

    /// Whether multifactor authentication applies to `principal`
    pub fn should_trigger(&self, principal: &Principal) -> bool {
        let Some(attribute) = self
            .principal_attribute_name_trigger
            .as_deref()
            .filter(|a| !a.trim().is_empty())
        else {
            return !self.multifactor_authentication_providers.is_empty() && !self.bypass_enabled;
        };

        let pattern = self.principal_attribute_value_to_match.as_deref().unwrap_or(".*");
        let regex = match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(regex) => regex,
            Err(e) => {
                warn!(attribute, error = %e, "Invalid multifactor trigger pattern");
                return self.failure_mode == FailureMode::Closed;
            }
        };
        let triggered = principal
            .attributes
            .get(attribute)
            .is_some_and(|values| values.iter().any(|v| regex.is_match(v)));
        debug!(principal = %principal.id, attribute, triggered, "Evaluated multifactor trigger");
        triggered
    }
}

//! Attribute Release Policies
//!
//! Decide which principal attributes a service receives. Every policy first
//! selects attributes, then runs the optional value filter; attributes left
//! without values are never released.

use super::attribute_filter::AttributeFilter;
use super::consent::ConsentPolicy;
use crate::entities::{Attributes, Principal};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Settings shared by every release policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseOptions {
    /// Value filter applied after selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_filter: Option<AttributeFilter>,
    /// Consent metadata (advisory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_policy: Option<ConsentPolicy>,
    /// Service may receive the user's password
    pub authorized_to_release_credential_password: bool,
    /// Service may receive a proxy-granting ticket
    pub authorized_to_release_proxy_granting_ticket: bool,
}

/// Releases everything the principal carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnAllAttributeReleasePolicy {
    /// Shared settings
    #[serde(flatten)]
    pub options: ReleaseOptions,
}

/// Releases an allow-list of attribute names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnAllowedAttributeReleasePolicy {
    /// Shared settings
    #[serde(flatten)]
    pub options: ReleaseOptions,
    /// Names released as-is
    pub allowed_attributes: BTreeSet<String>,
}

/// Releases attributes under new names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnMappedAttributeReleasePolicy {
    /// Shared settings
    #[serde(flatten)]
    pub options: ReleaseOptions,
    /// Source attribute to one or more released names
    #[serde(deserialize_with = "deserialize_mapping")]
    pub allowed_attributes: BTreeMap<String, Vec<String>>,
}

/// Releases nothing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenyAllAttributeReleasePolicy {
    /// Shared settings
    #[serde(flatten)]
    pub options: ReleaseOptions,
}

/// Attribute release policy attached to a registered service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeReleasePolicy {
    /// Release all attributes
    ReturnAll(ReturnAllAttributeReleasePolicy),
    /// Release allow-listed attributes
    ReturnAllowed(ReturnAllowedAttributeReleasePolicy),
    /// Release renamed attributes
    ReturnMapped(ReturnMappedAttributeReleasePolicy),
    /// Release nothing
    DenyAll(DenyAllAttributeReleasePolicy),
}

impl Default for AttributeReleasePolicy {
    fn default() -> Self {
        Self::ReturnAllowed(ReturnAllowedAttributeReleasePolicy::default())
    }
}

impl AttributeReleasePolicy {
    /// Release everything
    pub fn return_all() -> Self {
        Self::ReturnAll(ReturnAllAttributeReleasePolicy::default())
    }

    /// Release the named attributes
    pub fn return_allowed<I, V>(names: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self::ReturnAllowed(ReturnAllowedAttributeReleasePolicy {
            options: ReleaseOptions::default(),
            allowed_attributes: names.into_iter().map(Into::into).collect(),
        })
    }

    /// Release attributes renamed through `mapping`
    pub fn return_mapped(mapping: BTreeMap<String, Vec<String>>) -> Self {
        Self::ReturnMapped(ReturnMappedAttributeReleasePolicy {
            options: ReleaseOptions::default(),
            allowed_attributes: mapping,
        })
    }

    /// Release nothing
    pub fn deny_all() -> Self {
        Self::DenyAll(DenyAllAttributeReleasePolicy::default())
    }

    /// Attach a value filter
    pub fn with_filter(mut self, filter: AttributeFilter) -> Self {
        self.options_mut().attribute_filter = Some(filter);
        self
    }

    /// Attach consent metadata
    pub fn with_consent_policy(mut self, consent: ConsentPolicy) -> Self {
        self.options_mut().consent_policy = Some(consent);
        self
    }

    /// Shared settings
    pub fn options(&self) -> &ReleaseOptions {
        match self {
            Self::ReturnAll(p) => &p.options,
            Self::ReturnAllowed(p) => &p.options,
            Self::ReturnMapped(p) => &p.options,
            Self::DenyAll(p) => &p.options,
        }
    }

    fn options_mut(&mut self) -> &mut ReleaseOptions {
        match self {
            Self::ReturnAll(p) => &mut p.options,
            Self::ReturnAllowed(p) => &mut p.options,
            Self::ReturnMapped(p) => &mut p.options,
            Self::DenyAll(p) => &mut p.options,
        }
    }

    /// Consent metadata, if any
    pub fn consent_policy(&self) -> Option<&ConsentPolicy> {
        self.options().consent_policy.as_ref()
    }

    /// Attributes `service_name` may receive from `principal`
    ///
    /// A filter that cannot be compiled releases nothing.
    pub fn get_attributes(&self, principal: &Principal, service_name: &str) -> Attributes {
        let selected = self.select(&principal.attributes);
        let released = match &self.options().attribute_filter {
            Some(filter) => match filter.filter(selected) {
                Ok(filtered) => filtered,
                Err(e) => {
                    warn!(service = service_name, error = %e, "Attribute filter failed; releasing nothing");
                    Attributes::new()
                }
            },
            None => selected,
        };
        let released: Attributes = released
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .collect();

        debug!(
            service = service_name,
            principal = %principal.id,
            released = released.len(),
            "Computed released attributes"
        );
        released
    }

    fn select(&self, attributes: &Attributes) -> Attributes {
        match self {
            Self::ReturnAll(_) => attributes.clone(),
            Self::ReturnAllowed(p) => attributes
                .iter()
                .filter(|(name, _)| p.allowed_attributes.contains(*name))
                .map(|(name, values)| (name.clone(), values.clone()))
                .collect(),
            Self::ReturnMapped(p) => {
                let mut released = Attributes::new();
                for (source, targets) in &p.allowed_attributes {
                    let Some(values) = attributes.get(source) else {
                        continue;
                    };
                    for target in targets {
                        released
                            .entry(target.clone())
                            .or_default()
                            .extend(values.iter().cloned());
                    }
                }
                released
            }
            Self::DenyAll(_) => Attributes::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accepts `"target"` as shorthand for `["target"]`
fn deserialize_mapping<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, OneOrMany>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(source, targets)| {
            let targets = match targets {
                OneOrMany::One(target) => vec![target],
                OneOrMany::Many(targets) => targets,
            };
            (source, targets)
        })
        .collect())
}

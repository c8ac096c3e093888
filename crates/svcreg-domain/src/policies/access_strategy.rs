//! Access Strategies
//!
//! Decide whether a service may take part in authentication at all, whether
//! it may join single sign-on, and whether a given principal's attributes
//! qualify it for the service.
//!
//! | Strategy | Decision source |
//! |----------|-----------------|
//! | [`DefaultAccessStrategy`] | enabled/SSO flags, required and rejected attributes |
//! | [`TimeBasedAccessStrategy`] | default rules plus a `[start, end]` window |
//! | [`RemoteEndpointAccessStrategy`] | default rules plus an HTTP status check |

use crate::constants::DEFAULT_ACCEPTABLE_RESPONSE_CODES;
use crate::entities::Attributes;
use crate::policies::time::parse_instant;
use crate::ports::providers::RemoteAccessCheckProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Capability shared by every access strategy
#[async_trait]
pub trait RegisteredServiceAccessStrategy: Send + Sync {
    /// Whether the service may use the authentication server at all
    fn is_service_access_allowed(&self) -> bool;

    /// Whether the service may participate in single sign-on
    fn is_service_access_allowed_for_sso(&self) -> bool;

    /// Whether the principal's attributes grant access to the service
    ///
    /// `remote` is only consulted by strategies that delegate to an external
    /// endpoint. Any failure while evaluating denies access.
    async fn do_principal_attributes_allow_service_access(
        &self,
        principal_id: &str,
        attributes: &Attributes,
        remote: &dyn RemoteAccessCheckProvider,
    ) -> bool;

    /// Where to send the user when access is refused
    fn unauthorized_redirect_url(&self) -> Option<&str>;

    /// External identity providers this service may delegate to
    fn delegated_authentication_policy(&self) -> Option<&DelegatedAuthenticationPolicy>;
}

/// External identity providers a service may delegate authentication to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegatedAuthenticationPolicy {
    /// Names of allowed providers
    pub allowed_providers: Vec<String>,
}

impl DelegatedAuthenticationPolicy {
    /// Whether delegation to `provider` is allowed
    pub fn is_provider_allowed(&self, provider: &str) -> bool {
        self.allowed_providers.iter().any(|p| p == provider)
    }
}

/// Flag- and attribute-based access rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultAccessStrategy {
    /// Service may authenticate
    pub enabled: bool,
    /// Service may take part in SSO
    pub sso_enabled: bool,
    /// Redirect target when access is refused
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unauthorized_redirect_url: Option<String>,
    /// Every required attribute must match (otherwise any one suffices)
    pub require_all_attributes: bool,
    /// Compare attribute values ignoring case
    pub case_insensitive: bool,
    /// Attribute name to acceptable values
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub required_attributes: BTreeMap<String, BTreeSet<String>>,
    /// Attribute name to values that deny access
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub rejected_attributes: BTreeMap<String, BTreeSet<String>>,
    /// Delegated authentication restrictions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegated_authentication_policy: Option<DelegatedAuthenticationPolicy>,
}

impl Default for DefaultAccessStrategy {
    fn default() -> Self {
        Self {
            enabled: true,
            sso_enabled: true,
            unauthorized_redirect_url: None,
            require_all_attributes: true,
            case_insensitive: false,
            required_attributes: BTreeMap::new(),
            rejected_attributes: BTreeMap::new(),
            delegated_authentication_policy: None,
        }
    }
}

impl DefaultAccessStrategy {
    /// Create a strategy with explicit enabled and SSO flags
    pub fn new(enabled: bool, sso_enabled: bool) -> Self {
        Self {
            enabled,
            sso_enabled,
            ..Self::default()
        }
    }

    /// Require an attribute to carry one of the given values
    pub fn with_required_attribute<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.required_attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Deny access when an attribute carries one of the given values
    pub fn with_rejected_attribute<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.rejected_attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Evaluate required and rejected attributes against a principal
    pub fn attributes_allow_access(&self, attributes: &Attributes) -> bool {
        if self.has_rejected_attribute(attributes) {
            debug!("Principal carries a rejected attribute value");
            return false;
        }
        if self.required_attributes.is_empty() {
            return true;
        }
        if attributes.is_empty() {
            debug!("Principal has no attributes but the service requires some");
            return false;
        }

        let mut outcomes = self
            .required_attributes
            .iter()
            .map(|(name, required)| self.intersects(attributes.get(name), required));
        if self.require_all_attributes {
            outcomes.all(|ok| ok)
        } else {
            outcomes.any(|ok| ok)
        }
    }

    fn has_rejected_attribute(&self, attributes: &Attributes) -> bool {
        self.rejected_attributes
            .iter()
            .any(|(name, rejected)| self.intersects(attributes.get(name), rejected))
    }

    fn intersects(&self, values: Option<&Vec<String>>, expected: &BTreeSet<String>) -> bool {
        let Some(values) = values else {
            return false;
        };
        values.iter().any(|value| {
            expected.iter().any(|candidate| {
                if self.case_insensitive {
                    candidate.eq_ignore_ascii_case(value)
                } else {
                    candidate == value
                }
            })
        })
    }
}

/// Default rules restricted to a time window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBasedAccessStrategy {
    /// Base flag and attribute rules
    #[serde(flatten)]
    pub base: DefaultAccessStrategy,
    /// Inclusive lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_date_time: Option<String>,
    /// Inclusive upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_date_time: Option<String>,
}

impl TimeBasedAccessStrategy {
    /// Create a window strategy; either bound may be omitted
    pub fn new(starting: Option<String>, ending: Option<String>) -> Self {
        Self {
            base: DefaultAccessStrategy::default(),
            starting_date_time: starting,
            ending_date_time: ending,
        }
    }

    /// Whether `now` falls inside the configured window
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        if let Some(start) = self.starting_date_time.as_deref() {
            match parse_instant(start) {
                Some(start) if now < start => {
                    debug!(%start, "Access window has not started");
                    return false;
                }
                Some(_) => {}
                None => {
                    warn!(value = start, "Unparseable access window start; denying");
                    return false;
                }
            }
        }
        if let Some(end) = self.ending_date_time.as_deref() {
            match parse_instant(end) {
                Some(end) if now > end => {
                    debug!(%end, "Access window has ended");
                    return false;
                }
                Some(_) => {}
                None => {
                    warn!(value = end, "Unparseable access window end; denying");
                    return false;
                }
            }
        }
        true
    }
}

/// Default rules plus a decision delegated to an HTTP endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteEndpointAccessStrategy {
    /// Base flag and attribute rules
    #[serde(flatten)]
    pub base: DefaultAccessStrategy,
    /// Endpoint queried with the principal id
    pub endpoint_url: String,
    /// Comma-separated list of status codes that grant access
    pub acceptable_response_codes: String,
}

impl Default for RemoteEndpointAccessStrategy {
    fn default() -> Self {
        Self {
            base: DefaultAccessStrategy::default(),
            endpoint_url: String::new(),
            acceptable_response_codes: DEFAULT_ACCEPTABLE_RESPONSE_CODES.to_string(),
        }
    }
}

impl RemoteEndpointAccessStrategy {
    /// Create a strategy querying `endpoint_url`
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Self::default()
        }
    }

    /// Replace the accepted status codes
    pub fn with_acceptable_response_codes(mut self, codes: impl Into<String>) -> Self {
        self.acceptable_response_codes = codes.into();
        self
    }

    /// Parsed status codes; malformed entries are ignored
    pub fn acceptable_codes(&self) -> BTreeSet<u16> {
        self.acceptable_response_codes
            .split(',')
            .filter_map(|code| code.trim().parse().ok())
            .collect()
    }

    async fn endpoint_allows(&self, principal_id: &str, remote: &dyn RemoteAccessCheckProvider) -> bool {
        if self.endpoint_url.trim().is_empty() {
            warn!("Remote access strategy has no endpoint; denying");
            return false;
        }
        match remote.check(&self.endpoint_url, principal_id).await {
            Ok(status) => {
                let allowed = self.acceptable_codes().contains(&status);
                debug!(
                    endpoint = %self.endpoint_url,
                    status,
                    allowed,
                    provider = remote.provider_name(),
                    "Remote access check completed"
                );
                allowed
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint_url, error = %e, "Remote access check failed; denying");
                false
            }
        }
    }
}

/// Access strategy attached to a registered service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessStrategy {
    /// Flag- and attribute-based rules
    Default(DefaultAccessStrategy),
    /// Rules restricted to a time window
    TimeBased(TimeBasedAccessStrategy),
    /// Rules plus an external HTTP decision
    RemoteEndpoint(RemoteEndpointAccessStrategy),
}

impl Default for AccessStrategy {
    fn default() -> Self {
        Self::Default(DefaultAccessStrategy::default())
    }
}

impl From<DefaultAccessStrategy> for AccessStrategy {
    fn from(strategy: DefaultAccessStrategy) -> Self {
        Self::Default(strategy)
    }
}

impl From<TimeBasedAccessStrategy> for AccessStrategy {
    fn from(strategy: TimeBasedAccessStrategy) -> Self {
        Self::TimeBased(strategy)
    }
}

impl From<RemoteEndpointAccessStrategy> for AccessStrategy {
    fn from(strategy: RemoteEndpointAccessStrategy) -> Self {
        Self::RemoteEndpoint(strategy)
    }
}

impl AccessStrategy {
    /// Flag and attribute rules shared by all variants
    pub fn base(&self) -> &DefaultAccessStrategy {
        match self {
            Self::Default(s) => s,
            Self::TimeBased(s) => &s.base,
            Self::RemoteEndpoint(s) => &s.base,
        }
    }

    /// Mutable access to the shared rules
    pub fn base_mut(&mut self) -> &mut DefaultAccessStrategy {
        match self {
            Self::Default(s) => s,
            Self::TimeBased(s) => &mut s.base,
            Self::RemoteEndpoint(s) => &mut s.base,
        }
    }

    /// Copy of this strategy with service access switched off
    pub fn disabled(&self) -> Self {
        let mut copy = self.clone();
        copy.base_mut().enabled = false;
        copy
    }

    /// Evaluate `is_service_access_allowed` at a given instant
    pub fn is_service_access_allowed_at(&self, now: DateTime<Utc>) -> bool {
        if !self.base().enabled {
            return false;
        }
        match self {
            Self::TimeBased(s) => s.is_within_window(now),
            Self::Default(_) | Self::RemoteEndpoint(_) => true,
        }
    }
}

#[async_trait]
impl RegisteredServiceAccessStrategy for AccessStrategy {
    fn is_service_access_allowed(&self) -> bool {
        self.is_service_access_allowed_at(Utc::now())
    }

    fn is_service_access_allowed_for_sso(&self) -> bool {
        self.base().sso_enabled
    }

    async fn do_principal_attributes_allow_service_access(
        &self,
        principal_id: &str,
        attributes: &Attributes,
        remote: &dyn RemoteAccessCheckProvider,
    ) -> bool {
        if !self.base().attributes_allow_access(attributes) {
            return false;
        }
        match self {
            Self::RemoteEndpoint(s) => s.endpoint_allows(principal_id, remote).await,
            Self::Default(_) | Self::TimeBased(_) => true,
        }
    }

    fn unauthorized_redirect_url(&self) -> Option<&str> {
        self.base().unauthorized_redirect_url.as_deref()
    }

    fn delegated_authentication_policy(&self) -> Option<&DelegatedAuthenticationPolicy> {
        self.base().delegated_authentication_policy.as_ref()
    }
}

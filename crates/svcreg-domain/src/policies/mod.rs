//! Service Policies
//!
//! Rule families attached to a registered service. Each family is a
//! serde-tagged enum persisted with an explicit `"type"` discriminant.
//!
//! | Family | Entry point |
//! |--------|-------------|
//! | Access | [`AccessStrategy`] via [`RegisteredServiceAccessStrategy`] |
//! | Attribute release | [`AttributeReleasePolicy::get_attributes`] |
//! | Expiration | [`ExpirationPolicy::is_expired`] |
//! | Multifactor | [`MultifactorPolicy::should_trigger`] |
//! | Username | [`UsernameAttributeProvider::resolve_username`] |

/// Access strategies
pub mod access_strategy;
/// Attribute value filters
pub mod attribute_filter;
/// Attribute release policies
pub mod attribute_release;
/// Consent metadata
pub mod consent;
/// Registration expiration
pub mod expiration;
/// Multifactor requirements
pub mod multifactor;
/// Instant parsing
pub mod time;
/// Username providers
pub mod username;

pub use access_strategy::{
    AccessStrategy, DefaultAccessStrategy, DelegatedAuthenticationPolicy,
    RegisteredServiceAccessStrategy, RemoteEndpointAccessStrategy, TimeBasedAccessStrategy,
};
pub use attribute_filter::{AttributeFilter, MappedRegexAttributeFilter, RegexAttributeFilter};
pub use attribute_release::{
    AttributeReleasePolicy, DenyAllAttributeReleasePolicy, ReleaseOptions,
    ReturnAllAttributeReleasePolicy, ReturnAllowedAttributeReleasePolicy,
    ReturnMappedAttributeReleasePolicy,
};
pub use consent::ConsentPolicy;
pub use expiration::ExpirationPolicy;
pub use multifactor::{FailureMode, MultifactorPolicy};
pub use username::{CanonicalizationMode, UsernameAttributeProvider};

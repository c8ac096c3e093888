//! Unit tests for the registered service entity

use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use svcreg_domain::constants::INITIAL_IDENTIFIER_VALUE;
use svcreg_domain::entities::{RegisteredService, sort_by_evaluation_order};
use svcreg_domain::policies::{
    AccessStrategy, AttributeFilter, AttributeReleasePolicy, ConsentPolicy, DefaultAccessStrategy,
    ExpirationPolicy, FailureMode, MultifactorPolicy, RegexAttributeFilter,
    RemoteEndpointAccessStrategy, TimeBasedAccessStrategy, UsernameAttributeProvider,
};
use svcreg_domain::value_objects::{ProxyPolicy, ServiceContact, ServiceProperty, ServicePublicKey};
use svcreg_domain::PersistentIdGenerator;

fn fully_populated() -> RegisteredService {
    let mut service = RegisteredService::new(r"https://portal\.example\.org/.*", "Portal")
        .with_id(12)
        .with_evaluation_order(5)
        .with_description("Staff portal")
        .with_access_strategy(
            RemoteEndpointAccessStrategy::new("https://authz.example.org/check")
                .with_acceptable_response_codes("200"),
        )
        .with_attribute_release_policy(
            AttributeReleasePolicy::return_mapped(BTreeMap::from([(
                "uid".to_string(),
                vec!["username".to_string(), "login".to_string()],
            )]))
            .with_filter(AttributeFilter::Regex(RegexAttributeFilter::new(r"\w+").complete()))
            .with_consent_policy(ConsentPolicy::default()),
        )
        .with_expiration_policy(ExpirationPolicy::new("2099-12-31", true))
        .with_multifactor_policy(MultifactorPolicy {
            failure_mode: FailureMode::Open,
            ..MultifactorPolicy::new(["mfa-duo"]).with_trigger("memberOf", "admins")
        })
        .with_username_attribute_provider(UsernameAttributeProvider::Anonymous {
            persistent_id_generator: PersistentIdGenerator::new("pepper").with_attribute("uid"),
        })
        .with_property("owner", ServiceProperty::new(["it", "security"]));
    service.theme = Some("dark".to_string());
    service.logout_url = Some("https://portal.example.org/logout".to_string());
    service.proxy_policy = ProxyPolicy::Regex {
        pattern: r"https://portal\.example\.org/proxy".to_string(),
    };
    service.public_key = Some(ServicePublicKey {
        location: "/etc/keys/portal.pub".to_string(),
        algorithm: "RSA".to_string(),
    });
    service.contacts.push(ServiceContact {
        name: "Ops".to_string(),
        email: Some("ops@example.org".to_string()),
        ..ServiceContact::default()
    });
    service.required_handlers.insert("LdapHandler".to_string());
    service
}

#[test]
fn test_json_round_trip_preserves_every_field() {
    let service = fully_populated();
    let json = serde_json::to_string_pretty(&service).unwrap();
    let back: RegisteredService = serde_json::from_str(&json).unwrap();
    assert_eq!(back, service);
}

#[test]
fn test_persisted_policies_carry_type_tags() {
    let json = serde_json::to_value(fully_populated()).unwrap();
    assert_eq!(json["access_strategy"]["type"], "remote_endpoint");
    assert_eq!(json["attribute_release_policy"]["type"], "return_mapped");
    assert_eq!(
        json["attribute_release_policy"]["attribute_filter"]["type"],
        "regex"
    );
    assert_eq!(json["username_attribute_provider"]["type"], "anonymous");
    assert_eq!(json["proxy_policy"]["type"], "regex");
}

#[test]
fn test_new_service_is_unsaved() {
    let service = RegisteredService::new(".*", "Any");
    assert_eq!(service.id, INITIAL_IDENTIFIER_VALUE);
    assert!(service.is_new());
    assert!(!service.with_id(1).is_new());
}

#[test]
fn test_expiry_helpers() {
    let now = Utc::now();
    let past = (now - Duration::days(1)).to_rfc3339();

    let keep = RegisteredService::new(".*", "Keep")
        .with_expiration_policy(ExpirationPolicy::new(past.clone(), false));
    assert!(keep.is_expired_at(now));
    assert!(!keep.should_delete_when_expired(now));

    let drop = RegisteredService::new(".*", "Drop")
        .with_expiration_policy(ExpirationPolicy::new(past, true));
    assert!(drop.should_delete_when_expired(now));

    assert!(!RegisteredService::new(".*", "Forever").is_expired_at(now));
}

#[test]
fn test_sort_by_evaluation_order() {
    let mut services = vec![
        RegisteredService::new(".*", "C").with_id(3),
        RegisteredService::new(".*", "B").with_id(2).with_evaluation_order(10),
        RegisteredService::new(".*", "A").with_id(1).with_evaluation_order(10),
    ];
    sort_by_evaluation_order(&mut services);
    let ids: Vec<i64> = services.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_time_based_strategy_from_persisted_form() {
    let now = Utc::now();
    let json = serde_json::json!({
        "service_id": ".*",
        "name": "Window",
        "access_strategy": {
            "type": "time_based",
            "starting_date_time": (now + Duration::days(1)).to_rfc3339(),
            "sso_enabled": false
        }
    });
    let service: RegisteredService = serde_json::from_value(json).unwrap();
    let AccessStrategy::TimeBased(TimeBasedAccessStrategy { base, .. }) = &service.access_strategy
    else {
        panic!("expected a time based strategy");
    };
    assert_eq!(base, &DefaultAccessStrategy::new(true, false));
    assert!(!service.access_strategy.is_service_access_allowed_at(now));
    assert!(
        service
            .access_strategy
            .is_service_access_allowed_at(now + Duration::days(2))
    );
}

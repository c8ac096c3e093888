//! Storage contract shared by every registry backend

use std::collections::BTreeMap;
use std::sync::Arc;
use svcreg_domain::entities::RegisteredService;
use svcreg_domain::events::DomainEvent;
use svcreg_domain::policies::{
    AttributeReleasePolicy, DefaultAccessStrategy, ExpirationPolicy, MultifactorPolicy,
    RegexAttributeFilter, TimeBasedAccessStrategy, UsernameAttributeProvider,
};
use svcreg_domain::policies::AttributeFilter;
use svcreg_domain::ports::ServiceRegistry;
use svcreg_domain::value_objects::ServiceProperty;
use svcreg_domain::PersistentIdGenerator;
use svcreg_providers::events::TokioEventPublisher;

/// A service exercising every persisted policy family
pub fn rich_service() -> RegisteredService {
    let mut mapping = BTreeMap::new();
    mapping.insert("mail".to_string(), vec!["email".to_string()]);

    RegisteredService::new(r"https://portal\.example\.org/.*", "Employee Portal")
        .with_description("Intranet portal")
        .with_evaluation_order(10)
        .with_access_strategy(TimeBasedAccessStrategy::new(
            Some("2020-01-01T00:00:00Z".to_string()),
            None,
        ))
        .with_attribute_release_policy(
            AttributeReleasePolicy::return_mapped(mapping)
                .with_filter(AttributeFilter::Regex(RegexAttributeFilter::new(r"\w+").complete())),
        )
        .with_expiration_policy(ExpirationPolicy::new("2999-01-01T00:00:00Z", false))
        .with_multifactor_policy(MultifactorPolicy::new(["mfa-duo"]))
        .with_username_attribute_provider(UsernameAttributeProvider::Anonymous {
            persistent_id_generator: PersistentIdGenerator::new("helloworld"),
        })
        .with_property("team", ServiceProperty::new(["identity"]))
}

pub async fn save_then_find_by_id_is_equal(registry: &dyn ServiceRegistry) {
    let saved = registry.save(rich_service()).await.unwrap();
    assert!(!saved.is_new());

    let found = registry.find_service_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(found, saved);
}

pub async fn resave_keeps_one_record(registry: &dyn ServiceRegistry) {
    let mut saved = registry
        .save(RegisteredService::new(r"https://a\.example\.org/.*", "Alpha"))
        .await
        .unwrap();
    saved.description = Some("updated".to_string());
    let resaved = registry.save(saved.clone()).await.unwrap();

    assert_eq!(resaved.id, saved.id);
    assert_eq!(registry.size().await.unwrap(), 1);
    let found = registry.find_service_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(found.description.as_deref(), Some("updated"));
}

pub async fn renamed_service_keeps_one_record(registry: &dyn ServiceRegistry) {
    let mut saved = registry
        .save(RegisteredService::new(r"https://b\.example\.org/.*", "Before"))
        .await
        .unwrap();
    saved.name = "After".to_string();
    registry.save(saved.clone()).await.unwrap();

    let all = registry.load().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "After");
}

pub async fn invalid_service_is_not_persisted(registry: &dyn ServiceRegistry) {
    for invalid in [
        RegisteredService::new("(unclosed", "Broken"),
        RegisteredService::new(".*", ""),
        RegisteredService::new(".*", "../escape"),
        RegisteredService::new(".*", ".hidden"),
    ] {
        let err = registry.save(invalid).await.unwrap_err();
        assert!(err.is_validation(), "unexpected error: {err}");
    }
    assert_eq!(registry.size().await.unwrap(), 0);
    assert!(registry.load().await.unwrap().is_empty());
}

/// Names that are valid must come back after a full reload
pub async fn dotted_names_survive_reload(registry: &dyn ServiceRegistry) {
    let saved = registry
        .save(RegisteredService::new(".*", "_portal.v2.example"))
        .await
        .unwrap();

    let loaded = registry.load().await.unwrap();
    assert_eq!(loaded, vec![saved.clone()]);
    assert_eq!(registry.find_service_by_id(saved.id).await.unwrap(), Some(saved));
}

pub async fn deleted_newest_id_is_not_reused(registry: &dyn ServiceRegistry) {
    registry.save(RegisteredService::new(".*", "Older")).await.unwrap();
    let newest = registry.save(RegisteredService::new(".*", "Newest")).await.unwrap();
    assert!(registry.delete(&newest).await.unwrap());

    let fresh = registry.save(RegisteredService::new(".*", "Fresh")).await.unwrap();
    assert!(fresh.id > newest.id, "id {} was handed out again", fresh.id);
}

/// `load` running next to `save` must not lose or duplicate records
///
/// Needs a multi-threaded runtime for the two to overlap.
pub async fn concurrent_load_and_save_keep_every_record(registry: Arc<dyn ServiceRegistry>) {
    const ROUNDS: usize = 40;

    let mut saved = Vec::with_capacity(ROUNDS);
    for round in 0..ROUNDS {
        let loader = Arc::clone(&registry);
        let load = tokio::spawn(async move { loader.load().await });
        let service = registry
            .save(RegisteredService::new(".*", format!("Concurrent {round}")))
            .await
            .unwrap();
        load.await.unwrap().unwrap();
        saved.push(service);
    }

    let mut ids: Vec<i64> = saved.iter().map(|s| s.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), ROUNDS, "an id was assigned twice");

    for service in &saved {
        let found = registry.find_service_by_id(service.id).await.unwrap();
        assert_eq!(found.as_ref(), Some(service), "service {} went missing", service.id);
    }
    assert_eq!(registry.load().await.unwrap().len(), ROUNDS);
    assert_eq!(registry.size().await.unwrap(), ROUNDS as u64);
}

pub async fn delete_missing_is_noop(registry: &dyn ServiceRegistry) {
    let kept = registry
        .save(RegisteredService::new(".*", "Kept"))
        .await
        .unwrap();
    let ghost = RegisteredService::new(".*", "Ghost").with_id(9_999);

    assert!(!registry.delete(&ghost).await.unwrap());
    assert_eq!(registry.size().await.unwrap(), 1);
    assert!(registry.delete(&kept).await.unwrap());
    assert_eq!(registry.size().await.unwrap(), 0);
    assert!(registry.find_service_by_id(kept.id).await.unwrap().is_none());
}

pub async fn lower_evaluation_order_wins(registry: &dyn ServiceRegistry) {
    registry
        .save(RegisteredService::new("https://.*", "Catch All").with_evaluation_order(100))
        .await
        .unwrap();
    let specific = registry
        .save(
            RegisteredService::new(r"https://app\.example\.org/.*", "Specific")
                .with_evaluation_order(1),
        )
        .await
        .unwrap();

    let found = registry
        .find_service_by_service_id("https://app.example.org/login")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, specific.id);

    let fallback = registry
        .find_service_by_service_id("https://other.example.org/")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fallback.name, "Catch All");
    assert!(
        registry
            .find_service_by_service_id("ftp://nothing")
            .await
            .unwrap()
            .is_none()
    );
}

pub async fn load_publishes_one_event_per_record(
    registry: &dyn ServiceRegistry,
    publisher: &TokioEventPublisher,
) {
    let first = registry.save(RegisteredService::new(".*", "First")).await.unwrap();
    let second = registry.save(RegisteredService::new(".*", "Second")).await.unwrap();

    let mut events = publisher.subscribe();
    let loaded = registry.load().await.unwrap();
    assert_eq!(
        loaded.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );

    assert_eq!(events.try_recv().unwrap(), DomainEvent::loaded(&first));
    assert_eq!(events.try_recv().unwrap(), DomainEvent::loaded(&second));
    assert!(events.try_recv().is_err());
}

pub async fn disabled_access_is_persisted(registry: &dyn ServiceRegistry) {
    let saved = registry
        .save(RegisteredService::new(".*", "Disabled").with_access_strategy(DefaultAccessStrategy::new(false, false)))
        .await
        .unwrap();
    let found = registry.find_service_by_id(saved.id).await.unwrap().unwrap();
    assert!(!found.access_strategy.base().enabled);
}

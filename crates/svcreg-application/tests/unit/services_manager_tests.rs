//! ServicesManager tests

use std::sync::Arc;
use std::time::Duration;
use svcreg_application::ports::ServicesManagerInterface;
use svcreg_application::use_cases::ServicesManager;
use svcreg_domain::entities::RegisteredService;
use svcreg_domain::events::DomainEvent;
use svcreg_domain::policies::{ExpirationPolicy, RegisteredServiceAccessStrategy};
use svcreg_domain::ports::ServiceRegistry;
use svcreg_providers::events::TokioEventPublisher;
use svcreg_providers::registry::InMemoryServiceRegistry;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

struct Fixture {
    registry: Arc<InMemoryServiceRegistry>,
    manager: Arc<ServicesManager>,
    events: broadcast::Receiver<DomainEvent>,
}

fn fixture() -> Fixture {
    let publisher = TokioEventPublisher::new_shared();
    let events = publisher.subscribe();
    let registry = Arc::new(InMemoryServiceRegistry::new(publisher.clone()));
    let manager = Arc::new(ServicesManager::new(registry.clone(), publisher));
    Fixture {
        registry,
        manager,
        events,
    }
}

fn drain(events: &mut broadcast::Receiver<DomainEvent>) -> Vec<DomainEvent> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    received
}

fn expired(name: &str, delete_when_expired: bool) -> RegisteredService {
    RegisteredService::new(format!(r"https://{}\.example\.org/.*", name.to_lowercase()), name)
        .with_expiration_policy(ExpirationPolicy::new(
            "2000-01-01T00:00:00Z",
            delete_when_expired,
        ))
}

#[tokio::test]
async fn test_lower_evaluation_order_wins() {
    let f = fixture();
    f.registry
        .save(RegisteredService::new("https://.*", "Broad").with_evaluation_order(50))
        .await
        .unwrap();
    let narrow = f
        .registry
        .save(RegisteredService::new(r"https://app\.example\.org/.*", "Narrow").with_evaluation_order(5))
        .await
        .unwrap();
    assert_eq!(f.manager.load().await.unwrap(), 2);

    let found = f
        .manager
        .find_service_by("https://app.example.org/home")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, narrow.id);
    assert!(f.manager.matches_existing_service("https://other.org/").await.unwrap());
    assert!(!f.manager.matches_existing_service("ldap://other.org/").await.unwrap());
}

#[tokio::test]
async fn test_equal_order_falls_back_to_lowest_id() {
    let f = fixture();
    let first = f
        .manager
        .save(RegisteredService::new("https://.*", "First").with_evaluation_order(1))
        .await
        .unwrap();
    f.manager
        .save(RegisteredService::new("https://.*", "Second").with_evaluation_order(1))
        .await
        .unwrap();

    let found = f.manager.find_service_by("https://x").await.unwrap().unwrap();
    assert_eq!(found.id, first.id);
}

#[tokio::test]
async fn test_expired_delete_is_evicted_on_load() {
    let mut f = fixture();
    let gone = f.registry.save(expired("Gone", true)).await.unwrap();
    f.registry
        .save(RegisteredService::new(".*", "Live"))
        .await
        .unwrap();
    drain(&mut f.events);

    assert_eq!(f.manager.load().await.unwrap(), 1);
    assert!(f.manager.find_service_by_id(gone.id).await.unwrap().is_none());
    assert!(f.registry.find_service_by_id(gone.id).await.unwrap().is_none());
    assert_eq!(f.registry.load().await.unwrap().len(), 1);

    let events = drain(&mut f.events);
    assert!(events.contains(&DomainEvent::expired(&gone)));
}

#[tokio::test]
async fn test_expired_delete_is_evicted_on_lookup() {
    let mut f = fixture();
    let gone = f.manager.save(expired("Gone", true)).await.unwrap();
    assert_eq!(f.manager.count(), 1);
    drain(&mut f.events);

    assert!(
        f.manager
            .find_service_by("https://gone.example.org/app")
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(f.manager.count(), 0);
    assert_eq!(f.registry.size().await.unwrap(), 0);
    assert_eq!(drain(&mut f.events), vec![DomainEvent::expired(&gone)]);
}

#[tokio::test]
async fn test_expired_kept_is_returned_disabled() {
    let f = fixture();
    let kept = f.manager.save(expired("Kept", false)).await.unwrap();

    let found = f
        .manager
        .find_service_by("https://kept.example.org/")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, kept.id);
    assert!(!found.access_strategy.is_service_access_allowed());
    assert_eq!(found.name, kept.name);

    let by_id = f.manager.find_service_by_id(kept.id).await.unwrap().unwrap();
    assert!(!by_id.access_strategy.is_service_access_allowed());

    // The stored record is untouched.
    let stored = f.registry.find_service_by_id(kept.id).await.unwrap().unwrap();
    assert!(stored.access_strategy.base().enabled);
}

#[tokio::test]
async fn test_delete_missing_id_is_noop() {
    let mut f = fixture();
    f.manager
        .save(RegisteredService::new(".*", "Kept"))
        .await
        .unwrap();
    drain(&mut f.events);

    assert!(f.manager.delete(12_345).await.unwrap().is_none());
    assert_eq!(f.manager.count(), 1);
    assert_eq!(f.registry.size().await.unwrap(), 1);
    assert!(drain(&mut f.events).is_empty());
}

#[tokio::test]
async fn test_save_and_delete_publish_events() {
    let mut f = fixture();
    let saved = f
        .manager
        .save(RegisteredService::new(".*", "Evented"))
        .await
        .unwrap();
    let deleted = f.manager.delete(saved.id).await.unwrap().unwrap();
    assert_eq!(deleted, saved);
    assert_eq!(
        drain(&mut f.events),
        vec![DomainEvent::saved(&saved), DomainEvent::deleted(&saved)]
    );
    assert!(f.manager.find_service_by_id(saved.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_resave_replaces_snapshot_entry() {
    let f = fixture();
    let mut saved = f
        .manager
        .save(RegisteredService::new(r"https://old\.example\.org/.*", "Moving"))
        .await
        .unwrap();
    saved.service_id = r"https://new\.example\.org/.*".to_string();
    f.manager.save(saved.clone()).await.unwrap();

    assert_eq!(f.manager.count(), 1);
    assert!(
        f.manager
            .find_service_by("https://old.example.org/")
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(
        f.manager
            .find_service_by("https://new.example.org/")
            .await
            .unwrap()
            .map(|s| s.id),
        Some(saved.id)
    );
}

#[tokio::test]
async fn test_listing_and_predicates() {
    let f = fixture();
    f.registry
        .save(RegisteredService::new(".*", "Last").with_evaluation_order(9))
        .await
        .unwrap();
    f.registry
        .save(RegisteredService::new(".*", "First").with_evaluation_order(1))
        .await
        .unwrap();
    f.registry.save(expired("Expired", true)).await.unwrap();
    f.registry.save(expired("Stale", false)).await.unwrap();
    f.manager.load().await.unwrap();

    let names: Vec<String> = f
        .manager
        .get_all_services()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["First", "Last", "Stale"]);

    let disabled = f
        .manager
        .find_services_by(&|s: &RegisteredService| !s.access_strategy.is_service_access_allowed());
    assert_eq!(disabled.len(), 1);
    assert_eq!(disabled[0].name, "Stale");
}

#[tokio::test]
async fn test_invalid_save_leaves_snapshot_untouched() {
    let f = fixture();
    let err = f
        .manager
        .save(RegisteredService::new("[", "Broken"))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(f.manager.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reload_task_picks_up_registry_changes() {
    let f = fixture();
    f.manager.load().await.unwrap();
    assert_eq!(f.manager.count(), 0);

    let cancel = CancellationToken::new();
    let handle = f
        .manager
        .spawn_reload_task(Duration::from_secs(30), cancel.clone());

    f.registry
        .save(RegisteredService::new(".*", "Late"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(f.manager.count(), 1);

    cancel.cancel();
    handle.await.unwrap();
}

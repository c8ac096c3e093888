//! Bootstrap Tests

use std::time::Duration;
use svcreg_application::ports::ServicesManagerInterface;
use svcreg_domain::entities::{Principal, RegisteredService};
use svcreg_domain::error::Error;
use svcreg_domain::policies::{
    AttributeReleasePolicy, DefaultAccessStrategy, MultifactorPolicy,
    RemoteEndpointAccessStrategy,
};
use svcreg_domain::ports::{RemoteAccessCheckProvider, ServiceRegistry};
use svcreg_infrastructure::bootstrap;
use svcreg_infrastructure::config::AppConfig;
use svcreg_providers::events::NullEventPublisher;
use svcreg_providers::registry::{ResourceFormat, ResourceServiceRegistry};
use tempfile::TempDir;

fn memory_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.registry.provider = "memory".to_string();
    config.registry.location = None;
    config.manager.reload_interval_secs = 0;
    config
}

fn alice() -> Principal {
    Principal::new("alice")
        .with_attribute("mail", "alice@example.org")
        .with_attribute("phone", "555-0100")
        .with_attribute("memberOf", "staff")
}

#[tokio::test]
async fn test_bootstrap_memory_registry() {
    let ctx = bootstrap(memory_config()).await.unwrap();
    assert_eq!(ctx.registry().provider_name(), "memory");
    assert_eq!(ctx.remote_access().provider_name(), "http");
    assert_eq!(ctx.manager().count(), 0);
    assert!(!ctx.is_reloading());
    ctx.shutdown().await;
}

#[tokio::test]
async fn test_bootstrap_loads_existing_definitions() {
    let dir = TempDir::new().unwrap();
    let seeded = ResourceServiceRegistry::new(
        dir.path(),
        ResourceFormat::Json,
        NullEventPublisher::new_shared(),
    )
    .unwrap();
    seeded
        .save(RegisteredService::new(r"https://app\.example\.org/.*", "App"))
        .await
        .unwrap();

    let mut config = memory_config();
    config.registry.provider = "json".to_string();
    config.registry.location = Some(dir.path().to_path_buf());
    let ctx = bootstrap(config).await.unwrap();

    assert_eq!(ctx.manager().count(), 1);
    let found = ctx
        .manager()
        .find_service_by("https://app.example.org/login")
        .await
        .unwrap();
    assert_eq!(found.map(|s| s.name), Some("App".to_string()));
    ctx.shutdown().await;
}

#[tokio::test]
async fn test_unknown_provider_fails_bootstrap() {
    let mut config = memory_config();
    config.registry.provider = "nonexistent".to_string();
    assert!(matches!(
        bootstrap(config).await,
        Err(Error::Configuration { .. })
    ));
}

#[tokio::test]
async fn test_evaluate_allows_and_releases() {
    let ctx = bootstrap(memory_config()).await.unwrap();
    ctx.manager()
        .save(
            RegisteredService::new(r"https://mail\.example\.org/.*", "Mail")
                .with_attribute_release_policy(AttributeReleasePolicy::return_allowed(["mail"]))
                .with_multifactor_policy(MultifactorPolicy::new(["mfa-duo"])),
        )
        .await
        .unwrap();

    let decision = ctx
        .evaluate("https://mail.example.org/inbox", &alice())
        .await
        .unwrap()
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.username, "alice");
    assert_eq!(decision.released.len(), 1);
    assert_eq!(
        decision.released.get("mail"),
        Some(&vec!["alice@example.org".to_string()])
    );
    assert!(decision.multifactor_required);

    assert!(
        ctx.evaluate("https://unknown.example.org/", &alice())
            .await
            .unwrap()
            .is_none()
    );
    ctx.shutdown().await;
}

#[tokio::test]
async fn test_evaluate_denies_missing_required_attribute() {
    let ctx = bootstrap(memory_config()).await.unwrap();
    ctx.manager()
        .save(
            RegisteredService::new(r"https://admin\.example\.org/.*", "Admin")
                .with_access_strategy(
                    DefaultAccessStrategy::new(true, true)
                        .with_required_attribute("memberOf", ["admins"]),
                )
                .with_attribute_release_policy(AttributeReleasePolicy::return_all()),
        )
        .await
        .unwrap();

    let decision = ctx
        .evaluate("https://admin.example.org/", &alice())
        .await
        .unwrap()
        .unwrap();
    assert!(!decision.allowed);
    assert!(decision.released.is_empty());
    ctx.shutdown().await;
}

#[tokio::test]
async fn test_evaluate_remote_endpoint_with_null_checker_denies() {
    let mut config = memory_config();
    config.access.provider = "null".to_string();
    let ctx = bootstrap(config).await.unwrap();
    assert_eq!(ctx.remote_access().provider_name(), "null");

    ctx.manager()
        .save(
            RegisteredService::new(r"https://remote\.example\.org/.*", "Remote")
                .with_access_strategy(RemoteEndpointAccessStrategy::new(
                    "https://authz.example.org/check",
                )),
        )
        .await
        .unwrap();

    let decision = ctx
        .evaluate("https://remote.example.org/", &alice())
        .await
        .unwrap()
        .unwrap();
    assert!(!decision.allowed);
    ctx.shutdown().await;
}

#[tokio::test]
async fn test_require_service_reports_not_found() {
    let ctx = bootstrap(memory_config()).await.unwrap();
    assert!(matches!(
        ctx.require_service(404).await,
        Err(Error::NotFound { .. })
    ));

    let saved = ctx
        .manager()
        .save(RegisteredService::new(".*", "Any"))
        .await
        .unwrap();
    assert_eq!(ctx.require_service(saved.id).await.unwrap(), saved);
    ctx.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reload_task_runs_until_shutdown() {
    let mut config = memory_config();
    config.manager.reload_interval_secs = 30;
    let ctx = bootstrap(config).await.unwrap();
    assert!(ctx.is_reloading());

    ctx.registry()
        .save(RegisteredService::new(".*", "Late"))
        .await
        .unwrap();
    assert_eq!(ctx.manager().count(), 0);

    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(ctx.manager().count(), 1);
    ctx.shutdown().await;
}

//! Tests for linkme provider registration

use std::time::Duration;
use svcreg_application::ports::registry::{
    RemoteAccessProviderConfig, ServiceRegistryProviderConfig, list_remote_access_providers,
    list_service_registry_providers, resolve_remote_access_provider,
    resolve_service_registry_provider,
};
use svcreg_domain::ports::ServiceRegistry;
use svcreg_providers::events::NullEventPublisher;
use tempfile::TempDir;

#[test]
fn test_all_backends_are_registered() {
    let names: Vec<&str> = list_service_registry_providers()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    for expected in ["memory", "json", "yaml", "sql", "directory"] {
        assert!(names.contains(&expected), "missing backend {expected}: {names:?}");
    }

    let checkers: Vec<&str> = list_remote_access_providers()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert!(checkers.contains(&"null"));
}

#[test]
fn test_unknown_backend_lists_available() {
    let err = resolve_service_registry_provider(
        &ServiceRegistryProviderConfig::new("cassandra"),
        NullEventPublisher::new_shared(),
    )
    .unwrap_err();
    assert!(err.contains("cassandra"));
    assert!(err.contains("memory"));
}

#[test]
fn test_resource_backend_requires_location() {
    let err = resolve_service_registry_provider(
        &ServiceRegistryProviderConfig::new("json"),
        NullEventPublisher::new_shared(),
    )
    .unwrap_err();
    assert!(err.contains("location"));
}

#[test]
fn test_memory_and_directory_resolve_without_runtime() {
    for name in ["memory", "directory"] {
        let registry = resolve_service_registry_provider(
            &ServiceRegistryProviderConfig::new(name),
            NullEventPublisher::new_shared(),
        )
        .unwrap();
        assert_eq!(registry.provider_name(), name);
    }
}

#[test]
fn test_sql_requires_runtime() {
    let err = resolve_service_registry_provider(
        &ServiceRegistryProviderConfig::new("sql"),
        NullEventPublisher::new_shared(),
    )
    .unwrap_err();
    assert!(err.contains("runtime"));
}

#[tokio::test]
async fn test_resolved_backends_work() {
    let dir = TempDir::new().unwrap();
    let configs = [
        ServiceRegistryProviderConfig::new("json")
            .with_location(dir.path().join("json"))
            .with_watch(true),
        ServiceRegistryProviderConfig::new("yaml").with_location(dir.path().join("yaml")),
        ServiceRegistryProviderConfig::new("sql")
            .with_url("sqlite::memory:")
            .with_operation_timeout(Duration::from_secs(2)),
    ];
    for config in configs {
        let registry =
            resolve_service_registry_provider(&config, NullEventPublisher::new_shared()).unwrap();
        assert_eq!(registry.provider_name(), config.provider);
        assert_eq!(registry.size().await.unwrap(), 0);
    }
}

#[test]
fn test_null_checker_resolves() {
    let checker = resolve_remote_access_provider(&RemoteAccessProviderConfig::new("null")).unwrap();
    assert_eq!(checker.provider_name(), "null");
}

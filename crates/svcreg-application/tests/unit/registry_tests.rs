//! Provider registry tests

use svcreg_application::ports::registry::{
    REMOTE_ACCESS_PROVIDERS, SERVICE_REGISTRY_PROVIDERS, ServiceRegistryProviderConfig,
    resolve_service_registry_provider,
};
use svcreg_providers::events::NullEventPublisher;

#[test]
fn test_registry_slices_are_populated() {
    assert!(SERVICE_REGISTRY_PROVIDERS.len() >= 5);
    assert!(REMOTE_ACCESS_PROVIDERS.len() >= 2);
    for entry in SERVICE_REGISTRY_PROVIDERS.iter() {
        assert!(!entry.description.is_empty(), "{} has no description", entry.name);
    }
}

#[test]
fn test_provider_names_are_unique() {
    let mut names: Vec<&str> = SERVICE_REGISTRY_PROVIDERS.iter().map(|e| e.name).collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total);
}

#[test]
fn test_resolve_memory_registry() {
    let registry = resolve_service_registry_provider(
        &ServiceRegistryProviderConfig::new("memory"),
        NullEventPublisher::new_shared(),
    )
    .unwrap();
    assert_eq!(registry.provider_name(), "memory");
}

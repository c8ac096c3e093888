//! Tests for the sqlx/SQLite registry

use crate::contract;
use std::sync::Arc;
use std::time::Duration;
use svcreg_domain::entities::RegisteredService;
use svcreg_domain::ports::ServiceRegistry;
use svcreg_providers::events::{NullEventPublisher, TokioEventPublisher};
use svcreg_providers::registry::SqlServiceRegistry;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

fn registry() -> SqlServiceRegistry {
    SqlServiceRegistry::connect_lazy(
        "sqlite::memory:",
        5,
        TIMEOUT,
        NullEventPublisher::new_shared(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_sql_save_then_find_by_id() {
    contract::save_then_find_by_id_is_equal(&registry()).await;
}

#[tokio::test]
async fn test_sql_resave_and_rename_keep_one_row() {
    contract::resave_keeps_one_record(&registry()).await;
    contract::renamed_service_keeps_one_record(&registry()).await;
}

#[tokio::test]
async fn test_sql_rejects_invalid_services() {
    contract::invalid_service_is_not_persisted(&registry()).await;
}

#[tokio::test]
async fn test_sql_delete_missing_is_noop() {
    contract::delete_missing_is_noop(&registry()).await;
}

#[tokio::test]
async fn test_sql_lower_evaluation_order_wins() {
    contract::lower_evaluation_order_wins(&registry()).await;
}

#[tokio::test]
async fn test_sql_disabled_access_survives_storage() {
    contract::disabled_access_is_persisted(&registry()).await;
}

#[tokio::test]
async fn test_sql_dotted_names_survive_reload() {
    contract::dotted_names_survive_reload(&registry()).await;
}

#[tokio::test]
async fn test_sql_deleted_newest_id_is_not_reused() {
    contract::deleted_newest_id_is_not_reused(&registry()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sql_concurrent_load_and_save() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("services.db").display());
    let registry =
        SqlServiceRegistry::connect_lazy(&url, 4, TIMEOUT, NullEventPublisher::new_shared())
            .unwrap();
    contract::concurrent_load_and_save_keep_every_record(Arc::new(registry)).await;
}

#[tokio::test]
async fn test_sql_load_publishes_events() {
    let publisher = TokioEventPublisher::new_shared();
    let registry =
        SqlServiceRegistry::connect_lazy("sqlite::memory:", 1, TIMEOUT, publisher.clone()).unwrap();
    contract::load_publishes_one_event_per_record(&registry, &publisher).await;
}

#[tokio::test]
async fn test_sql_explicit_ids_are_upserted() {
    let registry = registry();
    let explicit = registry
        .save(RegisteredService::new(".*", "Explicit").with_id(10))
        .await
        .unwrap();
    assert_eq!(explicit.id, 10);

    let generated = registry
        .save(RegisteredService::new(".*", "Generated"))
        .await
        .unwrap();
    assert!(generated.id > 10);
    assert_eq!(registry.size().await.unwrap(), 2);
}

#[tokio::test]
async fn test_sql_skips_malformed_rows() {
    let registry = registry();
    let good = registry.save(RegisteredService::new(".*", "Good")).await.unwrap();
    sqlx::query(
        "INSERT INTO registered_services (name, service_id, evaluation_order, body) VALUES ('Bad', '.*', 0, '{oops')",
    )
    .execute(registry.pool())
    .await
    .unwrap();

    let loaded = registry.load().await.unwrap();
    assert_eq!(loaded, vec![good.clone()]);
    assert_eq!(
        registry
            .find_service_by_service_id("https://any")
            .await
            .unwrap()
            .map(|s| s.id),
        Some(good.id)
    );
}

#[tokio::test]
async fn test_sql_file_database_persists_across_pools() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("services.db").display());

    let saved = {
        let registry =
            SqlServiceRegistry::connect_lazy(&url, 2, TIMEOUT, NullEventPublisher::new_shared())
                .unwrap();
        let saved = registry
            .save(RegisteredService::new(r"https://app\.example\.org/.*", "App"))
            .await
            .unwrap();
        registry.pool().close().await;
        saved
    };

    let reopened =
        SqlServiceRegistry::connect_lazy(&url, 2, TIMEOUT, NullEventPublisher::new_shared())
            .unwrap();
    assert_eq!(reopened.find_service_by_id(saved.id).await.unwrap(), Some(saved));
}

#[tokio::test]
async fn test_sql_closed_pool_is_backend_unavailable() {
    let registry = registry();
    registry.pool().close().await;
    let err = registry.size().await.unwrap_err();
    assert!(matches!(
        err,
        svcreg_domain::Error::BackendUnavailable { .. }
    ));
}

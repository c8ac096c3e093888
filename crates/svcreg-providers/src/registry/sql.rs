//! Relational Service Registry (sqlx over SQLite)
//!
//! Each service is one row. The columns used for lookups are kept next to a
//! JSON body holding the full record:
//!
//! ```sql
//! CREATE TABLE registered_services (
//!     id               INTEGER PRIMARY KEY AUTOINCREMENT,
//!     name             TEXT    NOT NULL,
//!     service_id       TEXT    NOT NULL,
//!     evaluation_order INTEGER NOT NULL,
//!     body             TEXT    NOT NULL
//! );
//! ```
//!
//! Ids come from the store. Saving a record that already carries an id is
//! an explicit upsert (`ON CONFLICT(id) DO UPDATE`), so re-saving never
//! creates a second row. Every mutation runs in its own transaction, which
//! rolls back when dropped uncommitted. Every operation is bounded by the
//! configured timeout and surfaces `BackendUnavailable` when it fails.
//!
//! In-memory databases live in a single connection; the pool is pinned to
//! one connection that is never recycled.

use crate::constants::{
    SQL_DEFAULT_MAX_CONNECTIONS, SQL_DEFAULT_OPERATION_TIMEOUT, SQL_DEFAULT_URL,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use svcreg_application::ports::registry::{
    SERVICE_REGISTRY_PROVIDERS, ServiceRegistryProviderConfig, ServiceRegistryProviderEntry,
};
use svcreg_domain::entities::RegisteredService;
use svcreg_domain::error::{Error, Result};
use svcreg_domain::events::{DomainEvent, SharedEventPublisher};
use svcreg_domain::ports::ServiceRegistry;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS registered_services (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    name             TEXT    NOT NULL,
    service_id       TEXT    NOT NULL,
    evaluation_order INTEGER NOT NULL,
    body             TEXT    NOT NULL
)";

/// Row as stored; only the body is authoritative
#[derive(Debug, Clone, FromRow)]
struct ServiceRow {
    id: i64,
    body: String,
}

impl ServiceRow {
    fn decode(self) -> Result<RegisteredService> {
        let mut service: RegisteredService = serde_json::from_str(&self.body)?;
        service.id = self.id;
        Ok(service)
    }
}

fn db_error(e: sqlx::Error) -> Error {
    Error::backend_with_source("database operation failed", e)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Service registry stored in a SQLite database
#[derive(Debug)]
pub struct SqlServiceRegistry {
    pool: SqlitePool,
    operation_timeout: Duration,
    schema: OnceCell<()>,
    publisher: SharedEventPublisher,
}

impl SqlServiceRegistry {
    /// Build a lazily connecting pool for `url`
    ///
    /// Must be called inside a tokio runtime. The schema is created on first use.
    pub fn connect_lazy(
        url: &str,
        max_connections: u32,
        operation_timeout: Duration,
        publisher: SharedEventPublisher,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::configuration_with_source(format!("invalid database URL '{url}'"), e))?
            .create_if_missing(true);

        let pool_options = if is_in_memory(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };
        let pool = pool_options
            .acquire_timeout(operation_timeout)
            .connect_lazy_with(options);

        Ok(Self::from_pool(pool, operation_timeout, publisher))
    }

    /// Wrap an existing pool
    pub fn from_pool(
        pool: SqlitePool,
        operation_timeout: Duration,
        publisher: SharedEventPublisher,
    ) -> Self {
        Self {
            pool,
            operation_timeout,
            schema: OnceCell::new(),
            publisher,
        }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run `operation` under the configured timeout
    async fn bounded<T, F>(&self, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.operation_timeout, future)
            .await
            .map_err(|_| {
                Error::backend(format!(
                    "{operation} timed out after {:?}",
                    self.operation_timeout
                ))
            })?
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| async {
                self.bounded("schema creation", async {
                    sqlx::query(CREATE_TABLE)
                        .execute(&self.pool)
                        .await
                        .map_err(db_error)?;
                    info!("Registered services table ready");
                    Ok(())
                })
                .await
            })
            .await?;
        Ok(())
    }

    async fn fetch_rows(&self, order_by_evaluation: bool) -> Result<Vec<ServiceRow>> {
        let sql = if order_by_evaluation {
            "SELECT id, body FROM registered_services ORDER BY evaluation_order, id"
        } else {
            "SELECT id, body FROM registered_services ORDER BY id"
        };
        self.bounded("service enumeration", async {
            sqlx::query_as::<_, ServiceRow>(sql)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)
        })
        .await
    }
}

#[async_trait]
impl ServiceRegistry for SqlServiceRegistry {
    async fn save(&self, mut service: RegisteredService) -> Result<RegisteredService> {
        service.validate()?;
        self.ensure_schema().await?;

        self.bounded("save", async {
            let mut tx = self.pool.begin().await.map_err(db_error)?;

            if service.is_new() {
                service.id = sqlx::query_scalar::<_, i64>(
                    r"INSERT INTO registered_services (name, service_id, evaluation_order, body)
                      VALUES (?, ?, ?, '')
                      RETURNING id",
                )
                .bind(&service.name)
                .bind(&service.service_id)
                .bind(service.evaluation_order)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;
            }

            let body = serde_json::to_string(&service)?;
            sqlx::query(
                r"INSERT INTO registered_services (id, name, service_id, evaluation_order, body)
                  VALUES (?, ?, ?, ?, ?)
                  ON CONFLICT(id) DO UPDATE SET
                      name = excluded.name,
                      service_id = excluded.service_id,
                      evaluation_order = excluded.evaluation_order,
                      body = excluded.body",
            )
            .bind(service.id)
            .bind(&service.name)
            .bind(&service.service_id)
            .bind(service.evaluation_order)
            .bind(&body)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            tx.commit().await.map_err(db_error)?;
            Ok(())
        })
        .await?;

        debug!(id = service.id, name = %service.name, "Saved service row");
        Ok(service)
    }

    async fn delete(&self, service: &RegisteredService) -> Result<bool> {
        self.ensure_schema().await?;
        self.bounded("delete", async {
            let mut tx = self.pool.begin().await.map_err(db_error)?;
            let result = sqlx::query("DELETE FROM registered_services WHERE id = ?")
                .bind(service.id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            tx.commit().await.map_err(db_error)?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn load(&self) -> Result<Vec<RegisteredService>> {
        self.ensure_schema().await?;
        let rows = self.fetch_rows(false).await?;

        let mut services = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match row.decode() {
                Ok(service) => services.push(service),
                Err(e) => warn!(id, error = %e, "Skipping malformed service row"),
            }
        }
        for service in &services {
            if let Err(e) = self.publisher.publish(DomainEvent::loaded(service)).await {
                warn!(id = service.id, error = %e, "Failed to publish load event");
            }
        }
        Ok(services)
    }

    async fn find_service_by_id(&self, id: i64) -> Result<Option<RegisteredService>> {
        self.ensure_schema().await?;
        let row = self
            .bounded("lookup by id", async {
                sqlx::query_as::<_, ServiceRow>(
                    "SELECT id, body FROM registered_services WHERE id = ?",
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)
            })
            .await?;
        row.map(ServiceRow::decode).transpose()
    }

    async fn find_service_by_service_id(&self, service_id: &str) -> Result<Option<RegisteredService>> {
        self.ensure_schema().await?;
        // Patterns are regular expressions, so matching happens here, in evaluation order.
        for row in self.fetch_rows(true).await? {
            let id = row.id;
            match row.decode() {
                Ok(service) if service.matches(service_id) => return Ok(Some(service)),
                Ok(_) => {}
                Err(e) => warn!(id, error = %e, "Skipping malformed service row"),
            }
        }
        Ok(None)
    }

    async fn size(&self) -> Result<u64> {
        self.ensure_schema().await?;
        let count = self
            .bounded("count", async {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM registered_services")
                    .fetch_one(&self.pool)
                    .await
                    .map_err(db_error)
            })
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn provider_name(&self) -> &str {
        "sql"
    }
}

#[linkme::distributed_slice(SERVICE_REGISTRY_PROVIDERS)]
static SQL_REGISTRY: ServiceRegistryProviderEntry = ServiceRegistryProviderEntry {
    name: "sql",
    description: "SQLite database through sqlx with bounded operations",
    factory: sql_registry_factory,
};

fn sql_registry_factory(
    config: &ServiceRegistryProviderConfig,
    publisher: SharedEventPublisher,
) -> std::result::Result<Arc<dyn ServiceRegistry>, String> {
    tokio::runtime::Handle::try_current()
        .map_err(|_| "The sql service registry requires a tokio runtime".to_string())?;

    let url = config.url.as_deref().unwrap_or(SQL_DEFAULT_URL);
    let registry = SqlServiceRegistry::connect_lazy(
        url,
        config.max_connections.unwrap_or(SQL_DEFAULT_MAX_CONNECTIONS),
        config
            .operation_timeout
            .unwrap_or(SQL_DEFAULT_OPERATION_TIMEOUT),
        publisher,
    )
    .map_err(|e| e.to_string())?;
    Ok(Arc::new(registry))
}

//! Application bootstrap
//!
//! Turns an [`AppConfig`] into a running [`AppContext`]: providers are
//! resolved by name from the linkme registries, the services manager is
//! primed with one load and the periodic reload task is started.

use crate::config::AppConfig;
use crate::error_ext::OptionExt;
use std::sync::Arc;
use svcreg_application::ports::ServicesManagerInterface;
use svcreg_application::ports::registry::{
    resolve_remote_access_provider, resolve_service_registry_provider,
};
use svcreg_application::use_cases::ServicesManager;
use svcreg_domain::entities::{Attributes, Principal, RegisteredService};
use svcreg_domain::error::{Error, Result};
use svcreg_domain::policies::RegisteredServiceAccessStrategy;
use svcreg_domain::ports::{RemoteAccessCheckProvider, ServiceRegistry};
use svcreg_providers::events::TokioEventPublisher;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of evaluating a principal against the service matching a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Service that matched
    pub service: RegisteredService,
    /// Whether authentication may proceed
    pub allowed: bool,
    /// Username presented to the service
    pub username: String,
    /// Attributes released to the service
    pub released: Attributes,
    /// Whether multifactor authentication is required
    pub multifactor_required: bool,
}

/// Wired application components
pub struct AppContext {
    config: AppConfig,
    publisher: Arc<TokioEventPublisher>,
    registry: Arc<dyn ServiceRegistry>,
    remote_access: Arc<dyn RemoteAccessCheckProvider>,
    manager: Arc<ServicesManager>,
    cancel: CancellationToken,
    reload_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("registry", &self.registry.provider_name())
            .field("remote_access", &self.remote_access.provider_name())
            .field("reloading", &self.reload_task.is_some())
            .finish_non_exhaustive()
    }
}

/// Resolve every provider named by `config` and prime the services manager
///
/// Must run inside a tokio runtime.
pub async fn bootstrap(config: AppConfig) -> Result<AppContext> {
    let publisher = TokioEventPublisher::new_shared();

    let registry =
        resolve_service_registry_provider(&config.registry.to_provider_config(), publisher.clone())
            .map_err(Error::configuration)?;
    let remote_access = resolve_remote_access_provider(&config.access.to_provider_config())
        .map_err(Error::configuration)?;
    info!(
        registry = registry.provider_name(),
        remote_access = remote_access.provider_name(),
        "Providers resolved"
    );

    let manager = Arc::new(ServicesManager::new(
        Arc::clone(&registry),
        publisher.clone(),
    ));
    let loaded = manager.load().await?;
    info!(services = loaded, "Service registry loaded");

    let cancel = CancellationToken::new();
    let reload_task = config
        .manager
        .reload_interval()
        .map(|interval| manager.spawn_reload_task(interval, cancel.clone()));

    Ok(AppContext {
        config,
        publisher,
        registry,
        remote_access,
        manager,
        cancel,
        reload_task,
    })
}

impl AppContext {
    /// Effective configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Event publisher shared by the registry and the manager
    pub fn publisher(&self) -> &Arc<TokioEventPublisher> {
        &self.publisher
    }

    /// Storage backend
    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    /// Checker consulted by remote endpoint access strategies
    pub fn remote_access(&self) -> &Arc<dyn RemoteAccessCheckProvider> {
        &self.remote_access
    }

    /// Services manager
    pub fn manager(&self) -> &Arc<ServicesManager> {
        &self.manager
    }

    /// Whether the periodic reload task is running
    pub fn is_reloading(&self) -> bool {
        self.reload_task.is_some()
    }

    /// Evaluate `principal` against the service matching `url`
    ///
    /// `Ok(None)` when no service matches. Policy failures deny access.
    pub async fn evaluate(&self, url: &str, principal: &Principal) -> Result<Option<AccessDecision>> {
        let Some(service) = self.manager.find_service_by(url).await? else {
            debug!(url, "No registered service matches");
            return Ok(None);
        };

        let strategy = &service.access_strategy;
        let allowed = strategy.is_service_access_allowed()
            && strategy
                .do_principal_attributes_allow_service_access(
                    &principal.id,
                    &principal.attributes,
                    self.remote_access.as_ref(),
                )
                .await;
        if !allowed {
            warn!(service = %service.name, principal = %principal.id, "Service access denied");
        }

        let username = service
            .username_attribute_provider
            .resolve_username(principal, &service.service_id);
        let released = if allowed {
            service
                .attribute_release_policy
                .get_attributes(principal, &service.name)
        } else {
            Attributes::new()
        };
        let multifactor_required = service
            .multifactor_policy
            .as_ref()
            .is_some_and(|policy| policy.should_trigger(principal));

        Ok(Some(AccessDecision {
            service,
            allowed,
            username,
            released,
            multifactor_required,
        }))
    }

    /// Service by numeric id, failing with `NotFound` when absent
    pub async fn require_service(&self, id: i64) -> Result<RegisteredService> {
        self.manager
            .find_service_by_id(id)
            .await?
            .or_not_found(format!("registered service {id}"))
    }

    /// Stop the reload task and wait for it to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.reload_task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Reload task ended abnormally");
        }
        info!("Service registry stopped");
    }
}

//! Event Publisher Domain Port
//!
//! Registry and manager report lifecycle changes through this port without
//! knowing who listens (audit trail, notifications, cache warmers).

use crate::entities::RegisteredService;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle events of registered services
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A registration was read during a full load
    ServiceLoaded {
        /// Registration id
        id: i64,
        /// Registration name
        name: String,
    },
    /// A registration was created or replaced
    ServiceSaved {
        /// Registration id
        id: i64,
        /// Registration name
        name: String,
    },
    /// A registration was removed
    ServiceDeleted {
        /// Registration id
        id: i64,
        /// Registration name
        name: String,
    },
    /// An expired registration was removed because its policy asks for it
    ServiceExpired {
        /// Registration id
        id: i64,
        /// Registration name
        name: String,
        /// Whether the contacts asked to be told about removal
        notify: bool,
    },
}

impl DomainEvent {
    /// Event for a registration read during `load`
    pub fn loaded(service: &RegisteredService) -> Self {
        Self::ServiceLoaded {
            id: service.id,
            name: service.name.clone(),
        }
    }

    /// Event for a saved registration
    pub fn saved(service: &RegisteredService) -> Self {
        Self::ServiceSaved {
            id: service.id,
            name: service.name.clone(),
        }
    }

    /// Event for a deleted registration
    pub fn deleted(service: &RegisteredService) -> Self {
        Self::ServiceDeleted {
            id: service.id,
            name: service.name.clone(),
        }
    }

    /// Event for an expired registration removed from storage
    pub fn expired(service: &RegisteredService) -> Self {
        Self::ServiceExpired {
            id: service.id,
            name: service.name.clone(),
            notify: service
                .expiration_policy
                .as_ref()
                .is_some_and(|p| p.notify_when_deleted),
        }
    }

    /// Id of the registration the event is about
    pub fn service_id(&self) -> i64 {
        match self {
            Self::ServiceLoaded { id, .. }
            | Self::ServiceSaved { id, .. }
            | Self::ServiceDeleted { id, .. }
            | Self::ServiceExpired { id, .. } => *id,
        }
    }
}

/// Domain Port for Publishing Registry Events
///
/// # Example
///
/// ```rust,no_run
/// use svcreg_domain::events::{DomainEvent, EventPublisher};
/// use svcreg_domain::entities::RegisteredService;
///
/// async fn announce(
///     publisher: &dyn EventPublisher,
///     service: &RegisteredService,
/// ) -> svcreg_domain::Result<()> {
///     publisher.publish(DomainEvent::saved(service)).await
/// }
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync + std::fmt::Debug {
    /// Publish an event to all subscribers
    ///
    /// "Published" means handed to the transport, not necessarily received.
    async fn publish(&self, event: DomainEvent) -> Result<()>;

    /// Whether anyone is listening
    fn has_subscribers(&self) -> bool;
}

/// Shared event publisher for dependency injection
pub type SharedEventPublisher = Arc<dyn EventPublisher>;

//! Null Event Publisher
//!
//! Testing stub implementation that discards all events.
//!
//! ## Usage
//!
//! ```rust
//! use svcreg_providers::events::NullEventPublisher;
//!
//! let publisher = NullEventPublisher::new();
//! // All events are silently discarded
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use svcreg_domain::error::Result;
use svcreg_domain::events::{DomainEvent, EventPublisher};

/// Null event publisher for testing
#[derive(Debug, Default)]
pub struct NullEventPublisher;

impl NullEventPublisher {
    /// Create a new null event publisher
    pub fn new() -> Self {
        Self
    }

    /// Create as Arc for sharing
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl EventPublisher for NullEventPublisher {
    async fn publish(&self, _event: DomainEvent) -> Result<()> {
        Ok(())
    }

    fn has_subscribers(&self) -> bool {
        false
    }
}

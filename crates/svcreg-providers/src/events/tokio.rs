//! Tokio Broadcast Event Publisher
//!
//! In-process event distribution over a tokio broadcast channel. Events are
//! ephemeral; when the channel is full the oldest events are dropped for
//! slow subscribers.
//!
//! ## Example
//!
//! ```ignore
//! use svcreg_providers::events::TokioEventPublisher;
//!
//! let publisher = TokioEventPublisher::new();
//! let mut events = publisher.subscribe_events();
//! publisher.publish(DomainEvent::saved(&service)).await?;
//! ```

use crate::constants::EVENT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use futures::Stream;
use futures::stream;
use std::pin::Pin;
use std::sync::Arc;
use svcreg_domain::error::Result;
use svcreg_domain::events::{DomainEvent, EventPublisher};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Boxed async stream of domain events
pub type DomainEventStream = Pin<Box<dyn Stream<Item = DomainEvent> + Send + 'static>>;

/// Event publisher using tokio broadcast channels
#[derive(Clone)]
pub struct TokioEventPublisher {
    sender: Arc<broadcast::Sender<DomainEvent>>,
    capacity: usize,
}

impl TokioEventPublisher {
    /// Create a publisher with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    /// Create with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
            capacity,
        }
    }

    /// Create as Arc for sharing
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Raw broadcast receiver
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Stream of events that skips over lagged gaps
    pub fn subscribe_events(&self) -> DomainEventStream {
        let receiver = self.sender.subscribe();
        let stream = stream::unfold(receiver, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Event stream lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Box::pin(stream)
    }

    /// Get the current number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TokioEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokioEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioEventPublisher")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[async_trait]
impl EventPublisher for TokioEventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        match self.sender.send(event) {
            Ok(count) => debug!("Published event to {} subscribers", count),
            Err(_) => debug!("Published event but no subscribers"),
        }
        Ok(())
    }

    fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

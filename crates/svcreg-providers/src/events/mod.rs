//! Event Publisher Implementations
//!
//! ## Available Providers
//!
//! | Provider | Type | Description |
//! |----------|------|-------------|
//! | NullEventPublisher | Testing | Discards all events |
//! | TokioEventPublisher | In-Process | Tokio broadcast channels |

pub mod null;
pub mod tokio;

pub use self::null::NullEventPublisher;
pub use self::tokio::{DomainEventStream, TokioEventPublisher};

// Re-export domain event types
pub use svcreg_domain::events::{DomainEvent, EventPublisher, SharedEventPublisher};

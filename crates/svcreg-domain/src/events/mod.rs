//! Domain Events
//!
//! | Event | Description |
//! |-------|-------------|
//! | [`DomainEvent`] | Registration lifecycle facts |
//! | [`EventPublisher`] | Interface for publishing domain events |

/// Domain event definitions and publisher interface
pub mod domain_events;

pub use domain_events::{DomainEvent, EventPublisher, SharedEventPublisher};

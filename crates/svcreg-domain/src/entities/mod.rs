//! Domain Entities
//!
//! | Entity | Description |
//! |--------|-------------|
//! | [`RegisteredService`] | A client application and its policies |
//! | [`Principal`] | Caller-supplied authenticated subject |

/// Principal and attribute map
pub mod principal;
/// Registered service entity
pub mod registered_service;

pub use principal::{Attributes, Principal};
pub use registered_service::{RegisteredService, find_first_match, sort_by_evaluation_order};

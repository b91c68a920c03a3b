//! Catalog Coordinator: orchestrates writes across the Resource Store,
//! Graph Store and Search Index with saga compensation, and emits
//! catalog lifecycle events over the Event Bus Core.

mod coordinator;
mod saga;

pub use coordinator::{CatalogCoordinator, EventTopics};
pub use saga::Saga;

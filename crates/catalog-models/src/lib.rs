//! Shared data model and error taxonomy for the catalog and event-bus core.
//!
//! This crate is intentionally free of any store, index, or broker
//! dependency: it holds only the types every other crate in the workspace
//! agrees on, a dependency-free `models` crate that nothing else may pull
//! proto or transport types into.

pub mod error;
pub mod events;
pub mod relationship;
pub mod resource;
pub mod version;

pub use error::{CatalogError, Result};
pub use relationship::{Relationship, RelationshipType};
pub use resource::{Resource, ResourceKey, ResourceProjection, ResourceType, NAMESPACE_RE, NAME_RE};
pub use version::SemanticVersion;

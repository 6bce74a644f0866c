//! Entity storage for Nexus.
//!
//! A small SQLite-backed store of person and business records. The
//! orchestrator's lookup tool reads it through [`EntityStore::find`], a
//! case-insensitive substring match across the searchable columns.

pub mod entity;
pub mod error;
pub mod store;

pub use entity::{Coords, Entity, EntityKind, EntitySummary};
pub use error::{Result, StoreError};
pub use store::EntityStore;

//! Storage layer for Tessera
//!
//! Two pieces live here, mechanism only, no routing policy:
//! - IndexOps: thin operations against any `DocumentStore` (idempotent
//!   index creation, atomic alias renames, size and latest-document passes)
//! - MemoryStore: in-memory `DocumentStore` used as the reference backend
//!   and as the test double (with a size-override hook)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod ops;

pub use memory::MemoryStore;
pub use ops::{default_item_mapping, default_item_settings, IndexOps};

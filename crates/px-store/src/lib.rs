//! # px-store
//!
//! The hierarchical container boundary: a read-only key-value view of
//! monitoring series (`path -> TimeSeries`) with directory listing.
//! The pipeline only ever consumes the [`SeriesStore`] trait; the
//! concrete snapshot behind it is an in-memory map, optionally loaded
//! from a JSON snapshot file.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod snapshot;
pub mod store;

pub use memory::MemoryStore;
pub use snapshot::{SeriesRecord, SnapshotFile};
pub use store::{ChildEntry, SeriesStore};

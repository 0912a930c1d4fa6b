//! # px-viz
//!
//! Presentation layer for pixband: the ordered [`SeriesStack`] with its
//! shared display configuration, aligned table rendering, and the
//! plot-friendly JSON artifacts handed to the external plotting
//! backend.
//!
//! This crate is intentionally dependency-light and emits flat arrays
//! instead of nested objects.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod stack;
mod table;

pub use artifact::{SeriesArtifact, StackArtifact, STACK_SCHEMA_VERSION};
pub use stack::{round_up, Palette, PaletteEntry, SeriesStack, StackConfig};

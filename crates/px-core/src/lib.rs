//! # px-core
//!
//! Core data types for pixband: the binned [`TimeSeries`] that every
//! pipeline stage consumes and produces, the online [`WeightedMean`]
//! accumulator used for all lumi-block and module averaging, and the
//! shared error taxonomy.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod series;
pub mod stats;

pub use error::{Error, Result};
pub use series::{Bin, SeriesStyle, TimeSeries};
pub use stats::WeightedMean;

//! # px-pileup
//!
//! The reporting pipeline over a container snapshot: module discovery,
//! bad-startup cleaning, lumi-block to pile-up remapping, and
//! per-region / per-slice aggregation.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::BTreeSet;

pub mod aggregate;
pub mod clean;
pub mod discover;
pub mod remap;

pub use aggregate::{
    aggregate_region, eta_slice_index, spread_at, spread_by_eta, AggregateOutcome,
    EtaSpreadConfig, EtaSpreadOutcome, RegionConfig, SpreadConfig, SpreadOutcome,
    DEFAULT_BAD_LBS,
};
pub use clean::{clean_prefix, load_pileup_reference, open_clean};
pub use discover::find_modules;
pub use remap::{pileup_correspondence, remap_to_pileup, Anchor, RemapConfig, ZeroPolicy};

/// Lumi-block indices excluded from all remapping; supplied by the
/// caller and never mutated by the pipeline.
pub type VetoSet = BTreeSet<usize>;

/// Directory below a run prefix that holds the per-module occupancy
/// series, three group levels deep (component / sub-component / module).
pub const MODULE_DIR: &str = "Errors/Modules_BitStr_Occ_Tot/";

/// Series below a run prefix mapping lumi-block index to average pile-up.
pub const PILEUP_SERIES: &str = "Hits/Interactions_vs_lumi";

/// Base directory of the per-module series for `prefix`.
pub fn module_dir(prefix: &str) -> String {
    format!("{prefix}{MODULE_DIR}")
}

/// Full container path of the module named `name` under `prefix`.
pub fn module_path(prefix: &str, name: &str) -> String {
    format!("{prefix}{MODULE_DIR}{name}")
}

/// Full container path of the pile-up reference under `prefix`.
pub fn pileup_path(prefix: &str) -> String {
    format!("{prefix}{PILEUP_SERIES}")
}

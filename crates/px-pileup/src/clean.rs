//! Startup-period cleaning: the first lumi blocks of a run carry
//! known-bad readings and are zeroed before any further processing.

use px_core::{Error, Result, TimeSeries};
use px_store::SeriesStore;

/// Zero value, error, and entries for bin indices `0..=bad_lbs`.
/// Bins past the series end are ignored.
pub fn clean_prefix(series: &mut TimeSeries, bad_lbs: usize) {
    let last = bad_lbs.min(series.n_bins().saturating_sub(1));
    for i in 0..=last {
        series.clear_bin(i);
    }
}

/// Load the series at `path` and clean its startup prefix. The number
/// of bad lumi blocks varies by use and is always caller-supplied.
pub fn open_clean(store: &dyn SeriesStore, path: &str, bad_lbs: usize) -> Result<TimeSeries> {
    let mut series = store.get(path).ok_or_else(|| Error::NotFound(path.to_string()))?;
    clean_prefix(&mut series, bad_lbs);
    Ok(series)
}

/// Load and clean the shared pile-up reference for a run prefix.
pub fn load_pileup_reference(
    store: &dyn SeriesStore,
    prefix: &str,
    bad_lbs: usize,
) -> Result<TimeSeries> {
    open_clean(store, &crate::pileup_path(prefix), bad_lbs)
}

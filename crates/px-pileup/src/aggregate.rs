//! Combining many per-module series into region curves and
//! module-spread distributions.

use px_core::{Error, Result, TimeSeries, WeightedMean};
use px_store::SeriesStore;

use crate::clean::open_clean;
use crate::remap::{pileup_correspondence, remap_to_pileup, RemapConfig, ZeroPolicy};
use crate::{module_path, VetoSet};

/// Default number of bad startup lumi blocks to zero out. Historical
/// values were 124 and 201 for earlier data-taking periods.
pub const DEFAULT_BAD_LBS: usize = 246;

/// Configuration for one region aggregation.
#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Region label; becomes the output series name.
    pub label: String,
    /// Startup lumi blocks to zero before remapping.
    pub bad_lbs: usize,
    /// Remapping parameters shared by every module of the region.
    pub remap: RemapConfig,
    /// Optional visible x sub-range of the result (display only).
    pub x_view: Option<(f64, f64)>,
}

impl RegionConfig {
    /// Region with default cleaning and remapping parameters.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bad_lbs: DEFAULT_BAD_LBS,
            remap: RemapConfig::default(),
            x_view: None,
        }
    }
}

/// Result of a region aggregation.
///
/// Missing per-module series are skipped with a warning rather than
/// aborting the region; the skipped names are surfaced here so the
/// caller can decide how loudly to report them.
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    /// The aggregated region series on the pile-up axis.
    pub series: TimeSeries,
    /// Number of modules that contributed.
    pub used: usize,
    /// Module names whose series were absent from the container.
    pub skipped: Vec<String>,
}

/// Clean and remap every named module, then fold all module buckets
/// into one weighted mean per pile-up bucket.
pub fn aggregate_region<'a>(
    store: &dyn SeriesStore,
    prefix: &str,
    names: impl IntoIterator<Item = &'a String>,
    pileup_ref: &TimeSeries,
    vetoes: &VetoSet,
    cfg: &RegionConfig,
) -> Result<AggregateOutcome> {
    let (n_bins, lo, hi) = cfg.remap.axis()?;
    let mut buckets = vec![WeightedMean::new(); n_bins];
    let mut used = 0usize;
    let mut skipped = Vec::new();

    for name in names {
        let module = match open_clean(store, &module_path(prefix, name), cfg.bad_lbs) {
            Ok(series) => series,
            Err(Error::NotFound(path)) => {
                tracing::warn!(module = name.as_str(), path, "module series missing, skipping");
                skipped.push(name.clone());
                continue;
            }
            Err(e) => return Err(e),
        };
        let remapped = remap_to_pileup(&module, pileup_ref, vetoes, &cfg.remap)?;
        for i in 0..remapped.n_bins() {
            if remapped.entries(i) > 0.0 {
                buckets[i].add(remapped.value(i), remapped.entries(i));
            }
        }
        used += 1;
    }

    let mut series = TimeSeries::new(cfg.label.clone(), "", n_bins, lo, hi)?;
    series.style.x_view = cfg.x_view;
    for (i, acc) in buckets.iter().enumerate() {
        if !acc.is_empty() {
            series.set_bin(i, acc.mean(), acc.error() * cfg.remap.error_scale, acc.total_weight())?;
        }
    }

    tracing::debug!(
        region = cfg.label.as_str(),
        used,
        skipped = skipped.len(),
        "region aggregation complete"
    );
    Ok(AggregateOutcome { series, used, skipped })
}

/// Configuration for a module-spread distribution at one pile-up point.
#[derive(Debug, Clone)]
pub struct SpreadConfig {
    /// Pile-up point to sample.
    pub target_pu: f64,
    /// Accepted distance from `target_pu` (strict).
    pub tolerance: f64,
    /// Number of value-histogram bins.
    pub n_bins: usize,
    /// Value-histogram range.
    pub range: (f64, f64),
    /// Startup lumi blocks to zero before sampling.
    pub bad_lbs: usize,
    /// Zero-valued sample policy.
    pub zero_policy: ZeroPolicy,
}

impl SpreadConfig {
    /// Spread at `target_pu` with the default histogram shape
    /// (50 bins over `0..1`, tolerance 2.5).
    pub fn new(target_pu: f64) -> Self {
        Self {
            target_pu,
            tolerance: 2.5,
            n_bins: 50,
            range: (0.0, 1.0),
            bad_lbs: DEFAULT_BAD_LBS,
            zero_policy: ZeroPolicy::SkipAsMissing,
        }
    }
}

/// Result of a spread computation.
#[derive(Debug, Clone)]
pub struct SpreadOutcome {
    /// Distribution of module values, normalized to unit integral
    /// whenever anything contributed.
    pub histogram: TimeSeries,
    /// Number of modules that contributed at least one sample.
    pub modules: usize,
    /// Module names whose series were absent from the container.
    pub skipped: Vec<String>,
}

fn fill_normalized(
    name: String,
    n_bins: usize,
    range: (f64, f64),
    counts: &[f64],
) -> Result<TimeSeries> {
    let mut histogram = TimeSeries::new(name, "", n_bins, range.0, range.1)?;
    let total: f64 = counts.iter().sum();
    for (i, &count) in counts.iter().enumerate() {
        if count > 0.0 {
            // Unit integral: multiple target-pu distributions stay
            // comparable regardless of module count.
            histogram.set_bin(i, count / total, count.sqrt() / total, count)?;
        }
    }
    Ok(histogram)
}

/// Distribution of per-module values at a fixed pile-up point.
///
/// For every module, samples the lumi blocks whose pile-up lies within
/// `tolerance` of `target_pu` and fills the values into a fixed-range
/// histogram, normalized to unit integral before returning.
pub fn spread_at<'a>(
    store: &dyn SeriesStore,
    prefix: &str,
    names: impl IntoIterator<Item = &'a String>,
    pileup_ref: &TimeSeries,
    vetoes: &VetoSet,
    cfg: &SpreadConfig,
) -> Result<SpreadOutcome> {
    if cfg.n_bins == 0 {
        return Err(Error::InvalidArgument("spread histogram needs at least one bin".into()));
    }
    let mut counts = vec![0.0f64; cfg.n_bins];
    let mut modules = 0usize;
    let mut skipped = Vec::new();
    // Geometry helper with the same binning as the result.
    let frame = TimeSeries::new("frame", "", cfg.n_bins, cfg.range.0, cfg.range.1)?;

    for name in names {
        let module = match open_clean(store, &module_path(prefix, name), cfg.bad_lbs) {
            Ok(series) => series,
            Err(Error::NotFound(path)) => {
                tracing::warn!(module = name.as_str(), path, "module series missing, skipping");
                skipped.push(name.clone());
                continue;
            }
            Err(e) => return Err(e),
        };
        let mut contributed = false;
        for value in pileup_correspondence(&module, pileup_ref, vetoes, cfg.target_pu, cfg.tolerance)
        {
            if value == 0.0 && cfg.zero_policy == ZeroPolicy::SkipAsMissing {
                continue;
            }
            if let Some(bin) = frame.find_bin(value) {
                counts[bin] += 1.0;
                contributed = true;
            }
        }
        if contributed {
            modules += 1;
        }
    }

    let name = format!("pu{:.0}", cfg.target_pu);
    let histogram = fill_normalized(name, cfg.n_bins, cfg.range, &counts)?;
    Ok(SpreadOutcome { histogram, modules, skipped })
}

/// Configuration for eta-sliced spreads.
#[derive(Debug, Clone)]
pub struct EtaSpreadConfig {
    /// Pile-up point to sample.
    pub target_pu: f64,
    /// Accepted distance from `target_pu` (strict).
    pub tolerance: f64,
    /// Number of value-histogram bins per slice.
    pub n_bins: usize,
    /// Value-histogram range per slice.
    pub range: (f64, f64),
    /// Number of eta slices (indices `0..n_slices`).
    pub n_slices: usize,
    /// Startup lumi blocks to zero before sampling.
    pub bad_lbs: usize,
    /// Zero-valued sample policy.
    pub zero_policy: ZeroPolicy,
}

impl EtaSpreadConfig {
    /// Eta spread at `target_pu` with the default slice shape
    /// (7 slices of 12 bins over `0.4..1.0`).
    pub fn new(target_pu: f64) -> Self {
        Self {
            target_pu,
            tolerance: 2.5,
            n_bins: 12,
            range: (0.4, 1.0),
            n_slices: 7,
            bad_lbs: DEFAULT_BAD_LBS,
            zero_policy: ZeroPolicy::SkipAsMissing,
        }
    }
}

/// Result of an eta-sliced spread computation.
#[derive(Debug, Clone)]
pub struct EtaSpreadOutcome {
    /// One normalized distribution per eta slice, named `m0..`.
    pub slices: Vec<TimeSeries>,
    /// Module names whose series were absent from the container.
    pub skipped: Vec<String>,
}

/// Extract the eta-slice index from a module name (`.._M3A_..` -> 3).
pub fn eta_slice_index(name: &str) -> Result<usize> {
    // One digit after "_M", optionally followed by the detector side.
    static ETA_ID: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = ETA_ID.get_or_init(|| {
        regex::Regex::new(r"_M([0-9])[AC]?_").expect("eta id pattern compiles")
    });
    let captures = re.captures(name).ok_or_else(|| Error::MalformedId(name.to_string()))?;
    captures[1]
        .parse::<usize>()
        .map_err(|_| Error::MalformedId(name.to_string()))
}

/// Per-eta-slice distributions of module values at a fixed pile-up
/// point. Modules are grouped by the eta index parsed from their name;
/// a name without one is a [`Error::MalformedId`].
pub fn spread_by_eta<'a>(
    store: &dyn SeriesStore,
    prefix: &str,
    names: impl IntoIterator<Item = &'a String>,
    pileup_ref: &TimeSeries,
    vetoes: &VetoSet,
    cfg: &EtaSpreadConfig,
) -> Result<EtaSpreadOutcome> {
    if cfg.n_bins == 0 || cfg.n_slices == 0 {
        return Err(Error::InvalidArgument("eta spread needs bins and slices".into()));
    }
    let mut counts = vec![vec![0.0f64; cfg.n_bins]; cfg.n_slices];
    let mut skipped = Vec::new();
    let frame = TimeSeries::new("frame", "", cfg.n_bins, cfg.range.0, cfg.range.1)?;

    for name in names {
        let slice = eta_slice_index(name)?;
        if slice >= cfg.n_slices {
            return Err(Error::MalformedId(format!(
                "{name}: eta slice {slice} outside 0..{}",
                cfg.n_slices
            )));
        }
        let module = match open_clean(store, &module_path(prefix, name), cfg.bad_lbs) {
            Ok(series) => series,
            Err(Error::NotFound(path)) => {
                tracing::warn!(module = name.as_str(), path, "module series missing, skipping");
                skipped.push(name.clone());
                continue;
            }
            Err(e) => return Err(e),
        };
        for value in pileup_correspondence(&module, pileup_ref, vetoes, cfg.target_pu, cfg.tolerance)
        {
            if value == 0.0 && cfg.zero_policy == ZeroPolicy::SkipAsMissing {
                continue;
            }
            if let Some(bin) = frame.find_bin(value) {
                counts[slice][bin] += 1.0;
            }
        }
    }

    let mut slices = Vec::with_capacity(cfg.n_slices);
    for (slice, slice_counts) in counts.iter().enumerate() {
        slices.push(fill_normalized(format!("m{slice}"), cfg.n_bins, cfg.range, slice_counts)?);
    }
    Ok(EtaSpreadOutcome { slices, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_index_extraction() {
        assert_eq!(eta_slice_index("B0/S13/LI_S13_A_M4A_ok").unwrap(), 4);
        assert_eq!(eta_slice_index("B1/S2/mod_M0_x").unwrap(), 0);
        assert_eq!(eta_slice_index("B2/S2/mod_M3C_x").unwrap(), 3);
        let err = eta_slice_index("B0/S1/no_id_here").unwrap_err();
        assert!(matches!(err, Error::MalformedId(_)));
    }
}

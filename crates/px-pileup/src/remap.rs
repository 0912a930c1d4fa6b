//! Remapping a lumi-block-indexed series onto a pile-up axis.
//!
//! Every non-vetoed lumi block is looked up in the pile-up reference;
//! all blocks landing in the same pile-up bucket are merged with an
//! online weighted mean. The result is a new, independent series.

use px_core::{Error, Result, TimeSeries, WeightedMean};

use crate::VetoSet;

/// Where the pile-up axis starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Bins start at `pu_min`; `n = floor((pu_max - pu_min) / width)`.
    RangeMin,
    /// Bins start at zero; `n = floor(pu_max / width)`. Buckets below
    /// `pu_min` exist but stay empty.
    Zero,
}

/// How a zero-valued source bin is treated.
///
/// Historically zero always meant "no data for this lumi block", which
/// makes a true zero measurement indistinguishable from absence; the
/// policy is therefore explicit and configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroPolicy {
    /// Skip zero-valued bins (historical behavior, the default).
    SkipAsMissing,
    /// Accumulate zeros like any other value.
    KeepZeros,
}

/// Configuration for one remapping pass.
#[derive(Debug, Clone)]
pub struct RemapConfig {
    /// Lower edge of the accepted pile-up range.
    pub pu_min: f64,
    /// Upper edge of the accepted pile-up range.
    pub pu_max: f64,
    /// Pile-up bucket width.
    pub bin_width: f64,
    /// Axis anchoring variant.
    pub anchor: Anchor,
    /// Post-scale factor on every output error, for folding a known
    /// systematic spread into the displayed uncertainty.
    pub error_scale: f64,
    /// Zero-valued source bin policy.
    pub zero_policy: ZeroPolicy,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            pu_min: 2.5,
            pu_max: 82.5,
            bin_width: 5.0,
            anchor: Anchor::RangeMin,
            error_scale: 1.0,
            zero_policy: ZeroPolicy::SkipAsMissing,
        }
    }
}

impl RemapConfig {
    /// Validate the range bounds before any bin computation.
    pub fn validate(&self) -> Result<()> {
        if self.pu_min < 0.0 || self.pu_min >= self.pu_max {
            return Err(Error::InvalidRange { min: self.pu_min, max: self.pu_max });
        }
        if self.bin_width <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "pile-up bin width must be positive, got {}",
                self.bin_width
            )));
        }
        Ok(())
    }

    /// Output axis as `(n_bins, x_min, x_max)`.
    pub fn axis(&self) -> Result<(usize, f64, f64)> {
        self.validate()?;
        let (n, lo) = match self.anchor {
            Anchor::RangeMin => {
                (((self.pu_max - self.pu_min) / self.bin_width).floor() as usize, self.pu_min)
            }
            Anchor::Zero => ((self.pu_max / self.bin_width).floor() as usize, 0.0),
        };
        if n == 0 {
            return Err(Error::InvalidRange { min: self.pu_min, max: self.pu_max });
        }
        Ok((n, lo, lo + n as f64 * self.bin_width))
    }
}

/// Weight of one source bin: its entry count, or 1 when entries were
/// not recorded.
fn bin_weight(series: &TimeSeries, i: usize) -> f64 {
    let entries = series.entries(i);
    if entries > 0.0 {
        entries
    } else {
        1.0
    }
}

/// Remap `series` from its lumi-block axis onto a pile-up axis.
///
/// Each non-vetoed source bin whose pile-up value lies inside
/// `[pu_min, pu_max]` contributes to exactly one destination bucket;
/// everything else is dropped. Output bins carry the weighted mean,
/// the scaled standard error of the mean, and the accumulated weight.
pub fn remap_to_pileup(
    series: &TimeSeries,
    pileup_ref: &TimeSeries,
    vetoes: &VetoSet,
    cfg: &RemapConfig,
) -> Result<TimeSeries> {
    let (n_bins, lo, hi) = cfg.axis()?;
    let mut out =
        TimeSeries::new(format!("pu_{}", series.name), series.title.clone(), n_bins, lo, hi)?;

    let mut buckets = vec![WeightedMean::new(); n_bins];
    let n_src = series.n_bins().min(pileup_ref.n_bins());
    for i in 0..n_src {
        if vetoes.contains(&i) {
            continue;
        }
        let value = series.value(i);
        if value == 0.0 && cfg.zero_policy == ZeroPolicy::SkipAsMissing {
            continue;
        }
        let pu = pileup_ref.value(i);
        if pu < cfg.pu_min || pu > cfg.pu_max {
            continue;
        }
        if let Some(bucket) = out.find_bin(pu) {
            buckets[bucket].add(value, bin_weight(series, i));
        }
    }

    for (i, acc) in buckets.iter().enumerate() {
        if !acc.is_empty() {
            out.set_bin(i, acc.mean(), acc.error() * cfg.error_scale, acc.total_weight())?;
        }
    }
    Ok(out)
}

/// Point-lookup companion to [`remap_to_pileup`]: the values of all
/// non-vetoed lumi blocks whose pile-up lies strictly within
/// `tolerance` of `target_pu`. Zero-policy filtering is left to the
/// caller.
pub fn pileup_correspondence(
    series: &TimeSeries,
    pileup_ref: &TimeSeries,
    vetoes: &VetoSet,
    target_pu: f64,
    tolerance: f64,
) -> Vec<f64> {
    let n_src = series.n_bins().min(pileup_ref.n_bins());
    (0..n_src)
        .filter(|i| !vetoes.contains(i))
        .filter(|&i| (pileup_ref.value(i) - target_pu).abs() < tolerance)
        .map(|i| series.value(i))
        .collect()
}

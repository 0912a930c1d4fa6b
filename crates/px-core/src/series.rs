//! The binned time-series type shared by every pipeline stage.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single bin: average value, statistical error, and entry count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    /// Bin value (an average for profile-like series, a count for spreads).
    pub value: f64,
    /// Statistical error on the value.
    pub error: f64,
    /// Accumulated entries (weights) behind the value.
    pub entries: f64,
}

/// Display attributes set by the owning stack and consumed by the
/// plotting backend. Never part of the numeric content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStyle {
    /// Marker style index assigned by the palette rotation.
    pub marker: Option<usize>,
    /// Color index assigned by the palette rotation.
    pub color: Option<usize>,
    /// Y-axis display maximum (range is always `0..y_max`).
    pub y_max: Option<f64>,
    /// Visible x sub-range; underlying bin data is never discarded.
    pub x_view: Option<(f64, f64)>,
    /// Horizontal display offset in axis units, used to de-overlap points.
    pub x_shift: f64,
    /// X-axis title.
    pub x_title: Option<String>,
    /// Y-axis title.
    pub y_title: Option<String>,
    /// Requested number of x-axis tick divisions.
    pub x_ticks: Option<u32>,
}

/// An ordered sequence of bins over a fixed axis `[x_min, x_max]` with
/// equal-width bins.
///
/// Bin count and axis bounds are fixed at construction; the only
/// reshaping operation is [`TimeSeries::rebin`]. Numeric content is
/// immutable once a series leaves the pipeline stage that created it;
/// only the display [`SeriesStyle`] stays settable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Series name, unique within one container snapshot.
    pub name: String,
    /// Display title; empty means "use the name".
    pub title: String,
    /// Display attributes.
    pub style: SeriesStyle,
    x_min: f64,
    x_max: f64,
    bins: Vec<Bin>,
}

impl TimeSeries {
    /// Create an empty series with `n_bins` equal-width bins over
    /// `[x_min, x_max]`.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        n_bins: usize,
        x_min: f64,
        x_max: f64,
    ) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::InvalidArgument("series needs at least one bin".into()));
        }
        if !(x_min < x_max) {
            return Err(Error::InvalidRange { min: x_min, max: x_max });
        }
        Ok(Self {
            name: name.into(),
            title: title.into(),
            style: SeriesStyle::default(),
            x_min,
            x_max,
            bins: vec![Bin::default(); n_bins],
        })
    }

    /// Lower edge of the axis.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Upper edge of the axis.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// Width of one bin.
    pub fn bin_width(&self) -> f64 {
        (self.x_max - self.x_min) / self.bins.len() as f64
    }

    /// Center of bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        self.x_min + (i as f64 + 0.5) * self.bin_width()
    }

    /// Bin containing `x`, or `None` outside the axis. The upper axis
    /// edge maps into the last bin.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if x < self.x_min || x > self.x_max {
            return None;
        }
        let i = ((x - self.x_min) / self.bin_width()).floor() as usize;
        Some(i.min(self.bins.len() - 1))
    }

    /// All bins in axis order.
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Value of bin `i` (zero outside the axis).
    pub fn value(&self, i: usize) -> f64 {
        self.bins.get(i).map_or(0.0, |b| b.value)
    }

    /// Error of bin `i` (zero outside the axis).
    pub fn error(&self, i: usize) -> f64 {
        self.bins.get(i).map_or(0.0, |b| b.error)
    }

    /// Entry count of bin `i` (zero outside the axis).
    pub fn entries(&self, i: usize) -> f64 {
        self.bins.get(i).map_or(0.0, |b| b.entries)
    }

    /// Overwrite bin `i`.
    pub fn set_bin(&mut self, i: usize, value: f64, error: f64, entries: f64) -> Result<()> {
        let n = self.bins.len();
        let bin = self
            .bins
            .get_mut(i)
            .ok_or_else(|| Error::InvalidArgument(format!("bin {i} out of range (n = {n})")))?;
        *bin = Bin { value, error, entries };
        Ok(())
    }

    /// Zero value, error, and entries of bin `i`. Out-of-range indices
    /// are ignored.
    pub fn clear_bin(&mut self, i: usize) {
        if let Some(bin) = self.bins.get_mut(i) {
            *bin = Bin::default();
        }
    }

    /// Merge adjacent groups of `factor` bins, reducing the bin count
    /// by that integer factor. Merged values are entry-weighted means
    /// (unweighted when a group carries no entries), with errors
    /// propagated accordingly.
    pub fn rebin(&mut self, factor: usize) -> Result<()> {
        if factor == 0 || self.bins.len() % factor != 0 {
            return Err(Error::InvalidArgument(format!(
                "rebin factor {factor} does not divide {} bins",
                self.bins.len()
            )));
        }
        if factor == 1 {
            return Ok(());
        }
        let merged = self
            .bins
            .chunks(factor)
            .map(|group| {
                let entries: f64 = group.iter().map(|b| b.entries).sum();
                let weight = |b: &Bin| if entries > 0.0 { b.entries } else { 1.0 };
                let total: f64 = group.iter().map(weight).sum();
                let value = group.iter().map(|b| b.value * weight(b)).sum::<f64>() / total;
                let error = group
                    .iter()
                    .map(|b| (b.error * weight(b)).powi(2))
                    .sum::<f64>()
                    .sqrt()
                    / total;
                Bin { value, error, entries }
            })
            .collect();
        self.bins = merged;
        Ok(())
    }

    /// Largest bin value, ignoring errors. Zero for an all-empty series.
    pub fn max_value(&self) -> f64 {
        self.bins.iter().fold(0.0, |m, b| if b.value > m { b.value } else { m })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn series() -> TimeSeries {
        TimeSeries::new("s", "", 10, 0.0, 10.0).unwrap()
    }

    #[test]
    fn axis_geometry() {
        let s = series();
        assert_abs_diff_eq!(s.bin_width(), 1.0);
        assert_abs_diff_eq!(s.bin_center(0), 0.5);
        assert_eq!(s.find_bin(0.0), Some(0));
        assert_eq!(s.find_bin(9.999), Some(9));
        assert_eq!(s.find_bin(10.0), Some(9));
        assert_eq!(s.find_bin(-0.1), None);
        assert_eq!(s.find_bin(10.1), None);
    }

    #[test]
    fn construction_rejects_bad_axes() {
        assert!(TimeSeries::new("s", "", 0, 0.0, 1.0).is_err());
        assert!(TimeSeries::new("s", "", 5, 2.0, 2.0).is_err());
        assert!(TimeSeries::new("s", "", 5, 3.0, 2.0).is_err());
    }

    #[test]
    fn rebin_merges_with_entry_weights() {
        let mut s = TimeSeries::new("s", "", 4, 0.0, 4.0).unwrap();
        s.set_bin(0, 0.2, 0.01, 10.0).unwrap();
        s.set_bin(1, 0.4, 0.02, 30.0).unwrap();
        s.set_bin(2, 0.6, 0.0, 0.0).unwrap();
        s.set_bin(3, 0.8, 0.0, 0.0).unwrap();
        s.rebin(2).unwrap();
        assert_eq!(s.n_bins(), 2);
        assert_abs_diff_eq!(s.bin_width(), 2.0);
        // First group: entry-weighted mean of 0.2 (w=10) and 0.4 (w=30).
        assert_abs_diff_eq!(s.value(0), 0.35, epsilon = 1e-12);
        assert_abs_diff_eq!(s.entries(0), 40.0);
        // Second group has no entries: plain mean.
        assert_abs_diff_eq!(s.value(1), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn rebin_rejects_non_divisor() {
        let mut s = series();
        assert!(s.rebin(3).is_err());
        assert!(s.rebin(0).is_err());
    }

    #[test]
    fn max_value_ignores_errors() {
        let mut s = series();
        s.set_bin(2, 0.5, 9.0, 1.0).unwrap();
        s.set_bin(7, 0.3, 0.0, 1.0).unwrap();
        assert_abs_diff_eq!(s.max_value(), 0.5);
    }
}

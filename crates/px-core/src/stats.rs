//! Online weighted statistics used by the remapper and aggregator.

use serde::{Deserialize, Serialize};

/// Online weighted mean with a standard-error-of-the-mean uncertainty.
///
/// Accumulation is commutative: any insertion order of the same
/// (value, weight) pairs yields the same mean and error up to floating
/// point. Two accumulators can be folded together with [`merge`].
///
/// [`merge`]: WeightedMean::merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedMean {
    sum_w: f64,
    sum_w2: f64,
    sum_wv: f64,
    sum_wv2: f64,
}

impl WeightedMean {
    /// Fresh, empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation. Non-positive weights are ignored.
    pub fn add(&mut self, value: f64, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        self.sum_w += weight;
        self.sum_w2 += weight * weight;
        self.sum_wv += weight * value;
        self.sum_wv2 += weight * value * value;
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: &WeightedMean) {
        self.sum_w += other.sum_w;
        self.sum_w2 += other.sum_w2;
        self.sum_wv += other.sum_wv;
        self.sum_wv2 += other.sum_wv2;
    }

    /// True before any observation with positive weight was added.
    pub fn is_empty(&self) -> bool {
        self.sum_w == 0.0
    }

    /// Total accumulated weight.
    pub fn total_weight(&self) -> f64 {
        self.sum_w
    }

    /// Effective number of entries, `(Σw)² / Σw²`.
    pub fn effective_entries(&self) -> f64 {
        if self.sum_w2 == 0.0 {
            return 0.0;
        }
        self.sum_w * self.sum_w / self.sum_w2
    }

    /// Weighted mean. Zero while empty.
    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.sum_wv / self.sum_w
    }

    /// Standard error of the mean: weighted RMS over the square root of
    /// the effective entry count. Zero while empty.
    pub fn error(&self) -> f64 {
        let n_eff = self.effective_entries();
        if n_eff == 0.0 {
            return 0.0;
        }
        let mean = self.mean();
        let variance = (self.sum_wv2 / self.sum_w - mean * mean).max(0.0);
        (variance / n_eff).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn unweighted_mean_and_sem() {
        let mut acc = WeightedMean::new();
        for v in [1.0, 2.0, 3.0, 4.0] {
            acc.add(v, 1.0);
        }
        assert_abs_diff_eq!(acc.mean(), 2.5);
        // Population RMS of {1,2,3,4} is sqrt(1.25); SEM divides by sqrt(4).
        assert_abs_diff_eq!(acc.error(), (1.25f64 / 4.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(acc.effective_entries(), 4.0);
    }

    #[test]
    fn order_independent() {
        let pairs = [(0.3, 2.0), (0.7, 1.0), (0.1, 5.0), (0.9, 0.5)];
        let mut fwd = WeightedMean::new();
        let mut rev = WeightedMean::new();
        for (v, w) in pairs {
            fwd.add(v, w);
        }
        for (v, w) in pairs.iter().rev() {
            rev.add(*v, *w);
        }
        assert_abs_diff_eq!(fwd.mean(), rev.mean(), epsilon = 1e-12);
        assert_abs_diff_eq!(fwd.error(), rev.error(), epsilon = 1e-12);
    }

    #[test]
    fn merge_matches_sequential_fill() {
        let pairs = [(0.3, 2.0), (0.7, 1.0), (0.1, 5.0), (0.9, 0.5)];
        let mut whole = WeightedMean::new();
        let mut left = WeightedMean::new();
        let mut right = WeightedMean::new();
        for (i, (v, w)) in pairs.iter().enumerate() {
            whole.add(*v, *w);
            if i % 2 == 0 {
                left.add(*v, *w);
            } else {
                right.add(*v, *w);
            }
        }
        left.merge(&right);
        assert_abs_diff_eq!(whole.mean(), left.mean(), epsilon = 1e-12);
        assert_abs_diff_eq!(whole.error(), left.error(), epsilon = 1e-12);
        assert_abs_diff_eq!(whole.total_weight(), left.total_weight(), epsilon = 1e-12);
    }

    #[test]
    fn ignores_non_positive_weights() {
        let mut acc = WeightedMean::new();
        acc.add(5.0, 0.0);
        acc.add(5.0, -1.0);
        assert!(acc.is_empty());
        assert_abs_diff_eq!(acc.mean(), 0.0);
        assert_abs_diff_eq!(acc.error(), 0.0);
    }
}

//! JSON snapshot format for container contents.
//!
//! The monitoring container itself is an external binary format; runs
//! are exported to a flat JSON snapshot (`path -> series record`) that
//! this module loads into a [`MemoryStore`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use px_core::{Error, Result, TimeSeries};

use crate::memory::MemoryStore;

/// Top-level snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Flat map of container path to series payload.
    pub series: BTreeMap<String, SeriesRecord>,
}

/// One serialized series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesRecord {
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Lower axis edge.
    pub x_min: f64,
    /// Upper axis edge.
    pub x_max: f64,
    /// Bin values; the length fixes the bin count.
    pub values: Vec<f64>,
    /// Bin errors; empty means all zero.
    #[serde(default)]
    pub errors: Vec<f64>,
    /// Bin entry counts; empty means all zero.
    #[serde(default)]
    pub entries: Vec<f64>,
}

impl SeriesRecord {
    fn into_series(self, name: &str) -> Result<TimeSeries> {
        let n = self.values.len();
        for (label, len) in [("errors", self.errors.len()), ("entries", self.entries.len())] {
            if len != 0 && len != n {
                return Err(Error::InvalidArgument(format!(
                    "series {name}: {label} length {len} does not match {n} values"
                )));
            }
        }
        let mut series = TimeSeries::new(name, self.title, n, self.x_min, self.x_max)?;
        for i in 0..n {
            let error = self.errors.get(i).copied().unwrap_or(0.0);
            let entries = self.entries.get(i).copied().unwrap_or(0.0);
            series.set_bin(i, self.values[i], error, entries)?;
        }
        Ok(series)
    }
}

impl MemoryStore {
    /// Load a snapshot from raw JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let snapshot: SnapshotFile = serde_json::from_slice(bytes)?;
        let mut store = MemoryStore::new();
        for (path, record) in snapshot.series {
            let name = path.rsplit('/').next().unwrap_or(&path).to_string();
            store.insert(path, record.into_series(&name)?);
        }
        Ok(store)
    }

    /// Load a snapshot file from disk.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SeriesStore;
    use approx::assert_abs_diff_eq;

    #[test]
    fn loads_minimal_snapshot() {
        let doc = r#"{
            "series": {
                "run_1/Pixel/Hits/Interactions_vs_lumi": {
                    "x_min": 0.0, "x_max": 3.0,
                    "values": [30.0, 40.0, 50.0]
                },
                "run_1/Pixel/Errors/occ": {
                    "title": "occupancy",
                    "x_min": 0.0, "x_max": 3.0,
                    "values": [0.1, 0.2, 0.3],
                    "errors": [0.01, 0.02, 0.03],
                    "entries": [5.0, 5.0, 5.0]
                }
            }
        }"#;
        let store = MemoryStore::from_json_slice(doc.as_bytes()).unwrap();
        assert_eq!(store.len(), 2);

        let occ = store.get("run_1/Pixel/Errors/occ").unwrap();
        assert_eq!(occ.name, "occ");
        assert_eq!(occ.title, "occupancy");
        assert_eq!(occ.n_bins(), 3);
        assert_abs_diff_eq!(occ.value(2), 0.3);
        assert_abs_diff_eq!(occ.error(1), 0.02);

        let mu = store.get("run_1/Pixel/Hits/Interactions_vs_lumi").unwrap();
        assert_abs_diff_eq!(mu.error(0), 0.0);
        assert_abs_diff_eq!(mu.entries(0), 0.0);
    }

    #[test]
    fn rejects_mismatched_error_lengths() {
        let doc = r#"{
            "series": {
                "a/b": { "x_min": 0.0, "x_max": 2.0, "values": [1.0, 2.0], "errors": [0.1] }
            }
        }"#;
        let err = MemoryStore::from_json_slice(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = MemoryStore::from_json_slice(b"not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}

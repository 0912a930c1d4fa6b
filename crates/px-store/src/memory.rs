//! In-memory snapshot store over a sorted path map.

use std::collections::{BTreeMap, BTreeSet};

use px_core::TimeSeries;

use crate::store::{ChildEntry, SeriesStore};

/// A container snapshot held entirely in memory.
///
/// Directory structure is derived from the `/`-separated keys: every
/// proper prefix of a stored path is a group. `BTreeMap` keeps listings
/// in natural string order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    series: BTreeMap<String, TimeSeries>,
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a series under `path` (groups come into existence
    /// implicitly). Replaces any previous series at the same path.
    pub fn insert(&mut self, path: impl Into<String>, series: TimeSeries) {
        let path: String = path.into();
        self.series.insert(normalize(&path).to_string(), series);
    }

    /// Number of stored series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// All stored paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    fn keys_under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.series
            .range(prefix.to_string()..)
            .map(|(k, _)| k.as_str())
            .take_while(move |k| k.starts_with(prefix))
    }
}

impl SeriesStore for MemoryStore {
    fn get(&self, path: &str) -> Option<TimeSeries> {
        self.series.get(normalize(path)).cloned()
    }

    fn list_children(&self, path: &str) -> Option<Vec<ChildEntry>> {
        let path = normalize(path);
        if !path.is_empty() && self.series.contains_key(path) {
            // A leaf, not a group.
            return None;
        }
        let prefix = if path.is_empty() { String::new() } else { format!("{path}/") };
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for key in self.keys_under(&prefix) {
            let rest = &key[prefix.len()..];
            let (name, is_group) = match rest.split_once('/') {
                Some((head, _)) => (head, true),
                None => (rest, false),
            };
            if seen.insert(name.to_string()) {
                out.push(ChildEntry { name: name.to_string(), is_group });
            }
        }
        if out.is_empty() && !path.is_empty() {
            return None;
        }
        Some(out)
    }

    fn has_group(&self, path: &str) -> bool {
        let path = normalize(path);
        if path.is_empty() {
            return true;
        }
        let prefix = format!("{path}/");
        let found = self.keys_under(&prefix).next().is_some();
        found
    }
}

//! Module discovery: enumerate per-module series names below the
//! occupancy directory and filter them by pattern.

use std::collections::BTreeSet;

use regex::Regex;

use px_core::{Error, Result};
use px_store::SeriesStore;

use crate::module_dir;

/// Find all module series below `prefix`, three group levels deep
/// (component / sub-component / module), whose full relative name
/// matches `pattern`.
///
/// Matching uses regex *search* semantics (unanchored substring); an
/// empty pattern matches everything. Non-series entries at the module
/// level are skipped silently; a missing base directory is fatal.
/// The result is deduplicated and sorted.
pub fn find_modules(
    store: &dyn SeriesStore,
    prefix: &str,
    pattern: &str,
) -> Result<BTreeSet<String>> {
    let filter = if pattern.is_empty() {
        None
    } else {
        Some(Regex::new(pattern).map_err(|e| {
            Error::InvalidArgument(format!("bad module pattern {pattern:?}: {e}"))
        })?)
    };

    let base = module_dir(prefix);
    let components =
        store.list_children(&base).ok_or_else(|| Error::NotFound(base.clone()))?;

    let mut modules = BTreeSet::new();
    for component in components.iter().filter(|c| c.is_group) {
        let component_path = format!("{base}{}", component.name);
        let groups = store
            .list_children(&component_path)
            .ok_or_else(|| Error::NotFound(component_path.clone()))?;

        for group in groups.iter().filter(|g| g.is_group) {
            let group_path = format!("{component_path}/{}", group.name);
            let leaves = store
                .list_children(&group_path)
                .ok_or_else(|| Error::NotFound(group_path.clone()))?;

            for leaf in leaves.iter().filter(|l| !l.is_group) {
                let full_name = format!("{}/{}/{}", component.name, group.name, leaf.name);
                if filter.as_ref().map_or(true, |re| re.is_match(&full_name)) {
                    modules.insert(full_name);
                }
            }
        }
    }

    tracing::debug!(count = modules.len(), pattern, "module discovery complete");
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_path;
    use px_core::TimeSeries;
    use px_store::MemoryStore;

    fn leaf(name: &str) -> TimeSeries {
        TimeSeries::new(name, "", 4, 0.0, 4.0).unwrap()
    }

    /// 2 components x 2 sub-groups x 2 leaves.
    fn synthetic_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        for component in ["A", "B"] {
            for group in ["S1", "S2"] {
                for module in ["m0", "m1"] {
                    let path = module_path("run_1/Pixel/", &format!("{component}/{group}/{module}"));
                    store.insert(path, leaf(module));
                }
            }
        }
        store
    }

    #[test]
    fn empty_pattern_matches_everything() {
        let store = synthetic_store();
        let found = find_modules(&store, "run_1/Pixel/", "").unwrap();
        assert_eq!(found.len(), 8);
        // BTreeSet keeps natural string order.
        assert_eq!(found.iter().next().unwrap(), "A/S1/m0");
        assert_eq!(found.iter().last().unwrap(), "B/S2/m1");
    }

    #[test]
    fn anchored_pattern_selects_one_component() {
        let store = synthetic_store();
        let found = find_modules(&store, "run_1/Pixel/", "^A").unwrap();
        let expected: Vec<&str> = vec!["A/S1/m0", "A/S1/m1", "A/S2/m0", "A/S2/m1"];
        assert_eq!(found.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn pattern_uses_search_semantics() {
        let store = synthetic_store();
        // "m1" is a substring match anywhere in the full name.
        let found = find_modules(&store, "run_1/Pixel/", "m1").unwrap();
        assert_eq!(found.len(), 4);
        assert!(found.iter().all(|m| m.ends_with("m1")));
    }

    #[test]
    fn missing_base_directory_is_fatal() {
        let store = synthetic_store();
        let err = find_modules(&store, "run_2/Pixel/", "").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let store = synthetic_store();
        let err = find_modules(&store, "run_1/Pixel/", "[unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn non_series_leaves_are_ignored() {
        let mut store = synthetic_store();
        // A fourth-level entry makes "extra" a group at module depth.
        let path = module_path("run_1/Pixel/", "A/S1/extra/deeper");
        store.insert(path, leaf("deeper"));
        let found = find_modules(&store, "run_1/Pixel/", "^A/S1").unwrap();
        assert_eq!(found.len(), 2);
        assert!(!found.contains("A/S1/extra"));
    }
}

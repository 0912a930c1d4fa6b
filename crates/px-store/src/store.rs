//! The narrow read-only container interface the pipeline depends on.

use px_core::TimeSeries;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    /// Entry name relative to the listed path.
    pub name: String,
    /// True for a group (directory), false for a leaf series.
    pub is_group: bool,
}

/// Read-only hierarchical series container.
///
/// Paths are `/`-separated; a trailing `/` is tolerated everywhere.
/// The store is a snapshot: nothing behind it mutates during a run.
pub trait SeriesStore {
    /// The series stored at `path`, or `None` if absent or a group.
    /// Callers own the returned copy outright.
    fn get(&self, path: &str) -> Option<TimeSeries>;

    /// Ordered children of the group at `path`, or `None` if `path`
    /// is absent or a leaf.
    fn list_children(&self, path: &str) -> Option<Vec<ChildEntry>>;

    /// Whether `path` names a group.
    fn has_group(&self, path: &str) -> bool;
}

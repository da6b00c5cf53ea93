//! Durable built/removed markers.
//!
//! A per-(table, index) marker records whether an index is built and
//! usable for queries. The lifecycle manager writes it at well-defined
//! points of the build/rebuild sequence so that a crash mid-rebuild leaves
//! the index durably marked "not built" rather than silently stale. The
//! engine owns the real store; [`MemoryBuildStatus`] serves tests and
//! single-process embedding.

use std::collections::BTreeSet;

use parking_lot::Mutex;

use basalt_commons::{IndexName, TableName};

use crate::error::Result;

/// Persistence seam for the built/removed marker.
pub trait BuildStatusStore: Send + Sync {
    /// Durably marks the index built and usable for queries.
    fn mark_built(&self, table: &TableName, index: &IndexName) -> Result<()>;

    /// Durably marks the index not built; queries must not use it until a
    /// successful rebuild marks it built again.
    fn mark_removed(&self, table: &TableName, index: &IndexName) -> Result<()>;

    /// The subset of `candidates` currently marked built for `table`.
    fn built_indexes(&self, table: &TableName, candidates: &[IndexName]) -> Result<Vec<IndexName>>;
}

/// In-memory marker store.
#[derive(Default)]
pub struct MemoryBuildStatus {
    built: Mutex<BTreeSet<(TableName, IndexName)>>,
}

impl MemoryBuildStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_built(&self, table: &TableName, index: &IndexName) -> bool {
        self.built
            .lock()
            .contains(&(table.clone(), index.clone()))
    }
}

impl BuildStatusStore for MemoryBuildStatus {
    fn mark_built(&self, table: &TableName, index: &IndexName) -> Result<()> {
        self.built.lock().insert((table.clone(), index.clone()));
        Ok(())
    }

    fn mark_removed(&self, table: &TableName, index: &IndexName) -> Result<()> {
        self.built.lock().remove(&(table.clone(), index.clone()));
        Ok(())
    }

    fn built_indexes(&self, table: &TableName, candidates: &[IndexName]) -> Result<Vec<IndexName>> {
        let built = self.built.lock();
        Ok(candidates
            .iter()
            .filter(|name| built.contains(&(table.clone(), (*name).clone())))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_query() {
        let store = MemoryBuildStatus::new();
        let table = TableName::new("items");
        let a = IndexName::new("by_color");
        let b = IndexName::new("by_size");

        store.mark_built(&table, &a).unwrap();

        assert!(store.is_built(&table, &a));
        assert!(!store.is_built(&table, &b));
        assert_eq!(
            store.built_indexes(&table, &[a.clone(), b.clone()]).unwrap(),
            vec![a.clone()]
        );

        store.mark_removed(&table, &a).unwrap();
        assert!(store.built_indexes(&table, &[a, b]).unwrap().is_empty());
    }

    #[test]
    fn test_markers_scoped_by_table() {
        let store = MemoryBuildStatus::new();
        let index = IndexName::new("by_color");

        store.mark_built(&TableName::new("items"), &index).unwrap();
        assert!(!store.is_built(&TableName::new("orders"), &index));
    }
}

//! Name-keyed registry of live index instances.
//!
//! The registry is the single source of truth for which indexes exist on a
//! table. It is safe for concurrent reads with single-writer mutation and
//! never blocks on I/O: any index-state I/O happens before registration
//! (build) or after unregistration (invalidate), driven by the lifecycle
//! manager.

use std::sync::Arc;

use dashmap::DashMap;

use basalt_commons::{ColumnSet, IndexMetadata, IndexName};

use crate::index::Index;

/// Mapping from index name to index instance.
#[derive(Default)]
pub struct IndexRegistry {
    indexes: DashMap<IndexName, Arc<dyn Index>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self {
            indexes: DashMap::new(),
        }
    }

    /// Registers an index under its name, replacing any previous instance
    /// registered under the same name.
    pub fn register(&self, index: Arc<dyn Index>) {
        let name = index.name().clone();
        log::debug!("Registered index {}", name);
        self.indexes.insert(name, index);
    }

    /// Removes an index from the registry, returning it if it was present.
    pub fn unregister(&self, name: &IndexName) -> Option<Arc<dyn Index>> {
        let removed = self.indexes.remove(name).map(|(_, index)| index);
        match &removed {
            Some(_) => log::debug!("Removed index {} from registry", name),
            None => log::debug!("Index {} was not registered", name),
        }
        removed
    }

    pub fn get(&self, name: &IndexName) -> Option<Arc<dyn Index>> {
        self.indexes.get(name).map(|e| Arc::clone(e.value()))
    }

    /// Looks up the registered instance for a metadata entry, by name.
    pub fn get_by_metadata(&self, metadata: &IndexMetadata) -> Option<Arc<dyn Index>> {
        self.get(&metadata.name)
    }

    /// Snapshot of all registered instances.
    pub fn list(&self) -> Vec<Arc<dyn Index>> {
        self.indexes.iter().map(|e| Arc::clone(e.value())).collect()
    }

    /// All registered instances that declare interest in `columns`.
    pub fn interested_in(&self, columns: &ColumnSet) -> Vec<Arc<dyn Index>> {
        self.indexes
            .iter()
            .filter(|e| e.value().indexes_columns(columns))
            .map(|e| Arc::clone(e.value()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }
}

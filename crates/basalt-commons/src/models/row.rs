//! Rows and the clustering/liveness metadata attached to them.

use std::collections::BTreeMap;

use crate::models::cell::Cell;
use crate::models::column::{ColumnName, ColumnSet};

/// Ordered clustering key identifying a row within its partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Clustering(Vec<Vec<u8>>);

impl Clustering {
    pub fn new(components: Vec<Vec<u8>>) -> Self {
        Self(components)
    }

    /// Single-component convenience constructor.
    pub fn of(component: impl Into<Vec<u8>>) -> Self {
        Self(vec![component.into()])
    }

    /// The empty clustering, used by static rows.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn components(&self) -> &[Vec<u8>] {
        &self.0
    }
}

/// Metadata indicating whether, and for how long, the row itself (apart
/// from its cells) is considered present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessInfo {
    pub timestamp: i64,
    pub ttl_secs: Option<i32>,
}

impl LivenessInfo {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ttl_secs: None,
        }
    }

    pub fn expiring(timestamp: i64, ttl_secs: i32) -> Self {
        Self {
            timestamp,
            ttl_secs: Some(ttl_secs),
        }
    }
}

/// A row: clustering key, optional liveness metadata, and cells keyed by
/// column in key order.
///
/// Cells are stored in a `BTreeMap` so any walk over them (including the
/// delta engine's) observes column-key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    clustering: Clustering,
    liveness: Option<LivenessInfo>,
    cells: BTreeMap<ColumnName, Cell>,
}

impl Row {
    pub fn new(clustering: Clustering) -> Self {
        Self {
            clustering,
            liveness: None,
            cells: BTreeMap::new(),
        }
    }

    pub fn clustering(&self) -> &Clustering {
        &self.clustering
    }

    pub fn liveness(&self) -> Option<&LivenessInfo> {
        self.liveness.as_ref()
    }

    pub fn set_liveness(&mut self, liveness: LivenessInfo) {
        self.liveness = Some(liveness);
    }

    /// Builder-style liveness attachment.
    pub fn with_liveness(mut self, liveness: LivenessInfo) -> Self {
        self.liveness = Some(liveness);
        self
    }

    /// Inserts a cell, replacing any existing cell for the same column.
    pub fn push_cell(&mut self, cell: Cell) {
        self.cells.insert(cell.column.clone(), cell);
    }

    /// Builder-style cell insertion.
    pub fn with_cell(mut self, cell: Cell) -> Self {
        self.push_cell(cell);
        self
    }

    pub fn cell(&self, column: &ColumnName) -> Option<&Cell> {
        self.cells.get(column)
    }

    /// Cells in column-key order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Column names present in this row, in key order.
    pub fn column_names(&self) -> impl Iterator<Item = &ColumnName> {
        self.cells.keys()
    }

    pub fn columns(&self) -> ColumnSet {
        self.cells.keys().cloned().collect()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// A row is empty when it has no cells and no liveness metadata.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.liveness.is_none()
    }
}

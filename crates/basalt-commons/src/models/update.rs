//! Write-path mutation events.

use crate::models::column::ColumnSet;
use crate::models::deletion::{DeletionTime, RangeTombstone};
use crate::models::partition::PartitionKey;
use crate::models::row::Row;

/// A single write-path mutation against one partition.
///
/// `columns` is the touched-column set the transaction factory and
/// write-path validation consult; it covers every cell in `rows` and
/// `static_row`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionUpdate {
    pub key: PartitionKey,
    pub columns: ColumnSet,
    pub partition_deletion: Option<DeletionTime>,
    pub range_tombstones: Vec<RangeTombstone>,
    pub static_row: Option<Row>,
    pub rows: Vec<Row>,
}

impl PartitionUpdate {
    pub fn new(key: PartitionKey) -> Self {
        Self {
            key,
            columns: ColumnSet::new(),
            partition_deletion: None,
            range_tombstones: Vec::new(),
            static_row: None,
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Row) -> Self {
        for column in row.column_names() {
            self.columns.insert(column.clone());
        }
        self.rows.push(row);
        self
    }

    pub fn with_static_row(mut self, row: Row) -> Self {
        for column in row.column_names() {
            self.columns.insert(column.clone());
        }
        self.static_row = Some(row);
        self
    }

    pub fn with_deletion(mut self, deletion: DeletionTime) -> Self {
        self.partition_deletion = Some(deletion);
        self
    }

    pub fn with_range_tombstone(mut self, tombstone: RangeTombstone) -> Self {
        self.range_tombstones.push(tombstone);
        self
    }
}

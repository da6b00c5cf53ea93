//! Partition keys and full-partition views.

use std::fmt;

use crate::models::column::ColumnSet;
use crate::models::deletion::DeletionTime;
use crate::models::row::Row;

/// Opaque partition key bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey(Vec<u8>);

impl PartitionKey {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self(key.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// A full view of one partition: its key, partition-level deletion, static
/// row and live rows in clustering order.
///
/// This is the unit a full-partition scan yields; rows are the live view,
/// already purged of shadowed data by the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionData {
    pub key: PartitionKey,
    pub partition_deletion: Option<DeletionTime>,
    pub static_row: Row,
    pub rows: Vec<Row>,
}

impl PartitionData {
    pub fn new(key: PartitionKey) -> Self {
        Self {
            key,
            partition_deletion: None,
            static_row: Row::new(crate::models::row::Clustering::empty()),
            rows: Vec::new(),
        }
    }

    pub fn with_deletion(mut self, deletion: DeletionTime) -> Self {
        self.partition_deletion = Some(deletion);
        self
    }

    pub fn with_static_row(mut self, static_row: Row) -> Self {
        self.static_row = static_row;
        self
    }

    pub fn with_row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    /// Union of the columns present in the static row and every live row.
    pub fn columns(&self) -> ColumnSet {
        self.static_row
            .column_names()
            .chain(self.rows.iter().flat_map(Row::column_names))
            .cloned()
            .collect()
    }
}

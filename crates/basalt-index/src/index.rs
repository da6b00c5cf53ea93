//! The capability contract between the coordination layer and index
//! implementations.
//!
//! An [`Index`] reports which columns and expressions it covers, hands out
//! lifecycle tasks as deferred units of work, and supplies short-lived
//! [`Indexer`] handles that receive the mutations of exactly one
//! (partition, point-in-time, operation-group, transaction-kind) tuple.
//! Index storage and query execution live entirely behind this trait.

use std::sync::Arc;

use basalt_commons::{
    ColumnName, ColumnSet, DeletionTime, IndexMetadata, IndexName, Operator, PartitionKey,
    PartitionUpdate, RangeTombstone, Row, TableName,
};

use crate::barrier::OperationGroup;
use crate::error::Result;

/// A deferred unit of index work: build, flush, truncate, invalidate or
/// metadata reload. `None` from a task factory means "nothing to do".
pub type IndexTask = Box<dyn FnOnce() -> Result<()> + Send>;

/// Which mutation path a transaction (and the indexers it obtains) serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Update,
    Compaction,
    Cleanup,
}

/// Everything an index needs to mint an [`Indexer`] for one mutation.
#[derive(Clone)]
pub struct IndexerContext {
    pub key: PartitionKey,
    pub now_secs: i64,
    pub group: OperationGroup,
    pub kind: TransactionKind,
}

impl IndexerContext {
    pub fn new(
        key: PartitionKey,
        now_secs: i64,
        group: OperationGroup,
        kind: TransactionKind,
    ) -> Self {
        Self {
            key,
            now_secs,
            group,
            kind,
        }
    }
}

/// A secondary index registered against one base table.
///
/// Implementations must be thread-safe (`Send + Sync`); instances are
/// shared through `Arc` between the registry and in-flight transactions.
pub trait Index: Send + Sync + std::fmt::Debug {
    /// Stable identity of the index.
    fn name(&self) -> &IndexName;

    /// The metadata this instance was created from. Compared against
    /// incoming schema to decide whether a reload is needed.
    fn metadata(&self) -> &IndexMetadata;

    /// True when a mutation touching `columns` is of interest to this index.
    fn indexes_columns(&self, columns: &ColumnSet) -> bool;

    /// True when this index can serve `column <operator> ?` expressions.
    fn supports_expression(&self, column: &ColumnName, operator: Operator) -> bool;

    /// Self-reported estimate of the number of rows a typical query
    /// against this index returns. Consulted during index selection.
    fn estimated_result_rows(&self) -> u64;

    /// Checks an update against this index's constraints. Runs before any
    /// indexer is obtained; an error rejects the whole write.
    fn validate(&self, update: &PartitionUpdate) -> Result<()> {
        let _ = update;
        Ok(())
    }

    /// Initial build over existing data, if this instance needs one when
    /// first registered (e.g. its durable marker says "not built").
    fn initialization_task(&self) -> Option<IndexTask> {
        None
    }

    /// Re-read configuration after a metadata change.
    fn metadata_reload_task(&self, metadata: &IndexMetadata) -> Option<IndexTask> {
        let _ = metadata;
        None
    }

    /// Flush in-memory index state. Only used for indexes without a
    /// backing table; backed indexes flush through that table instead.
    fn flush_task(&self) -> Option<IndexTask> {
        None
    }

    /// Discard all entries as of `truncated_at`.
    fn truncate_task(&self, truncated_at: i64) -> Option<IndexTask> {
        let _ = truncated_at;
        None
    }

    /// Tear down the index permanently; runs after unregistration.
    fn invalidate_task(&self) -> Option<IndexTask> {
        None
    }

    /// The index's own storage table, when it has one. Its presence routes
    /// flushes through the table's flush path.
    fn backing_table(&self) -> Option<Arc<dyn BackingTable>> {
        None
    }

    /// Mints the per-mutation handle for one partition. The returned
    /// indexer is exclusively owned by the transaction that requested it
    /// and is never reused.
    fn indexer_for(&self, ctx: &IndexerContext) -> Box<dyn Indexer>;
}

/// Per-mutation handle an index hands out to receive insert/remove/deletion
/// notifications.
///
/// Protocol: `begin()`, then any number of mutation hooks, then `finish()`.
/// Hooks are never invoked outside the begin/finish bracket. For
/// `update_row`, `old` carries the cells to purge from the index and `new`
/// the cells to add; both are delta rows, not full rows.
pub trait Indexer: Send {
    fn begin(&mut self) {}

    fn partition_delete(&mut self, _deletion: &DeletionTime) {}

    fn range_tombstone(&mut self, _tombstone: &RangeTombstone) {}

    fn insert_row(&mut self, _row: &Row) {}

    fn update_row(&mut self, _old: &Row, _new: &Row) {}

    fn remove_row(&mut self, _row: &Row) {}

    fn finish(&mut self) {}
}

/// The storage table backing an index, when the index keeps its data in
/// one. Flushing a backed index goes through this seam.
pub trait BackingTable: Send + Sync {
    fn name(&self) -> &TableName;

    fn force_flush(&self) -> Result<()>;
}

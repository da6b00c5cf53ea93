//! Cleanup-path transaction.

use std::sync::Arc;

use basalt_commons::{DeletionTime, PartitionKey, Row};

use crate::barrier::OperationBarrier;
use crate::index::{Index, Indexer, IndexerContext, TransactionKind};
use crate::transactions::TransactionState;

/// Single-use transaction removing index entries when cleanup rips data
/// out of a partition.
///
/// Records at most one partition deletion and one row between start and
/// commit; cleanup transactions are single-event units, so partition
/// removal issues one transaction for the deletion plus one per live row.
/// Like compaction, commit acquires a concurrency group only when
/// something was recorded.
pub struct CleanupTransaction {
    inner: Option<CleanupInner>,
    state: TransactionState,
}

struct CleanupInner {
    key: PartitionKey,
    now_secs: i64,
    barrier: Arc<dyn OperationBarrier>,
    indexes: Vec<Arc<dyn Index>>,
    partition_delete: Option<DeletionTime>,
    row: Option<Row>,
}

impl CleanupTransaction {
    pub(crate) fn new(
        key: PartitionKey,
        now_secs: i64,
        barrier: Arc<dyn OperationBarrier>,
        indexes: Vec<Arc<dyn Index>>,
    ) -> Self {
        debug_assert!(
            !indexes.is_empty(),
            "built with no indexes; use the no-op form instead"
        );
        Self {
            inner: Some(CleanupInner {
                key,
                now_secs,
                barrier,
                indexes,
                partition_delete: None,
                row: None,
            }),
            state: TransactionState::Created,
        }
    }

    /// The no-op form returned when no index cares about the partition's
    /// columns.
    pub const fn no_op() -> Self {
        Self {
            inner: None,
            state: TransactionState::Created,
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.inner.is_none()
    }

    pub fn start(&mut self) {
        self.state.assert_can_start("cleanup");
        self.state = TransactionState::Started;
    }

    pub fn on_partition_deletion(&mut self, deletion: &DeletionTime) {
        self.state.assert_started("cleanup", "partition deletion");
        if let Some(inner) = &mut self.inner {
            inner.partition_delete = Some(*deletion);
        }
    }

    pub fn on_row_delete(&mut self, row: &Row) {
        self.state.assert_started("cleanup", "row delete");
        if let Some(inner) = &mut self.inner {
            inner.row = Some(row.clone());
        }
    }

    pub fn commit(&mut self) {
        self.state.assert_can_commit("cleanup");
        self.state = TransactionState::Committed;
        let Some(inner) = &mut self.inner else {
            return;
        };
        if inner.partition_delete.is_none() && inner.row.is_none() {
            return;
        }

        let group = inner.barrier.start();
        let ctx = IndexerContext::new(
            inner.key.clone(),
            inner.now_secs,
            group,
            TransactionKind::Cleanup,
        );
        let mut indexers: Vec<Box<dyn Indexer>> =
            inner.indexes.iter().map(|i| i.indexer_for(&ctx)).collect();

        for indexer in &mut indexers {
            indexer.begin();
        }
        if let Some(deletion) = &inner.partition_delete {
            for indexer in &mut indexers {
                indexer.partition_delete(deletion);
            }
        }
        if let Some(row) = &inner.row {
            for indexer in &mut indexers {
                indexer.remove_row(row);
            }
        }
        for indexer in &mut indexers {
            indexer.finish();
        }
    }
}

//! Compaction-path transaction.

use std::sync::Arc;

use basalt_commons::{PartitionKey, Row};

use crate::barrier::OperationBarrier;
use crate::delta::diff_merge;
use crate::index::{Index, Indexer, IndexerContext, TransactionKind};
use crate::transactions::TransactionState;

/// Single-use transaction purging index entries whose source versions were
/// superseded while merging one partition during compaction.
///
/// `on_row_merge` may be called once per merged row when a large partition
/// is merged in runs; removal rows accumulate across calls. Nothing
/// touches an index until commit: if anything accumulated, commit acquires
/// a concurrency group, obtains compaction-tagged indexers, and applies
/// every removal row inside their begin/finish bracket. An empty commit is
/// free.
pub struct CompactionTransaction {
    inner: Option<CompactionInner>,
    state: TransactionState,
}

struct CompactionInner {
    key: PartitionKey,
    now_secs: i64,
    barrier: Arc<dyn OperationBarrier>,
    indexes: Vec<Arc<dyn Index>>,
    removals: Vec<Row>,
}

impl CompactionTransaction {
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
            inner: Some(CompactionInner {
                key,
                now_secs,
                barrier,
                indexes,
                removals: Vec::new(),
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
        self.state.assert_can_start("compaction");
        self.state = TransactionState::Started;
    }

    /// Diffs one merged row against its source versions, accumulating a
    /// removal row for every source whose contribution was superseded.
    pub fn on_row_merge(&mut self, merged: &Row, versions: &[Option<Row>]) {
        self.state.assert_started("compaction", "row merge");
        let Some(inner) = &mut self.inner else {
            return;
        };
        for removal in diff_merge(merged, versions).into_iter().flatten() {
            inner.removals.push(removal);
        }
    }

    pub fn commit(&mut self) {
        self.state.assert_can_commit("compaction");
        self.state = TransactionState::Committed;
        let Some(inner) = &mut self.inner else {
            return;
        };
        if inner.removals.is_empty() {
            return;
        }

        let group = inner.barrier.start();
        let ctx = IndexerContext::new(
            inner.key.clone(),
            inner.now_secs,
            group,
            TransactionKind::Compaction,
        );
        let mut indexers: Vec<Box<dyn Indexer>> =
            inner.indexes.iter().map(|i| i.indexer_for(&ctx)).collect();

        for indexer in &mut indexers {
            indexer.begin();
        }
        for row in &inner.removals {
            for indexer in &mut indexers {
                indexer.remove_row(row);
            }
        }
        for indexer in &mut indexers {
            indexer.finish();
        }
    }
}

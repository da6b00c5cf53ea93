//! Write-path transaction.

use basalt_commons::{DeletionTime, RangeTombstone, Row};

use crate::delta::diff_rows;
use crate::index::Indexer;
use crate::transactions::TransactionState;

/// Single-use transaction applying one write-path partition update to
/// every interested index.
///
/// Partition deletions and range tombstones are forwarded verbatim; row
/// updates go through the delta engine so indexers only see the cells that
/// actually changed. Hooks are applied in invocation order and `finish()`
/// reaches the indexers only at commit, after every hook has been
/// delivered, so indexes never observe a partially-applied mutation.
///
/// No concurrency group is acquired here: the write path's caller already
/// holds one spanning the whole write.
pub struct UpdateTransaction {
    indexers: Vec<Box<dyn Indexer>>,
    state: TransactionState,
}

impl UpdateTransaction {
    pub(crate) fn new(indexers: Vec<Box<dyn Indexer>>) -> Self {
        debug_assert!(
            !indexers.is_empty(),
            "built with no indexers; use the no-op form instead"
        );
        Self {
            indexers,
            state: TransactionState::Created,
        }
    }

    /// The no-op form returned when no index cares about the update.
    pub const fn no_op() -> Self {
        Self {
            indexers: Vec::new(),
            state: TransactionState::Created,
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.indexers.is_empty()
    }

    pub fn start(&mut self) {
        self.state.assert_can_start("update");
        self.state = TransactionState::Started;
        for indexer in &mut self.indexers {
            indexer.begin();
        }
    }

    pub fn on_partition_deletion(&mut self, deletion: &DeletionTime) {
        self.state.assert_started("update", "partition deletion");
        for indexer in &mut self.indexers {
            indexer.partition_delete(deletion);
        }
    }

    pub fn on_range_tombstone(&mut self, tombstone: &RangeTombstone) {
        self.state.assert_started("update", "range tombstone");
        for indexer in &mut self.indexers {
            indexer.range_tombstone(tombstone);
        }
    }

    pub fn on_inserted(&mut self, row: &Row) {
        self.state.assert_started("update", "row inserted");
        for indexer in &mut self.indexers {
            indexer.insert_row(row);
        }
    }

    /// Diffs the existing row against its updated state and forwards only
    /// the delta.
    pub fn on_updated(&mut self, existing: &Row, updated: &Row) {
        self.state.assert_started("update", "row updated");
        if self.indexers.is_empty() {
            return;
        }
        let delta = diff_rows(existing, updated);
        for indexer in &mut self.indexers {
            indexer.update_row(&delta.to_remove, &delta.to_insert);
        }
    }

    pub fn commit(&mut self) {
        self.state.assert_can_commit("update");
        self.state = TransactionState::Committed;
        for indexer in &mut self.indexers {
            indexer.finish();
        }
    }
}

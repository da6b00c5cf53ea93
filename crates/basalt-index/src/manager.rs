//! Per-table index lifecycle manager and transaction factory.

use std::sync::Arc;

use parking_lot::Mutex;

use basalt_commons::{
    ColumnSet, IndexMetadata, IndexName, PartitionData, PartitionKey, PartitionUpdate, RowFilter,
    TableName,
};

use crate::barrier::{OperationBarrier, OperationGroup};
use crate::build_status::BuildStatusStore;
use crate::constructors::IndexConstructors;
use crate::error::{IndexError, Result};
use crate::executor::{execute_blocking, SerialExecutor, TaskHandle};
use crate::index::{BackingTable, Index, IndexTask, Indexer, IndexerContext, TransactionKind};
use crate::registry::IndexRegistry;
use crate::scan::PartitionScan;
use crate::selector;
use crate::transactions::{CleanupTransaction, CompactionTransaction, UpdateTransaction};

/// Handles the core maintenance functionality associated with the indexes
/// of one base table: adding and removing them, (re)building over existing
/// data, flushing, reloading metadata, and keeping them in sync with base
/// data through the write, compaction and cleanup paths.
///
/// Lifecycle tasks obtained from indexes run on one of two lanes. Most are
/// executed synchronously on the calling thread: tasks like flushing an
/// index must complete inside a larger flush protocol's critical section,
/// and deferring them risks deadlocking against it. The exception is the
/// initial build returned from `add_index`: it can mean scanning all
/// existing data, so it is queued on a dedicated single-worker thread and
/// the schema path gets back a [`TaskHandle`] it must not block on.
/// Capping builds at one also keeps concurrent rebuilds from competing
/// with compaction for resources.
///
/// Registry mutation (`add_index`/`remove_index`) is serialized under one
/// per-table lock so concurrent schema operations cannot race to create
/// duplicate or half-registered instances.
pub struct IndexManager {
    table: TableName,
    registry: IndexRegistry,
    constructors: IndexConstructors,
    build_status: Arc<dyn BuildStatusStore>,
    barrier: Arc<dyn OperationBarrier>,
    build_executor: SerialExecutor,
    mutation_lock: Mutex<()>,
}

impl IndexManager {
    pub fn new(
        table: TableName,
        constructors: IndexConstructors,
        build_status: Arc<dyn BuildStatusStore>,
        barrier: Arc<dyn OperationBarrier>,
    ) -> Self {
        let build_executor = SerialExecutor::new(&format!("index-build-{}", table));
        Self {
            table,
            registry: IndexRegistry::new(),
            constructors,
            build_status,
            barrier,
            build_executor,
            mutation_lock: Mutex::new(()),
        }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// True when ANY index is registered for this table.
    pub fn has_indexes(&self) -> bool {
        !self.registry.is_empty()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Reconciles the registry against the table's current metadata:
    /// registered indexes absent from `metadata` are invalidated and
    /// unregistered, and every metadata entry is added or reloaded.
    /// Initial builds triggered here proceed in the background.
    pub fn reload(&self, metadata: &[IndexMetadata]) -> Result<()> {
        let defined: Vec<&IndexName> = metadata.iter().map(|m| &m.name).collect();
        let stale: Vec<IndexName> = self
            .registry
            .list()
            .iter()
            .map(|index| index.name().clone())
            .filter(|name| !defined.contains(&name))
            .collect();
        for name in stale {
            self.remove_index(&name)?;
        }

        // add_index for every definition in the collection, as some may
        // only exist in schema and not have been created here yet.
        for index_metadata in metadata {
            self.add_index(index_metadata)?;
        }
        Ok(())
    }

    /// Adds and builds an index described by `metadata`.
    ///
    /// If an index of that name is already registered, its stored metadata
    /// decides: unchanged metadata is a no-op, changed metadata runs the
    /// instance's metadata-reload task synchronously. A new index is
    /// constructed through the pluggable constructor registry, registered,
    /// and, only if it reports it needs one, its initial build is queued
    /// on the build lane. The returned handle resolves when any such build
    /// completes; callers on the schema path must not block on it.
    pub fn add_index(&self, metadata: &IndexMetadata) -> Result<TaskHandle> {
        let _guard = self.mutation_lock.lock();
        match self.registry.get(&metadata.name) {
            Some(existing) => self.reload_index(&existing, metadata),
            None => self.create_index(metadata),
        }
    }

    fn reload_index(&self, existing: &Arc<dyn Index>, metadata: &IndexMetadata) -> Result<TaskHandle> {
        if existing.metadata() == metadata {
            return Ok(TaskHandle::ready());
        }
        self.run_task(
            existing.name(),
            "metadata reload",
            existing.metadata_reload_task(metadata),
        )?;
        Ok(TaskHandle::ready())
    }

    fn create_index(&self, metadata: &IndexMetadata) -> Result<TaskHandle> {
        let index = self.constructors.construct(&self.table, metadata)?;
        self.registry.register(Arc::clone(&index));
        match index.initialization_task() {
            None => Ok(TaskHandle::ready()),
            Some(task) => {
                log::info!("Submitting initial build of index {}", index.name());
                Ok(self.build_executor.submit(task))
            }
        }
    }

    /// Removes the index from the registry and synchronously runs its
    /// invalidate task. Unknown names are a no-op.
    pub fn remove_index(&self, name: &IndexName) -> Result<()> {
        let _guard = self.mutation_lock.lock();
        if let Some(index) = self.registry.unregister(name) {
            self.run_task(name, "invalidate", index.invalidate_task())?;
        }
        Ok(())
    }

    /// Durably marks every built index removed. Called when the base table
    /// is dropped.
    pub fn mark_all_indexes_removed(&self) -> Result<()> {
        for name in self.built_index_names()? {
            self.build_status.mark_removed(&self.table, &name)?;
        }
        Ok(())
    }

    /// The registered indexes currently marked built and ready for queries.
    pub fn built_index_names(&self) -> Result<Vec<IndexName>> {
        let names: Vec<IndexName> = self
            .registry
            .list()
            .iter()
            .map(|index| index.name().clone())
            .collect();
        self.build_status.built_indexes(&self.table, &names)
    }

    /// All backing tables used by registered indexes.
    pub fn backing_tables(&self) -> Vec<Arc<dyn BackingTable>> {
        self.registry
            .list()
            .iter()
            .filter_map(|index| index.backing_table())
            .collect()
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    /// Full, blocking rebuild of the named indexes from `scan`.
    ///
    /// This is the only build path that takes index *names*, and the only
    /// one that marks existing indexes removed prior to rebuilding: the
    /// removed marker is persisted before any data is fed in, and the
    /// built marker only after the scan and flush succeed, so a crash
    /// mid-rebuild leaves the index durably unusable instead of silently
    /// stale.
    pub fn rebuild_indexes_blocking(
        &self,
        scan: &mut dyn PartitionScan,
        names: &[IndexName],
        now_secs: i64,
    ) -> Result<()> {
        let to_rebuild: Vec<Arc<dyn Index>> = self
            .registry
            .list()
            .into_iter()
            .filter(|index| names.contains(index.name()))
            .collect();
        if to_rebuild.is_empty() {
            log::info!("No defined indexes with the supplied names");
            return Ok(());
        }

        for index in &to_rebuild {
            self.build_status.mark_removed(&self.table, index.name())?;
        }

        self.build_indexes_blocking(scan, &to_rebuild, now_secs)?;

        for index in &to_rebuild {
            self.build_status.mark_built(&self.table, index.name())?;
        }
        Ok(())
    }

    /// Blocking build of a single index, marking it built on success. May
    /// be called directly by index implementations.
    pub fn build_index_blocking(
        &self,
        index: Arc<dyn Index>,
        scan: &mut dyn PartitionScan,
        now_secs: i64,
    ) -> Result<()> {
        let name = index.name().clone();
        self.build_indexes_blocking(scan, std::slice::from_ref(&index), now_secs)?;
        self.build_status.mark_built(&self.table, &name)
    }

    /// Blocking build of every registered index from `scan`, used e.g.
    /// after data is loaded externally.
    pub fn build_all_indexes_blocking(
        &self,
        scan: &mut dyn PartitionScan,
        now_secs: i64,
    ) -> Result<()> {
        let all = self.registry.list();
        self.build_indexes_blocking(scan, &all, now_secs)
    }

    fn build_indexes_blocking(
        &self,
        scan: &mut dyn PartitionScan,
        indexes: &[Arc<dyn Index>],
        now_secs: i64,
    ) -> Result<()> {
        if indexes.is_empty() {
            return Ok(());
        }

        let names = indexes
            .iter()
            .map(|index| index.name().as_str())
            .collect::<Vec<_>>()
            .join(",");
        log::info!(
            "Submitting index build of {} for data in {}",
            names,
            self.table
        );

        while let Some(partition) = scan.next_partition()? {
            let group = self.barrier.start();
            self.index_partition(&partition, &group, indexes, now_secs);
        }

        self.flush_indexes_blocking(indexes)?;
        log::info!("Index build of {} complete", names);
        Ok(())
    }

    /// Feeds one whole partition through the write-path indexer contract,
    /// using only the insert hook: the static row first when non-empty,
    /// then every live row, all inside one begin/finish bracket per index.
    pub fn index_partition(
        &self,
        partition: &PartitionData,
        group: &OperationGroup,
        indexes: &[Arc<dyn Index>],
        now_secs: i64,
    ) {
        if indexes.is_empty() {
            return;
        }

        let ctx = IndexerContext::new(
            partition.key.clone(),
            now_secs,
            group.clone(),
            TransactionKind::Update,
        );
        let mut indexers: Vec<Box<dyn Indexer>> =
            indexes.iter().map(|index| index.indexer_for(&ctx)).collect();

        for indexer in &mut indexers {
            indexer.begin();
        }
        if !partition.static_row.is_empty() {
            for indexer in &mut indexers {
                indexer.insert_row(&partition.static_row);
            }
        }
        for row in &partition.rows {
            for indexer in &mut indexers {
                indexer.insert_row(row);
            }
        }
        for indexer in &mut indexers {
            indexer.finish();
        }
    }

    /// Deletes all index data for a partition being ripped out entirely.
    ///
    /// Issues one cleanup transaction for the partition-level deletion and
    /// one more per live row; cleanup transactions are single-event units.
    pub fn delete_partition(&self, partition: &PartitionData, now_secs: i64) {
        let columns = partition.columns();

        if let Some(deletion) = &partition.partition_deletion {
            let mut tx = self.new_cleanup_transaction(&partition.key, &columns, now_secs);
            tx.start();
            tx.on_partition_deletion(deletion);
            tx.commit();
        }

        for row in &partition.rows {
            let mut tx = self.new_cleanup_transaction(&partition.key, &columns, now_secs);
            tx.start();
            tx.on_row_delete(row);
            tx.commit();
        }
    }

    // ------------------------------------------------------------------
    // Flush / truncate / invalidate
    // ------------------------------------------------------------------

    /// Blocking flush of the given indexes.
    ///
    /// Indexes backed by their own storage table flush through that
    /// table's path, concurrently; indexes without one run their own flush
    /// task on the calling thread while the backed flushes are pending.
    /// Both classes complete before this returns.
    pub fn flush_indexes_blocking(&self, indexes: &[Arc<dyn Index>]) -> Result<()> {
        if indexes.is_empty() {
            return Ok(());
        }

        let mut backed: Vec<Arc<dyn BackingTable>> = Vec::new();
        let mut own_flush: Vec<&Arc<dyn Index>> = Vec::new();
        for index in indexes {
            match index.backing_table() {
                Some(table) => backed.push(table),
                None => own_flush.push(index),
            }
        }

        let mut first_err: Option<IndexError> = None;
        std::thread::scope(|scope| {
            let pending: Vec<_> = backed
                .into_iter()
                .map(|table| scope.spawn(move || table.force_flush()))
                .collect();

            for index in own_flush {
                if let Err(err) = self.run_task(index.name(), "flush", index.flush_task()) {
                    first_err.get_or_insert(err);
                }
            }

            for handle in pending {
                match handle.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        first_err.get_or_insert(err);
                    }
                    Err(_) => {
                        first_err.get_or_insert(IndexError::task_failed(
                            "<backing table>",
                            "flush",
                            "flush thread panicked",
                        ));
                    }
                }
            }
        });

        match first_err {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Blocking flush of every registered index.
    pub fn flush_all_indexes_blocking(&self) -> Result<()> {
        self.flush_indexes_blocking(&self.registry.list())
    }

    /// Blocking flush of the registered indexes that have no backing
    /// table of their own.
    pub fn flush_all_non_backed_indexes_blocking(&self) -> Result<()> {
        let own: Vec<Arc<dyn Index>> = self
            .registry
            .list()
            .into_iter()
            .filter(|index| index.backing_table().is_none())
            .collect();
        self.flush_indexes_blocking(&own)
    }

    /// Runs every registered index's truncate task and waits.
    pub fn truncate_all_indexes_blocking(&self, truncated_at: i64) -> Result<()> {
        for index in self.registry.list() {
            self.run_task(index.name(), "truncate", index.truncate_task(truncated_at))?;
        }
        Ok(())
    }

    /// Runs every registered index's invalidate task and waits.
    pub fn invalidate_all_indexes_blocking(&self) -> Result<()> {
        for index in self.registry.list() {
            self.run_task(index.name(), "invalidate", index.invalidate_task())?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Query planning and validation
    // ------------------------------------------------------------------

    /// Picks the index to serve `filter`, or `None` when no registered
    /// index supports any of its expressions. See [`crate::selector`] for
    /// the selection rule; with `include_in_trace`, candidates and the
    /// chosen index are logged for diagnostics.
    pub fn best_index_for(
        &self,
        filter: &RowFilter,
        include_in_trace: bool,
    ) -> Option<Arc<dyn Index>> {
        selector::best_index_for(&self.registry.list(), filter, include_in_trace)
    }

    /// Checks `update` against every registered index that will process
    /// it. A failure rejects the write before any indexer is obtained.
    pub fn validate(&self, update: &PartitionUpdate) -> Result<()> {
        for index in self.registry.list() {
            if index.indexes_columns(&update.columns) {
                index.validate(update)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transaction factories
    // ------------------------------------------------------------------

    /// Transaction for an update on the regular write path. The caller
    /// already holds `group` for the duration of the whole write.
    pub fn new_update_transaction(
        &self,
        update: &PartitionUpdate,
        group: &OperationGroup,
        now_secs: i64,
    ) -> UpdateTransaction {
        if !self.has_indexes() {
            return UpdateTransaction::no_op();
        }

        let ctx = IndexerContext::new(
            update.key.clone(),
            now_secs,
            group.clone(),
            TransactionKind::Update,
        );
        let indexers: Vec<Box<dyn Indexer>> = self
            .registry
            .interested_in(&update.columns)
            .iter()
            .map(|index| index.indexer_for(&ctx))
            .collect();

        if indexers.is_empty() {
            UpdateTransaction::no_op()
        } else {
            UpdateTransaction::new(indexers)
        }
    }

    /// Transaction for merging rows of one partition during compaction.
    pub fn new_compaction_transaction(
        &self,
        key: &PartitionKey,
        columns: &ColumnSet,
        now_secs: i64,
    ) -> CompactionTransaction {
        if !self.has_indexes() {
            return CompactionTransaction::no_op();
        }

        let interested = self.registry.interested_in(columns);
        if interested.is_empty() {
            CompactionTransaction::no_op()
        } else {
            CompactionTransaction::new(
                key.clone(),
                now_secs,
                Arc::clone(&self.barrier),
                interested,
            )
        }
    }

    /// Transaction for removing partitions during cleanup.
    pub fn new_cleanup_transaction(
        &self,
        key: &PartitionKey,
        columns: &ColumnSet,
        now_secs: i64,
    ) -> CleanupTransaction {
        if !self.has_indexes() {
            return CleanupTransaction::no_op();
        }

        let interested = self.registry.interested_in(columns);
        if interested.is_empty() {
            CleanupTransaction::no_op()
        } else {
            CleanupTransaction::new(key.clone(), now_secs, Arc::clone(&self.barrier), interested)
        }
    }

    fn run_task(&self, index: &IndexName, what: &str, task: Option<IndexTask>) -> Result<()> {
        if task.is_some() {
            log::debug!("Running {} task for index {}", what, index);
        }
        execute_blocking(task)
    }
}

//! Shared test fixtures: a recording mock index, mock backing table and
//! scripted partition scans.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use basalt_commons::{
    Cell, Clustering, ColumnName, ColumnSet, DeletionTime, IndexKind, IndexMetadata, IndexName,
    Operator, PartitionData, PartitionKey, PartitionUpdate, Row, TableName,
};
use basalt_index::{
    BackingTable, Index, IndexError, IndexTask, Indexer, IndexerContext, PartitionScan, Result,
    TransactionKind,
};

/// Everything a mock index observes, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexEvent {
    Begin(TransactionKind),
    PartitionDelete(DeletionTime),
    RangeTombstone,
    Insert(Row),
    Update { removed: Row, inserted: Row },
    Remove(Row),
    Finish,
    Task(String),
}

pub type EventLog = Arc<Mutex<Vec<IndexEvent>>>;

pub fn new_event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<IndexEvent> {
    log.lock().unwrap().clone()
}

/// Configurable recording index.
#[derive(Debug)]
pub struct MockIndex {
    metadata: IndexMetadata,
    interest: ColumnSet,
    supports: Vec<(ColumnName, Operator)>,
    estimate: u64,
    needs_build: bool,
    backing: Option<Arc<MockBackingTable>>,
    validation_error: Option<String>,
    fail_flush: bool,
    build_delay: Option<Duration>,
    build_order: Option<(Arc<Mutex<Vec<String>>>, String)>,
    pub events: EventLog,
}

impl MockIndex {
    /// An index named `by_<column>` interested in (and supporting `=` on)
    /// the given column.
    pub fn on_column(column: &str) -> Self {
        let name = format!("by_{column}");
        Self {
            metadata: IndexMetadata::new(name.as_str(), IndexKind::Composites, column),
            interest: [column].into_iter().collect(),
            supports: vec![(column.into(), Operator::Eq)],
            estimate: 0,
            needs_build: false,
            backing: None,
            validation_error: None,
            fail_flush: false,
            build_delay: None,
            build_order: None,
            events: new_event_log(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.metadata.name = IndexName::new(name);
        self
    }

    pub fn with_metadata(mut self, metadata: IndexMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn supporting(mut self, column: &str, operator: Operator) -> Self {
        self.supports.push((column.into(), operator));
        self
    }

    pub fn estimating(mut self, rows: u64) -> Self {
        self.estimate = rows;
        self
    }

    pub fn needs_initial_build(mut self) -> Self {
        self.needs_build = true;
        self
    }

    pub fn slow_build(mut self, delay: Duration) -> Self {
        self.build_delay = Some(delay);
        self
    }

    pub fn recording_build_order(mut self, order: Arc<Mutex<Vec<String>>>, label: &str) -> Self {
        self.build_order = Some((order, label.to_string()));
        self
    }

    pub fn backed_by(mut self, table: Arc<MockBackingTable>) -> Self {
        self.backing = Some(table);
        self
    }

    pub fn rejecting_writes(mut self, reason: &str) -> Self {
        self.validation_error = Some(reason.to_string());
        self
    }

    pub fn failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }

    pub fn build(self) -> Arc<MockIndex> {
        Arc::new(self)
    }

    fn record_task(&self, label: &str) -> Option<IndexTask> {
        let events = Arc::clone(&self.events);
        let label = label.to_string();
        Some(Box::new(move || {
            events.lock().unwrap().push(IndexEvent::Task(label));
            Ok(())
        }))
    }
}

impl Index for MockIndex {
    fn name(&self) -> &IndexName {
        &self.metadata.name
    }

    fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    fn indexes_columns(&self, columns: &ColumnSet) -> bool {
        self.interest.intersects(columns)
    }

    fn supports_expression(&self, column: &ColumnName, operator: Operator) -> bool {
        self.supports
            .iter()
            .any(|(c, op)| c == column && *op == operator)
    }

    fn estimated_result_rows(&self) -> u64 {
        self.estimate
    }

    fn validate(&self, _update: &PartitionUpdate) -> Result<()> {
        match &self.validation_error {
            Some(reason) => Err(IndexError::validation(self.metadata.name.as_str(), reason)),
            None => Ok(()),
        }
    }

    fn initialization_task(&self) -> Option<IndexTask> {
        if !self.needs_build {
            return None;
        }
        let events = Arc::clone(&self.events);
        let delay = self.build_delay;
        let order = self.build_order.clone();
        Some(Box::new(move || {
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            if let Some((order, label)) = order {
                order.lock().unwrap().push(label);
            }
            events
                .lock()
                .unwrap()
                .push(IndexEvent::Task("initial build".to_string()));
            Ok(())
        }))
    }

    fn metadata_reload_task(&self, _metadata: &IndexMetadata) -> Option<IndexTask> {
        self.record_task("metadata reload")
    }

    fn flush_task(&self) -> Option<IndexTask> {
        if self.fail_flush {
            let name = self.metadata.name.as_str().to_string();
            return Some(Box::new(move || {
                Err(IndexError::task_failed(name, "flush", "flush refused"))
            }));
        }
        self.record_task("flush")
    }

    fn truncate_task(&self, truncated_at: i64) -> Option<IndexTask> {
        self.record_task(&format!("truncate@{truncated_at}"))
    }

    fn invalidate_task(&self) -> Option<IndexTask> {
        self.record_task("invalidate")
    }

    fn backing_table(&self) -> Option<Arc<dyn BackingTable>> {
        self.backing
            .as_ref()
            .map(|table| Arc::clone(table) as Arc<dyn BackingTable>)
    }

    fn indexer_for(&self, ctx: &IndexerContext) -> Box<dyn Indexer> {
        Box::new(MockIndexer {
            events: Arc::clone(&self.events),
            kind: ctx.kind,
        })
    }
}

pub struct MockIndexer {
    events: EventLog,
    kind: TransactionKind,
}

impl MockIndexer {
    fn push(&self, event: IndexEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Indexer for MockIndexer {
    fn begin(&mut self) {
        self.push(IndexEvent::Begin(self.kind));
    }

    fn partition_delete(&mut self, deletion: &DeletionTime) {
        self.push(IndexEvent::PartitionDelete(*deletion));
    }

    fn range_tombstone(&mut self, _tombstone: &basalt_commons::RangeTombstone) {
        self.push(IndexEvent::RangeTombstone);
    }

    fn insert_row(&mut self, row: &Row) {
        self.push(IndexEvent::Insert(row.clone()));
    }

    fn update_row(&mut self, old: &Row, new: &Row) {
        self.push(IndexEvent::Update {
            removed: old.clone(),
            inserted: new.clone(),
        });
    }

    fn remove_row(&mut self, row: &Row) {
        self.push(IndexEvent::Remove(row.clone()));
    }

    fn finish(&mut self) {
        self.push(IndexEvent::Finish);
    }
}

/// Backing table counting its flushes.
#[derive(Debug)]
pub struct MockBackingTable {
    name: TableName,
    flushes: Mutex<u32>,
    fail: bool,
}

impl MockBackingTable {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: TableName::new(name),
            flushes: Mutex::new(0),
            fail: false,
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: TableName::new(name),
            flushes: Mutex::new(0),
            fail: true,
        })
    }

    pub fn flush_count(&self) -> u32 {
        *self.flushes.lock().unwrap()
    }
}

impl BackingTable for MockBackingTable {
    fn name(&self) -> &TableName {
        &self.name
    }

    fn force_flush(&self) -> Result<()> {
        *self.flushes.lock().unwrap() += 1;
        if self.fail {
            return Err(IndexError::task_failed(
                self.name.as_str(),
                "flush",
                "backing table flush refused",
            ));
        }
        Ok(())
    }
}

/// Scripted partition scan that can fail partway through.
pub struct VecScan {
    partitions: std::vec::IntoIter<PartitionData>,
    yielded: usize,
    fail_after: Option<usize>,
}

impl VecScan {
    pub fn new(partitions: Vec<PartitionData>) -> Self {
        Self {
            partitions: partitions.into_iter(),
            yielded: 0,
            fail_after: None,
        }
    }

    /// Fails once `n` partitions have been yielded.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl PartitionScan for VecScan {
    fn next_partition(&mut self) -> Result<Option<PartitionData>> {
        if self.fail_after == Some(self.yielded) {
            return Err(IndexError::scan("source data unreadable"));
        }
        self.yielded += 1;
        Ok(self.partitions.next())
    }
}

// ----------------------------------------------------------------------
// Small data builders
// ----------------------------------------------------------------------

pub fn row(clustering: &str, cells: &[(&str, &[u8], i64)]) -> Row {
    let mut row = Row::new(Clustering::of(clustering));
    for (column, value, timestamp) in cells {
        row.push_cell(Cell::new(*column, value.to_vec(), *timestamp));
    }
    row
}

pub fn partition(key: &str, rows: Vec<Row>) -> PartitionData {
    let mut partition = PartitionData::new(PartitionKey::new(key.as_bytes().to_vec()));
    partition.rows = rows;
    partition
}

pub fn update_touching(key: &str, rows: Vec<Row>) -> PartitionUpdate {
    let mut update = PartitionUpdate::new(PartitionKey::new(key.as_bytes().to_vec()));
    for row in rows {
        update = update.with_row(row);
    }
    update
}

pub fn columns(names: &[&str]) -> ColumnSet {
    names.iter().copied().collect()
}

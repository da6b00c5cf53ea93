//! # basalt-commons
//!
//! Shared data-model vocabulary for the BasaltDB storage engine.
//!
//! This crate holds the plain-data types exchanged between the engine and
//! its subsystems: partition/row/cell representation, deletion and liveness
//! metadata, column identifiers, the read-predicate model and index
//! metadata. It performs no I/O and owns no concurrency.

pub mod models;
pub mod predicate;

pub use models::{
    Cell, CellExpiration, Clustering, ColumnName, ColumnSet, DeletionTime, IndexKind,
    IndexMetadata, IndexName, LivenessInfo, PartitionData, PartitionKey, PartitionUpdate,
    RangeTombstone, Row, TableName,
};
pub use predicate::{Expression, Operator, RowFilter};

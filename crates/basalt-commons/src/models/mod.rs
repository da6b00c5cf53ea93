//! Model types shared across the engine.

pub mod cell;
pub mod column;
pub mod deletion;
pub mod index_metadata;
pub mod index_name;
pub mod partition;
pub mod row;
pub mod table_name;
pub mod update;

pub use cell::{Cell, CellExpiration};
pub use column::{ColumnName, ColumnSet};
pub use deletion::{DeletionTime, RangeTombstone};
pub use index_metadata::{IndexKind, IndexMetadata};
pub use index_name::IndexName;
pub use partition::{PartitionData, PartitionKey};
pub use row::{Clustering, LivenessInfo, Row};
pub use table_name::TableName;
pub use update::PartitionUpdate;

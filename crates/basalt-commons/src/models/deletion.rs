//! Deletion markers.

use crate::models::row::Clustering;

/// Records that data as of some point in time has been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionTime {
    /// Writes at or before this timestamp are shadowed by the deletion.
    pub marked_for_delete_at: i64,
    /// Local wall-clock point (seconds) at which the deletion happened.
    pub local_deletion_secs: i64,
}

impl DeletionTime {
    pub fn new(marked_for_delete_at: i64, local_deletion_secs: i64) -> Self {
        Self {
            marked_for_delete_at,
            local_deletion_secs,
        }
    }
}

/// A deletion covering a clustering range within one partition.
///
/// The index layer forwards range tombstones verbatim to interested
/// indexers; it never interprets the bounds itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTombstone {
    pub start: Clustering,
    pub end: Clustering,
    pub deletion: DeletionTime,
}

impl RangeTombstone {
    pub fn new(start: Clustering, end: Clustering, deletion: DeletionTime) -> Self {
        Self {
            start,
            end,
            deletion,
        }
    }
}

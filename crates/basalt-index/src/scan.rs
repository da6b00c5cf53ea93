//! Full-partition scan source for index builds.

use basalt_commons::PartitionData;

use crate::error::Result;

/// Pull-based stream of whole partitions, as fed into full and partial
/// index builds.
///
/// Producers yield the live view of each partition (shadowed data already
/// purged). An error aborts the enclosing build; the failed index stays
/// durably marked "not built".
pub trait PartitionScan {
    /// Returns the next partition, or `None` at end of data.
    fn next_partition(&mut self) -> Result<Option<PartitionData>>;
}

/// Blanket implementation so plain vectors can back a scan.
impl PartitionScan for std::vec::IntoIter<PartitionData> {
    fn next_partition(&mut self) -> Result<Option<PartitionData>> {
        Ok(self.next())
    }
}

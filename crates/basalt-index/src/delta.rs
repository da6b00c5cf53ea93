//! Row-delta engine.
//!
//! Pure computation of the minimal set of cells an index must add and
//! purge when a row changes. No I/O, no shared state; both functions walk
//! cells in column-key order.

use std::collections::BTreeSet;

use basalt_commons::{Cell, ColumnName, Row};

/// The outcome of diffing an old row against its replacement: the cells to
/// feed back into indexers as an insertion and those to purge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDelta {
    pub to_insert: Row,
    pub to_remove: Row,
}

/// Compares a row's previous and merged state on the write path.
///
/// A cell lands in `to_insert` whenever the merged row's cell differs in
/// any way from the old one (including expiration-metadata-only edits). It
/// lands in `to_remove` only when the value bytes or the write timestamp
/// diverge: identical value and timestamp means the difference is confined
/// to expiration metadata, and purging the old entry would only let the
/// removal shadow the identical value we re-insert.
///
/// Liveness changes route into `to_insert` alone; row presence metadata is
/// not an indexed value, so nothing is purged for it. Partition-level and
/// range deletions are not this function's concern; callers forward those
/// verbatim.
pub fn diff_rows(old: &Row, new: &Row) -> RowDelta {
    debug_assert_eq!(
        old.clustering(),
        new.clustering(),
        "diffed rows must share a clustering key"
    );

    let mut to_insert = Row::new(new.clustering().clone());
    let mut to_remove = Row::new(old.clustering().clone());

    if new.liveness() != old.liveness() {
        if let Some(liveness) = new.liveness() {
            to_insert.set_liveness(*liveness);
        }
    }

    let columns: BTreeSet<&ColumnName> = old.column_names().chain(new.column_names()).collect();
    for column in columns {
        match (old.cell(column), new.cell(column)) {
            (Some(old_cell), None) => to_remove.push_cell(old_cell.clone()),
            (None, Some(new_cell)) => to_insert.push_cell(new_cell.clone()),
            (Some(old_cell), Some(new_cell)) => {
                if new_cell != old_cell {
                    to_insert.push_cell(new_cell.clone());
                }
                if should_purge_old_value(old_cell, new_cell) {
                    to_remove.push_cell(old_cell.clone());
                }
            }
            (None, None) => unreachable!("column drawn from the union of both rows"),
        }
    }

    RowDelta {
        to_insert,
        to_remove,
    }
}

fn should_purge_old_value(old: &Cell, new: &Cell) -> bool {
    old.value != new.value || old.timestamp != new.timestamp
}

/// Compares a compaction's merged row against the source versions it was
/// merged from.
///
/// A cell present in a source row but absent from the merged result was
/// superseded by the merge and must be purged from the index. The output
/// holds one removal row per source version, allocated only when that
/// source contributed at least one purged cell.
pub fn diff_merge(merged: &Row, sources: &[Option<Row>]) -> Vec<Option<Row>> {
    let mut removals: Vec<Option<Row>> = vec![None; sources.len()];

    for (i, source) in sources.iter().enumerate() {
        let Some(source) = source else { continue };
        for cell in source.cells() {
            if merged.cell(&cell.column).is_none() {
                removals[i]
                    .get_or_insert_with(|| Row::new(source.clustering().clone()))
                    .push_cell(cell.clone());
            }
        }
    }

    removals
}

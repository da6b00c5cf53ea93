//! Index selection for read predicates.

use std::collections::BTreeMap;
use std::sync::Arc;

use basalt_commons::{IndexName, RowFilter};

use crate::index::Index;

/// Picks the index to serve a read predicate, if any can.
///
/// Every index supporting at least one of the filter's expressions becomes
/// a candidate: the candidate set is the union across expressions, not
/// the intersection. Among candidates the one with the numerically
/// greatest self-reported estimate wins, ties broken by name so selection
/// is deterministic.
///
/// Note the comparison direction: the documented intent of selection is
/// "most selective" (fewest matching rows), but the comparison picks the
/// *maximum* estimate. That is the engine's long-shipped behavior and
/// query planning downstream is calibrated to it, so it is preserved here
/// deliberately rather than silently corrected.
pub(crate) fn best_index_for(
    indexes: &[Arc<dyn Index>],
    filter: &RowFilter,
    include_in_trace: bool,
) -> Option<Arc<dyn Index>> {
    if indexes.is_empty() || filter.is_empty() {
        return None;
    }

    let mut candidates: BTreeMap<IndexName, Arc<dyn Index>> = BTreeMap::new();
    for expression in &filter.expressions {
        for index in indexes {
            if index.supports_expression(&expression.column, expression.operator) {
                candidates
                    .entry(index.name().clone())
                    .or_insert_with(|| Arc::clone(index));
            }
        }
    }

    if candidates.is_empty() {
        log::debug!("No applicable indexes found");
        return None;
    }

    // BTreeMap iteration is name-ordered; max_by_key keeps the last maximal
    // element, so equal estimates resolve to the greatest name.
    let selected = candidates
        .values()
        .max_by_key(|index| index.estimated_result_rows())
        .map(Arc::clone)
        .expect("non-empty candidate set");

    if include_in_trace {
        let cardinalities = candidates
            .values()
            .map(|i| format!("{}:{}", i.name(), i.estimated_result_rows()))
            .collect::<Vec<_>>()
            .join(",");
        log::debug!(
            "Index mean cardinalities are {}. Scanning with {}.",
            cardinalities,
            selected.name()
        );
    }

    Some(selected)
}

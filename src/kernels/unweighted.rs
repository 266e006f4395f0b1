//! Unweighted gather-reduce kernel
//!
//! Kept as a separate code path from the weighted kernel so unweighted
//! workloads never pay the per-element weight load and multiply.

use super::{add_row, scale_row, PoolingMode};
use crate::dtype::Element;
use crate::layout::TableLayout;
use std::ops::Range;

/// Pool one (bag, table) unit: sum the table rows selected by
/// `indices[range]` into `acc`, widening each element to f32 at load.
///
/// `acc` is the bag's output span for this table (`table.dim` wide) and is
/// fully overwritten. An empty range leaves it all-zero in both modes.
///
/// Indices must be valid row ids for `table`; this is the caller's contract
/// and only checked in debug builds.
pub fn pool_bag_unweighted<T: Element>(
    acc: &mut [f32],
    arena: &[T],
    indices: &[i64],
    range: Range<usize>,
    table: &TableLayout,
    mode: PoolingMode,
) {
    debug_assert_eq!(acc.len(), table.dim);
    acc.fill(0.0);

    let count = range.len();
    for &idx in &indices[range] {
        debug_assert!(
            idx >= 0 && (idx as usize) < table.rows,
            "row index {} out of range for table with {} rows",
            idx,
            table.rows
        );
        let base = table.row_offset(idx as usize);
        add_row(acc, &arena[base..base + table.dim]);
    }

    if mode == PoolingMode::Mean && count > 0 {
        scale_row(acc, 1.0 / count as f32);
    }
}

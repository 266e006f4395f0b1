//! Weighted gather-reduce kernel

use super::{add_row_scaled, scale_row, PoolingMode};
use crate::dtype::Element;
use crate::layout::TableLayout;
use std::ops::Range;

/// Pool one (bag, table) unit with per-index scalar weights.
///
/// Each gathered row is scaled by `weights[i]` (parallel to `indices`)
/// before accumulation. In [`PoolingMode::Mean`] the divisor is the sum of
/// the contributing weights, not the index count; a zero weight sum (empty
/// bag included) produces a zero row rather than dividing by zero.
///
/// Same index-validity contract as the unweighted kernel.
pub fn pool_bag_weighted<T: Element>(
    acc: &mut [f32],
    arena: &[T],
    indices: &[i64],
    weights: &[f32],
    range: Range<usize>,
    table: &TableLayout,
    mode: PoolingMode,
) {
    debug_assert_eq!(acc.len(), table.dim);
    debug_assert_eq!(indices.len(), weights.len());
    acc.fill(0.0);

    let mut weight_sum = 0.0f32;
    for (&idx, &w) in indices[range.clone()].iter().zip(&weights[range]) {
        debug_assert!(
            idx >= 0 && (idx as usize) < table.rows,
            "row index {} out of range for table with {} rows",
            idx,
            table.rows
        );
        let base = table.row_offset(idx as usize);
        add_row_scaled(acc, &arena[base..base + table.dim], w);
        weight_sum += w;
    }

    if mode == PoolingMode::Mean {
        if weight_sum != 0.0 {
            scale_row(acc, 1.0 / weight_sum);
        } else {
            acc.fill(0.0);
        }
    }
}

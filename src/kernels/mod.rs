//! Gather-reduce kernels
//!
//! One kernel per weighting mode, each generic over the storage element type
//! so every (precision, weighting) combination monomorphizes to its own entry
//! point with no branching inside the per-element loop. The unit of work is
//! one (bag, table) pair: zero an f32 accumulator span, widen-and-add every
//! gathered row, apply the mean divisor, done. The accumulator span is the
//! bag's own slice of the output buffer, so pooling allocates nothing.

mod unweighted;
mod weighted;

pub use unweighted::pool_bag_unweighted;
pub use weighted::pool_bag_weighted;

use crate::dtype::Element;

/// How gathered rows are reduced into one output row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PoolingMode {
    /// Elementwise sum of the gathered (optionally weighted) rows
    #[default]
    Sum,
    /// Sum divided by the contributing count (unweighted) or the weight sum
    /// (weighted); an empty bag or zero weight sum yields a zero row
    Mean,
}

/// Elements fetched per inner-loop step.
///
/// Performance-tuning knob balancing load width against register pressure;
/// any positive value is correct.
pub const FETCH_WIDTH: usize = 8;

/// acc += widen(row), elementwise. `row` and `acc` have the same length.
#[inline(always)]
pub(crate) fn add_row<T: Element>(acc: &mut [f32], row: &[T]) {
    let mut acc_chunks = acc.chunks_exact_mut(FETCH_WIDTH);
    let mut row_chunks = row.chunks_exact(FETCH_WIDTH);
    for (a, r) in acc_chunks.by_ref().zip(row_chunks.by_ref()) {
        for i in 0..FETCH_WIDTH {
            a[i] += r[i].to_f32();
        }
    }
    for (a, &r) in acc_chunks
        .into_remainder()
        .iter_mut()
        .zip(row_chunks.remainder())
    {
        *a += r.to_f32();
    }
}

/// acc += widen(row) * scale, elementwise.
#[inline(always)]
pub(crate) fn add_row_scaled<T: Element>(acc: &mut [f32], row: &[T], scale: f32) {
    let mut acc_chunks = acc.chunks_exact_mut(FETCH_WIDTH);
    let mut row_chunks = row.chunks_exact(FETCH_WIDTH);
    for (a, r) in acc_chunks.by_ref().zip(row_chunks.by_ref()) {
        for i in 0..FETCH_WIDTH {
            a[i] += r[i].to_f32() * scale;
        }
    }
    for (a, &r) in acc_chunks
        .into_remainder()
        .iter_mut()
        .zip(row_chunks.remainder())
    {
        *a += r.to_f32() * scale;
    }
}

/// acc *= inv, elementwise. Mean-mode epilogue.
#[inline(always)]
pub(crate) fn scale_row(acc: &mut [f32], inv: f32) {
    for a in acc.iter_mut() {
        *a *= inv;
    }
}

//! CSR-style offset/index model
//!
//! One flat index array is shared by every (table, bag) pair in the batch; a
//! monotonic offset array of length `num_tables * batch_size + 1` delimits
//! which contiguous slice of it belongs to each bag. Bag (t, b) owns the
//! half-open range `offsets[t * B + b] .. offsets[t * B + b + 1]`. Empty
//! ranges are legal and pool to an all-zero row.
//!
//! The kernels consume offsets as-is with no per-element checks; callers that
//! cannot trust their inputs should run [`validate_offsets`] first. Skipping
//! validation with malformed offsets or out-of-range indices is undefined
//! behavior at the kernel level.

use crate::error::{Error, Result};
use std::ops::Range;

/// Resolve the index-array range owned by bag `bag` of table `table`.
///
/// Direct lookup only; `offsets` must have length
/// `num_tables * batch_size + 1` and be monotonically non-decreasing.
#[inline(always)]
pub fn bag_range(offsets: &[i64], batch_size: usize, table: usize, bag: usize) -> Range<usize> {
    let base = table * batch_size + bag;
    offsets[base] as usize..offsets[base + 1] as usize
}

/// Opt-in, caller-side validation of an offset array.
///
/// Checks length, a zero first entry, monotonicity, and that no range
/// reaches past `num_indices`. The final offset may be less than
/// `num_indices` only when trailing indices are deliberately unused, so that
/// case is rejected too: the last offset must equal `num_indices` exactly.
pub fn validate_offsets(
    offsets: &[i64],
    num_tables: usize,
    batch_size: usize,
    num_indices: usize,
) -> Result<()> {
    let expected = num_tables * batch_size + 1;
    if offsets.len() != expected {
        return Err(Error::BufferSizeMismatch {
            buffer: "offsets",
            expected,
            got: offsets.len(),
        });
    }
    if offsets[0] != 0 {
        return Err(Error::InvalidOffsets {
            reason: format!("first offset must be 0, got {}", offsets[0]),
        });
    }
    for (i, pair) in offsets.windows(2).enumerate() {
        if pair[1] < pair[0] {
            return Err(Error::InvalidOffsets {
                reason: format!(
                    "offsets must be non-decreasing, but offsets[{}] = {} > offsets[{}] = {}",
                    i,
                    pair[0],
                    i + 1,
                    pair[1]
                ),
            });
        }
    }
    let last = offsets[expected - 1];
    if last as usize != num_indices {
        return Err(Error::InvalidOffsets {
            reason: format!(
                "final offset {} does not cover the {} supplied indices",
                last, num_indices
            ),
        });
    }
    Ok(())
}

/// Validate that every index is a legal row id for its table.
///
/// Pairs with [`validate_offsets`]; both checks together make a subsequent
/// launch free of undefined behavior. `rows_per_table[t]` is the row count
/// of table `t`.
pub fn validate_indices(
    indices: &[i64],
    offsets: &[i64],
    rows_per_table: &[usize],
    batch_size: usize,
) -> Result<()> {
    for (t, &rows) in rows_per_table.iter().enumerate() {
        let start = offsets[t * batch_size] as usize;
        let end = offsets[(t + 1) * batch_size] as usize;
        for &idx in &indices[start..end] {
            if idx < 0 || idx as usize >= rows {
                return Err(Error::InvalidOffsets {
                    reason: format!("index {} out of range for table {} with {} rows", idx, t, rows),
                });
            }
        }
    }
    Ok(())
}

//! Forward dispatch surface
//!
//! Selects the kernel specialization from the arena's storage dtype and the
//! weighting mode, validates every launch parameter up front, then runs the
//! batch. All configuration failures surface here as [`Error`]s before any
//! pooling work starts; once the launch begins, nothing can fail.
//!
//! Parallelism: each bag's output row is an independent chunk of the output
//! buffer; chunks are distributed over the rayon pool and each worker pools
//! its row's (bag, table) units in place. Inputs are shared read-only, rows
//! are write-disjoint, so no synchronization is needed.

use crate::bags::bag_range;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::kernels::{pool_bag_unweighted, pool_bag_weighted, PoolingMode};
use crate::layout::{BatchLayout, EmbeddingArena};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Bags below this count run on the calling thread without touching the
/// rayon pool; above it, this is the `with_min_len` granularity.
/// Performance knob, not correctness-affecting.
#[cfg(feature = "rayon")]
const MIN_BAGS_PER_TASK: usize = 4;

/// Borrowed inputs of one batched forward invocation.
///
/// Everything is caller-owned; the kernel borrows for the duration of the
/// call and performs no allocation. `weights` selects the kernel family:
/// `Some` runs the weighted specialization, `None` the unweighted one.
#[derive(Copy, Clone, Debug)]
pub struct ForwardRequest<'a> {
    /// Precision-tagged weight arena holding every table's rows
    pub arena: EmbeddingArena<'a>,
    /// Flat row indices, shared across all tables and bags
    pub indices: &'a [i64],
    /// CSR-style bag boundaries, length `num_tables * batch_size + 1`
    pub offsets: &'a [i64],
    /// Per-index scalar weights, parallel to `indices` (weighted variant only)
    pub weights: Option<&'a [f32]>,
    /// Reduction applied to each bag
    pub mode: PoolingMode,
}

/// Dispatch a `DType` to a concrete [`crate::dtype::Element`] type.
///
/// Binds `$T` to the matching Rust type and runs `$body` once. The dtype set
/// is closed, so the match is exhaustive; arena/type mismatches are caught
/// separately by [`EmbeddingArena::as_slice`].
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block) => {
        match $dtype {
            DType::F32 => {
                type $T = f32;
                $body
            }
            #[cfg(feature = "f16")]
            DType::F16 => {
                type $T = half::f16;
                $body
            }
            #[cfg(feature = "f16")]
            DType::BF16 => {
                type $T = half::bf16;
                $body
            }
        }
    };
}

/// Run one batched gather-and-pool forward pass.
///
/// Thin selector over the two named kernel families: requests carrying
/// per-index weights run [`forward_weighted`], the rest [`forward_unweighted`].
pub fn forward(request: &ForwardRequest, layout: &BatchLayout, out: &mut [f32]) -> Result<()> {
    match request.weights {
        Some(_) => forward_weighted(request, layout, out),
        None => forward_unweighted(request, layout, out),
    }
}

/// Unweighted forward entry point.
///
/// Errors with [`Error::UnexpectedWeights`] when the request carries a
/// weight array, so an accidental mode mismatch fails loudly instead of
/// silently ignoring the weights.
pub fn forward_unweighted(
    request: &ForwardRequest,
    layout: &BatchLayout,
    out: &mut [f32],
) -> Result<()> {
    if request.weights.is_some() {
        return Err(Error::UnexpectedWeights);
    }
    validate_launch(request, layout, out)?;
    log_launch("unweighted", request, layout);

    dispatch_dtype!(request.arena.dtype(), T => {
        let arena: &[T] = request.arena.as_slice("forward_unweighted")?;
        let batch_size = layout.batch_size();
        for_each_bag_row(out, layout, |bag, out_row| {
            for (t, table) in layout.tables().iter().enumerate() {
                let start = layout.dim_offset(t);
                let acc = &mut out_row[start..start + table.dim];
                let range = bag_range(request.offsets, batch_size, t, bag);
                pool_bag_unweighted(acc, arena, request.indices, range, table, request.mode);
            }
        });
    });
    Ok(())
}

/// Weighted forward entry point.
///
/// Errors with [`Error::MissingWeights`] when no weight array is supplied.
pub fn forward_weighted(
    request: &ForwardRequest,
    layout: &BatchLayout,
    out: &mut [f32],
) -> Result<()> {
    let weights = request.weights.ok_or(Error::MissingWeights)?;
    if weights.len() != request.indices.len() {
        return Err(Error::BufferSizeMismatch {
            buffer: "weights",
            expected: request.indices.len(),
            got: weights.len(),
        });
    }
    validate_launch(request, layout, out)?;
    log_launch("weighted", request, layout);

    dispatch_dtype!(request.arena.dtype(), T => {
        let arena: &[T] = request.arena.as_slice("forward_weighted")?;
        let batch_size = layout.batch_size();
        for_each_bag_row(out, layout, |bag, out_row| {
            for (t, table) in layout.tables().iter().enumerate() {
                let start = layout.dim_offset(t);
                let acc = &mut out_row[start..start + table.dim];
                let range = bag_range(request.offsets, batch_size, t, bag);
                pool_bag_weighted(
                    acc,
                    arena,
                    request.indices,
                    weights,
                    range,
                    table,
                    request.mode,
                );
            }
        });
    });
    Ok(())
}

/// Pre-launch configuration checks shared by both kernel families.
fn validate_launch(request: &ForwardRequest, layout: &BatchLayout, out: &[f32]) -> Result<()> {
    if request.offsets.len() != layout.offsets_len() {
        return Err(Error::BufferSizeMismatch {
            buffer: "offsets",
            expected: layout.offsets_len(),
            got: request.offsets.len(),
        });
    }
    if out.len() != layout.output_len() {
        return Err(Error::BufferSizeMismatch {
            buffer: "output",
            expected: layout.output_len(),
            got: out.len(),
        });
    }
    // BatchLayout::new checked table extents against the arena length it was
    // given; recheck against the arena actually supplied to this call.
    let arena_len = request.arena.len();
    for (t, table) in layout.tables().iter().enumerate() {
        let needed = table.arena_offset + table.rows * table.dim;
        if needed > arena_len {
            return Err(Error::ArenaOverrun {
                table: t,
                needed,
                len: arena_len,
            });
        }
    }
    Ok(())
}

fn log_launch(variant: &str, request: &ForwardRequest, layout: &BatchLayout) {
    log::debug!(
        "forward launch: variant={} dtype={} mode={:?} tables={} batch={} total_dim={} indices={}",
        variant,
        request.arena.dtype(),
        request.mode,
        layout.num_tables(),
        layout.batch_size(),
        layout.total_dim(),
        request.indices.len(),
    );
}

/// Drive `body` over every bag's output row.
///
/// Rows are disjoint `total_dim`-wide chunks of `out`, so the parallel path
/// needs no synchronization. Falls back to a plain loop for small batches or
/// when the `rayon` feature is disabled.
fn for_each_bag_row<F>(out: &mut [f32], layout: &BatchLayout, body: F)
where
    F: Fn(usize, &mut [f32]) + Send + Sync,
{
    let total_dim = layout.total_dim();
    if total_dim == 0 {
        return;
    }

    #[cfg(feature = "rayon")]
    {
        if layout.batch_size() > MIN_BAGS_PER_TASK {
            out.par_chunks_mut(total_dim)
                .with_min_len(MIN_BAGS_PER_TASK)
                .enumerate()
                .for_each(|(bag, out_row)| body(bag, out_row));
            return;
        }
    }

    for (bag, out_row) in out.chunks_mut(total_dim).enumerate() {
        body(bag, out_row);
    }
}

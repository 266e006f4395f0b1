//! # embag
//!
//! **Batched embedding-table lookup and pooling for recommendation workloads.**
//!
//! embag is the forward pass of a table-batched embedding layer: many tables
//! of different row widths packed into one contiguous weight arena, a flat
//! index array segmented CSR-style into per-bag ranges, and one pooled `f32`
//! row segment per (bag, table) pair out the other end.
//!
//! ## Why embag?
//!
//! - **One call, many tables**: variable widths and variable bag lengths in a
//!   single batched launch
//! - **Reduced-precision storage**: f16/bf16 tables with f32 accumulation
//! - **Zero allocation**: every buffer is caller-owned and borrowed
//! - **Data-parallel**: (bag, table) units are independent and run on rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use embag::prelude::*;
//!
//! // One table: 3 rows, width 4, at the start of the arena.
//! let arena = vec![
//!     1.0f32, 1.0, 1.0, 1.0,
//!     2.0, 2.0, 2.0, 2.0,
//!     3.0, 3.0, 3.0, 3.0,
//! ];
//! let layout = BatchLayout::new(
//!     vec![TableLayout { rows: 3, dim: 4, arena_offset: 0 }],
//!     2,
//!     arena.len(),
//! )?;
//!
//! // Bag 0 pools rows {0, 1}; bag 1 pools row {2}.
//! let indices = [0i64, 1, 2];
//! let offsets = [0i64, 2, 3];
//! let mut out = vec![0.0f32; layout.output_len()];
//!
//! let request = ForwardRequest {
//!     arena: EmbeddingArena::from_slice(&arena),
//!     indices: &indices,
//!     offsets: &offsets,
//!     weights: None,
//!     mode: PoolingMode::Sum,
//! };
//! forward(&request, &layout, &mut out)?;
//! assert_eq!(&out[..4], &[3.0, 3.0, 3.0, 3.0]);
//! # Ok::<(), embag::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded launch over bag output rows
//! - `f16` (default): reduced-precision storage dtypes (F16, BF16)
//!
//! ## Contract
//!
//! Configuration problems (buffer lengths, dtype/weighting mismatches) are
//! reported as [`error::Error`] before any pooling starts. Index validity and
//! offset monotonicity are the caller's responsibility; [`bags`] provides
//! opt-in validators for callers that cannot trust their inputs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bags;
pub mod dtype;
pub mod error;
pub mod forward;
pub mod kernels;
pub mod layout;
pub mod report;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::forward::{forward, forward_unweighted, forward_weighted, ForwardRequest};
    pub use crate::kernels::PoolingMode;
    pub use crate::layout::{BatchLayout, EmbeddingArena, TableLayout};
}

//! Table layout descriptors and batch geometry
//!
//! All tables of one batched call live back-to-back in a single contiguous
//! weight arena, addressed by per-table element offsets. [`BatchLayout`]
//! precomputes the output-column offsets (prefix sums of the per-table
//! embedding widths) so the kernels resolve every destination by direct
//! lookup, never by search.

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};

/// Per-table metadata locating one table inside the shared weight arena.
///
/// Offsets are in elements, not bytes; rows are row-major and contiguous.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableLayout {
    /// Number of rows in the table
    pub rows: usize,
    /// Embedding width (columns per row)
    pub dim: usize,
    /// Element offset of the table's first row inside the arena
    pub arena_offset: usize,
}

impl TableLayout {
    /// Element offset of `row` inside the arena.
    ///
    /// Callers must guarantee `row < self.rows`; the kernels rely on this
    /// without checking.
    #[inline(always)]
    pub fn row_offset(&self, row: usize) -> usize {
        self.arena_offset + row * self.dim
    }
}

/// Geometry of one batched forward call: table descriptors, batch size, and
/// the derived output layout.
///
/// The pooled output is one f32 row per bag, `total_dim` wide, with table `t`
/// occupying the half-open column span `dim_offset(t) .. dim_offset(t + 1)`.
#[derive(Clone, Debug)]
pub struct BatchLayout {
    tables: Vec<TableLayout>,
    batch_size: usize,
    /// Prefix sums of table dims, length tables + 1
    dim_offsets: Vec<usize>,
}

impl BatchLayout {
    /// Build the batch geometry and check every table against the arena.
    ///
    /// `arena_len` is the arena length in elements. Errors with
    /// [`Error::ArenaOverrun`] if any table's rows extend past it.
    pub fn new(tables: Vec<TableLayout>, batch_size: usize, arena_len: usize) -> Result<Self> {
        let mut dim_offsets = Vec::with_capacity(tables.len() + 1);
        dim_offsets.push(0);
        for (t, table) in tables.iter().enumerate() {
            let needed = table.arena_offset + table.rows * table.dim;
            if needed > arena_len {
                return Err(Error::ArenaOverrun {
                    table: t,
                    needed,
                    len: arena_len,
                });
            }
            dim_offsets.push(dim_offsets[t] + table.dim);
        }
        Ok(Self {
            tables,
            batch_size,
            dim_offsets,
        })
    }

    /// Number of tables in the batch
    #[inline]
    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// Number of bags per table
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Per-table descriptors
    #[inline]
    pub fn tables(&self) -> &[TableLayout] {
        &self.tables
    }

    /// Output column where table `t`'s span starts
    #[inline(always)]
    pub fn dim_offset(&self, t: usize) -> usize {
        self.dim_offsets[t]
    }

    /// Width of one pooled output row (sum of all table dims)
    #[inline]
    pub fn total_dim(&self) -> usize {
        *self.dim_offsets.last().unwrap_or(&0)
    }

    /// Total output length in elements: `batch_size * total_dim`
    #[inline]
    pub fn output_len(&self) -> usize {
        self.batch_size * self.total_dim()
    }

    /// Required offsets length: `num_tables * batch_size + 1`
    #[inline]
    pub fn offsets_len(&self) -> usize {
        self.num_tables() * self.batch_size + 1
    }
}

/// A precision-tagged, read-only view of the shared weight arena.
///
/// The arena is borrowed as raw bytes plus a [`DType`] tag; the dispatch
/// layer reborrows it as a typed slice with bytemuck once the kernel
/// specialization is chosen. The kernel never allocates or copies table data.
#[derive(Copy, Clone, Debug)]
pub struct EmbeddingArena<'a> {
    bytes: &'a [u8],
    dtype: DType,
}

impl<'a> EmbeddingArena<'a> {
    /// Tag a typed slice of rows as an arena view.
    pub fn from_slice<T: Element>(data: &'a [T]) -> Self {
        Self {
            bytes: bytemuck::cast_slice(data),
            dtype: T::DTYPE,
        }
    }

    /// Storage precision of the arena
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Arena length in elements
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / self.dtype.size_in_bytes()
    }

    /// True when the arena holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reborrow the arena as a typed slice.
    ///
    /// Errors with [`Error::UnsupportedDType`] when `T` does not match the
    /// tagged storage precision.
    pub fn as_slice<T: Element>(&self, op: &'static str) -> Result<&'a [T]> {
        if T::DTYPE != self.dtype {
            return Err(Error::UnsupportedDType {
                dtype: self.dtype,
                op,
            });
        }
        Ok(bytemuck::cast_slice(self.bytes))
    }
}

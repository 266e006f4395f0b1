//! Error types for embag

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using embag's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when describing or launching a forward pass.
///
/// Every variant is detected synchronously, before any kernel work starts.
/// Out-of-range indices are deliberately NOT represented here: the hot loop
/// performs no per-element bounds checks, and callers are expected to
/// validate indices upstream (see [`crate::bags::validate_offsets`] for the
/// offset-side counterpart).
#[derive(Error, Debug)]
pub enum Error {
    /// Storage dtype not supported by an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// A caller-supplied buffer has the wrong length
    #[error("Buffer '{buffer}' has {got} elements, expected {expected}")]
    BufferSizeMismatch {
        /// Which buffer failed the check
        buffer: &'static str,
        /// Required element count
        expected: usize,
        /// Actual element count
        got: usize,
    },

    /// Weighted pooling requested without a per-index weight array
    #[error("Weighted pooling requires a per-index weight array")]
    MissingWeights,

    /// A weight array was supplied to the unweighted kernel
    #[error("Unweighted pooling must not receive a per-index weight array")]
    UnexpectedWeights,

    /// Offset array failed validation
    #[error("Invalid offsets: {reason}")]
    InvalidOffsets {
        /// What the validator rejected
        reason: String,
    },

    /// A table's rows do not fit inside the declared arena
    #[error("Table {table} needs {needed} arena elements but the arena holds {len}")]
    ArenaOverrun {
        /// Offending table id
        table: usize,
        /// Elements required by arena_offset + rows * dim
        needed: usize,
        /// Arena length in elements
        len: usize,
    },
}

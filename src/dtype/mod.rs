//! Storage dtype system for embedding tables
//!
//! Tables are stored in one of a small closed set of floating-point formats.
//! The [`DType`] enum names the format at runtime; the [`Element`] trait maps
//! it back to a concrete Rust type for the generic kernels.
//!
//! Accumulation policy: gathered elements are widened to `f32` exactly once
//! at load time (`Element::to_f32`), all pooling arithmetic runs in `f32`,
//! and output is always `f32` — so no narrowing conversion ever happens on
//! the write side, regardless of storage precision.

mod element;

pub use element::Element;

use std::fmt;

/// Storage data types supported for embedding tables
///
/// Using an enum (rather than only generics) allows the caller to pick the
/// storage precision at runtime while the kernels stay monomorphized: the
/// dispatch layer converts from `DType` to a concrete `Element` type before
/// entering the hot loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DType {
    /// 32-bit floating point (full precision)
    F32,
    /// 16-bit floating point, IEEE 754 (reduced precision)
    #[cfg(feature = "f16")]
    F16,
    /// 16-bit brain floating point (reduced precision, f32 dynamic range)
    #[cfg(feature = "f16")]
    BF16,
}

impl DType {
    /// Size of one stored element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F32 => 4,
            #[cfg(feature = "f16")]
            Self::F16 | Self::BF16 => 2,
        }
    }

    /// Returns true for reduced-precision storage formats
    #[inline]
    pub const fn is_reduced_precision(self) -> bool {
        match self {
            Self::F32 => false,
            #[cfg(feature = "f16")]
            Self::F16 | Self::BF16 => true,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::F32 => "f32",
            #[cfg(feature = "f16")]
            Self::F16 => "f16",
            #[cfg(feature = "f16")]
            Self::BF16 => "bf16",
        };
        write!(f, "{}", name)
    }
}

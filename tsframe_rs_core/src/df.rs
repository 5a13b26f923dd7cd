//! # df
//!
//! a DataFrame module that mainly focuses on temporal data:
//! - index: `i64` nanoseconds since epoch
//! - columns: fixed-width byte strings ([`ColumnsDtype`])
//! - values: a dense, row-major float matrix

use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};
use std::{borrow::Cow, fmt};

pub const COLUMNS_NBYTES: usize = 32;
pub type IndexDtype = i64;
pub type ColumnsDtype = FixedString<COLUMNS_NBYTES>;
pub const INDEX_NBYTES: usize = core::mem::size_of::<IndexDtype>();

pub mod frame;
pub mod io;

pub use frame::{
    fast_concat_tables_axis0, fast_concat_tables_axis0_f32, DataFrame, DataFrameF32, DataFrameF64,
    FrameBuffer,
};
pub use io::{serialized_nbytes, HEADER_NBYTES, MAGIC};

/// A byte string of exactly `N` bytes, NUL-padded on the right.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FixedString<const N: usize>(pub [u8; N]);

// SAFETY: `repr(transparent)` over `[u8; N]`, which is `Pod`
unsafe impl<const N: usize> Zeroable for FixedString<N> {}
unsafe impl<const N: usize> Pod for FixedString<N> {}

impl<const N: usize> FixedString<N> {
    /// Strict conversion, `bytes` must have exactly `N` bytes.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self> {
        let inner: [u8; N] = bytes.try_into().map_err(|_| Error::LabelWidthMismatch {
            expected: N,
            got: bytes.len(),
        })?;
        Ok(Self(inner))
    }

    /// Lossy conversion, `bytes` is truncated or NUL-padded to `N` bytes.
    pub fn from_padded(bytes: &[u8]) -> Self {
        let mut inner = [0u8; N];
        let len = bytes.len().min(N);
        inner[..len].copy_from_slice(&bytes[..len]);
        Self(inner)
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// The label without its trailing NUL padding.
    pub fn trimmed(&self) -> &[u8] {
        let len = self.0.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        &self.0[..len]
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.trimmed())
    }
}

impl<const N: usize> Default for FixedString<N> {
    fn default() -> Self {
        Self([0u8; N])
    }
}

impl<const N: usize> From<&str> for FixedString<N> {
    fn from(label: &str) -> Self {
        Self::from_padded(label.as_bytes())
    }
}

impl<const N: usize> fmt::Debug for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{:?}", self.to_string_lossy())
    }
}

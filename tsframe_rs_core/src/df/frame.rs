use super::{ColumnsDtype, IndexDtype};
use crate::toolkit::array::AFloat;
use ndarray::{Ix1, Ix2};

mod buffer;
mod concat;
mod indexing;
mod meta;
mod ops;

pub use buffer::{Backing, FrameBuffer, MappedArray};
pub use concat::{fast_concat_tables_axis0, fast_concat_tables_axis0_f32};
pub use meta::{align_nbytes, DF_ALIGN};

#[cfg(test)]
pub(crate) mod tests {
    pub(crate) use super::meta::tests::get_test_df;
}

/// A timestamp-indexed frame: `index` (one entry per row), `columns` (one label per column)
/// and a row-major `values` matrix of shape `(index.len(), columns.len())`.
///
/// Cloning is cheap, buffers are reference counted and copied only on write.
#[derive(Debug, Clone)]
pub struct DataFrame<T: AFloat> {
    index: FrameBuffer<IndexDtype, Ix1>,
    columns: FrameBuffer<ColumnsDtype, Ix1>,
    values: FrameBuffer<T, Ix2>,
}

pub type DataFrameF64 = DataFrame<f64>;
pub type DataFrameF32 = DataFrame<f32>;

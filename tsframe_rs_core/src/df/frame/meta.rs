use super::{DataFrame, FrameBuffer};
use crate::{
    df::{ColumnsDtype, IndexDtype},
    error::{Error, Result},
    toolkit::array::AFloat,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut2, Ix1, Ix2};

impl<T: AFloat> DataFrame<T> {
    /// Assembles a frame from already-built buffers, checking that their shapes agree.
    pub fn from_buffers(
        index: FrameBuffer<IndexDtype, Ix1>,
        columns: FrameBuffer<ColumnsDtype, Ix1>,
        values: FrameBuffer<T, Ix2>,
    ) -> Result<Self> {
        let expected = (index.len(), columns.len());
        let got = values.dim();
        if expected != got {
            return Err(Error::ShapeMismatch { expected, got });
        }
        Ok(Self {
            index,
            columns,
            values,
        })
    }

    pub fn new(
        index: Array1<IndexDtype>,
        columns: Array1<ColumnsDtype>,
        values: Array2<T>,
    ) -> Result<Self> {
        Self::from_buffers(index.into(), columns.into(), values.into())
    }

    /// Same as [`DataFrame::new`], with `values` given as a flat row-major vector.
    pub fn from_vec(
        index: Vec<IndexDtype>,
        columns: Vec<ColumnsDtype>,
        values: Vec<T>,
    ) -> Result<Self> {
        let shape = (index.len(), columns.len());
        let got_len = values.len();
        // flat lengths, `values` has no 2d shape of its own
        let values = Array2::from_shape_vec(shape, values).map_err(|_| Error::ShapeMismatch {
            expected: (shape.0.saturating_mul(shape.1), 1),
            got: (got_len, 1),
        })?;
        Self::new(index.into(), columns.into(), values)
    }

    /// Builds a frame from raw labels, each of which must be exactly
    /// [`COLUMNS_NBYTES`](crate::df::COLUMNS_NBYTES) bytes wide.
    pub fn from_labels<L: AsRef<[u8]>>(
        index: Vec<IndexDtype>,
        labels: &[L],
        values: Vec<T>,
    ) -> Result<Self> {
        let columns = labels
            .iter()
            .map(|label| ColumnsDtype::try_from_bytes(label.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::from_vec(index, columns, values)
    }

    /// Same as [`DataFrame::from_labels`], but labels are truncated or NUL-padded instead.
    pub fn from_padded_labels<L: AsRef<[u8]>>(
        index: Vec<IndexDtype>,
        labels: &[L],
        values: Vec<T>,
    ) -> Result<Self> {
        let columns = labels
            .iter()
            .map(|label| ColumnsDtype::from_padded(label.as_ref()))
            .collect();
        Self::from_vec(index, columns, values)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }
    pub fn nrows(&self) -> usize {
        self.index.len()
    }
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn index(&self) -> ArrayView1<'_, IndexDtype> {
        self.index.view()
    }
    pub fn columns(&self) -> ArrayView1<'_, ColumnsDtype> {
        self.columns.view()
    }
    pub fn values(&self) -> ArrayView2<'_, T> {
        self.values.view()
    }

    pub(crate) fn index_buffer(&self) -> &FrameBuffer<IndexDtype, Ix1> {
        &self.index
    }
    pub(crate) fn columns_buffer(&self) -> &FrameBuffer<ColumnsDtype, Ix1> {
        &self.columns
    }
    pub(crate) fn values_buffer(&self) -> &FrameBuffer<T, Ix2> {
        &self.values
    }

    /// Mutable access to the values, copying them first if they are shared with anyone else.
    pub fn values_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.values.view_mut()
    }

    pub fn is_owned(&self) -> bool {
        self.index.is_owned() && self.columns.is_owned() && self.values.is_owned()
    }

    /// Copies every shared buffer exactly once, owned buffers are kept as they are.
    pub fn into_owned(self) -> Self {
        Self {
            index: self.index.into_owned(),
            columns: self.columns.into_owned(),
            values: self.values.into_owned(),
        }
    }

    pub fn to_owned_frame(&self) -> Self {
        Self {
            index: self.index.to_owned_buffer(),
            columns: self.columns.to_owned_buffer(),
            values: self.values.to_owned_buffer(),
        }
    }
}

pub const DF_ALIGN: usize = core::mem::align_of::<IndexDtype>();
pub fn align_nbytes(nbytes: usize) -> usize {
    let remainder = nbytes % DF_ALIGN;
    if remainder == 0 {
        nbytes
    } else {
        nbytes + DF_ALIGN - remainder
    }
}

use super::{DataFrame, FrameBuffer};
use crate::{
    error::{Error, Result},
    toolkit::array::AFloat,
};
use ndarray::Axis;

impl<T: AFloat> DataFrame<T> {
    /// Gathers the rows at `indices` (in that order, duplicates allowed) into a new owned frame.
    pub fn rows(&self, indices: &[i64]) -> Result<Self> {
        let len = self.nrows();
        let indices = indices
            .iter()
            .map(|&i| match usize::try_from(i) {
                Ok(i) if i < len => Ok(i),
                _ => Err(Error::IndexOutOfRange { index: i, len }),
            })
            .collect::<Result<Vec<_>>>()?;
        let index = self.index().select(Axis(0), &indices);
        let values = self.values().select(Axis(0), &indices);
        Ok(Self {
            index: FrameBuffer::owned(index),
            columns: self.columns.to_owned_buffer(),
            values: FrameBuffer::owned(values),
        })
    }
}

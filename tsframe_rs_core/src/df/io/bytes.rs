use super::{Header, HEADER_NBYTES};
use crate::{
    df::{
        frame::{Backing, DataFrame, FrameBuffer, MappedArray, DF_ALIGN},
        ColumnsDtype, IndexDtype,
    },
    error::Result,
    toolkit::array::AFloat,
};
use bytes::{BufMut, Bytes};
use ndarray::{Ix1, Ix2};
use std::sync::Arc;
use tracing::debug;

impl<T: AFloat> DataFrame<T> {
    /// Serializes the frame into a fresh buffer, in the same layout as [`DataFrame::save`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let sections = self.sections()?;
        let mut bytes: Vec<u8> = Vec::with_capacity(sections.nbytes());
        bytes.put_slice(&sections.header);
        bytes.put_slice(sections.index);
        bytes.put_slice(sections.columns);
        bytes.put_slice(sections.padding);
        bytes.put_slice(sections.values);
        Ok(bytes)
    }

    /// Deserializes bytes returned from [`DataFrame::to_bytes`]. Trailing bytes are ignored.
    ///
    /// If `bytes` is aligned to [`DF_ALIGN`] the frame is a zero-copy view into it (a shared
    /// frame), otherwise the data is copied into an owned frame.
    pub fn from_bytes(bytes: Bytes) -> Result<Self> {
        if bytes.as_ptr() as usize % DF_ALIGN != 0 {
            debug!("{} bytes are not aligned, copying them", bytes.len());
            return Self::from_buffer(&mut &bytes[..]);
        }
        Self::from_backing(Arc::new(Backing::Bytes(bytes)), false)
    }

    /// Views a serialized frame in place. With `exact`, `backing` must hold nothing but the frame.
    pub fn from_backing(backing: Arc<Backing>, exact: bool) -> Result<Self> {
        let bytes = backing.as_bytes();
        let header = Header::decode::<T>(bytes)?;
        let layout = header.layout::<T>()?;
        layout.check_len(bytes.len(), exact)?;
        let index = MappedArray::<IndexDtype, Ix1>::new(
            Arc::clone(&backing),
            layout.index,
            Ix1(header.nrows),
        )?;
        let columns = MappedArray::<ColumnsDtype, Ix1>::new(
            Arc::clone(&backing),
            layout.columns,
            Ix1(header.ncols),
        )?;
        let values =
            MappedArray::<T, Ix2>::new(backing, layout.values, Ix2(header.nrows, header.ncols))?;
        DataFrame::from_buffers(
            FrameBuffer::Shared(index),
            FrameBuffer::Shared(columns),
            FrameBuffer::Shared(values),
        )
    }
}

/// Size of a serialized frame of shape `(nrows, ncols)` with values of type `T`.
pub fn serialized_nbytes<T: AFloat>(nrows: usize, ncols: usize) -> Result<usize> {
    Ok(Header { nrows, ncols }.layout::<T>()?.total)
}

const _: () = assert!(HEADER_NBYTES % DF_ALIGN == 0);

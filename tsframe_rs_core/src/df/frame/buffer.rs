//! Storage of a single [`DataFrame`](super::DataFrame) field.
//!
//! A [`FrameBuffer`] is either:
//! - [`FrameBuffer::Owned`]: heap memory owned by the engine, held in an [`ArcArray`]. Frames derived
//!   from each other (e.g. by [`DataFrame::with_data`](super::DataFrame::with_data)) may share it, and
//!   mutable access un-shares it first.
//! - [`FrameBuffer::Shared`]: a typed window into some reference-counted, immutable bytes, typically
//!   a read-only memory map of a saved frame. It is never written to; mutable access first copies it
//!   into an [`FrameBuffer::Owned`] buffer.

use crate::{
    error::{Error, Result},
    toolkit::convert::to_nbytes,
};
use bytemuck::Pod;
use bytes::Bytes;
use memmap2::Mmap;
use ndarray::{ArcArray, Array, ArrayView, ArrayViewMut, Dimension};
use std::{fmt, marker::PhantomData, sync::Arc};

/// Immutable bytes that [`MappedArray`]s point into.
pub enum Backing {
    Mmap(Mmap),
    Bytes(Bytes),
}
impl Backing {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Mmap(mmap) => mmap,
            Self::Bytes(bytes) => bytes,
        }
    }
}
impl fmt::Debug for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mmap(mmap) => write!(f, "Backing::Mmap({} bytes)", mmap.len()),
            Self::Bytes(bytes) => write!(f, "Backing::Bytes({} bytes)", bytes.len()),
        }
    }
}

/// A row-major array of `A`s living at `offset` inside a [`Backing`].
pub struct MappedArray<A, D: Dimension> {
    backing: Arc<Backing>,
    offset: usize,
    dim: D,
    _marker: PhantomData<A>,
}

impl<A: Pod, D: Dimension> MappedArray<A, D> {
    /// Checks that `dim` fits inside `backing` at `offset`, with the alignment `A` requires.
    pub fn new(backing: Arc<Backing>, offset: usize, dim: D) -> Result<Self> {
        let nbytes = to_nbytes::<A>(dim.size());
        let end = offset
            .checked_add(nbytes)
            .ok_or_else(|| Error::corrupt("buffer size overflows"))?;
        let bytes = backing.as_bytes().get(offset..end).ok_or_else(|| {
            Error::corrupt(format!(
                "buffer [{offset}, {end}) exceeds {} available bytes",
                backing.as_bytes().len()
            ))
        })?;
        bytemuck::try_cast_slice::<u8, A>(bytes)
            .map_err(|err| Error::corrupt(format!("buffer at {offset} is not usable: {err}")))?;
        Ok(Self {
            backing,
            offset,
            dim,
            _marker: PhantomData,
        })
    }

    pub fn backing(&self) -> &Arc<Backing> {
        &self.backing
    }

    pub fn as_slice(&self) -> &[A] {
        let nbytes = to_nbytes::<A>(self.dim.size());
        bytemuck::cast_slice(&self.backing.as_bytes()[self.offset..self.offset + nbytes])
    }

    pub fn view(&self) -> ArrayView<'_, A, D> {
        let slice = self.as_slice();
        // SAFETY: `slice` holds exactly `dim.size()` elements (checked in `new`), and the view
        // is laid out in the default (row-major) order over it
        unsafe { ArrayView::from_shape_ptr(self.dim.clone(), slice.as_ptr()) }
    }
}

impl<A, D: Dimension> Clone for MappedArray<A, D> {
    fn clone(&self) -> Self {
        Self {
            backing: Arc::clone(&self.backing),
            offset: self.offset,
            dim: self.dim.clone(),
            _marker: PhantomData,
        }
    }
}

impl<A, D: Dimension> fmt::Debug for MappedArray<A, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedArray")
            .field("backing", &self.backing)
            .field("offset", &self.offset)
            .field("dim", &self.dim)
            .finish()
    }
}

#[derive(Debug)]
pub enum FrameBuffer<A, D: Dimension> {
    Owned(ArcArray<A, D>),
    Shared(MappedArray<A, D>),
}

impl<A: Pod, D: Dimension> FrameBuffer<A, D> {
    /// Wraps `array` as an owned buffer, normalizing it to the row-major layout first.
    pub fn owned(array: Array<A, D>) -> Self {
        let array = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        Self::Owned(array.into_shared())
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    pub fn view(&self) -> ArrayView<'_, A, D> {
        match self {
            Self::Owned(array) => array.view(),
            Self::Shared(mapped) => mapped.view(),
        }
    }

    pub fn as_slice(&self) -> Option<&[A]> {
        match self {
            Self::Owned(array) => array.as_slice(),
            Self::Shared(mapped) => Some(mapped.as_slice()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Owned(array) => array.len(),
            Self::Shared(mapped) => mapped.dim.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dim(&self) -> D::Pattern {
        match self {
            Self::Owned(array) => array.dim(),
            Self::Shared(mapped) => mapped.dim.clone().into_pattern(),
        }
    }

    /// Returns an owned buffer: the very same one (by reference) if `self` is owned,
    /// otherwise a private copy of the shared memory.
    pub fn to_owned_buffer(&self) -> Self {
        match self {
            Self::Owned(array) => Self::Owned(array.clone()),
            Self::Shared(mapped) => Self::Owned(mapped.view().to_owned().into_shared()),
        }
    }

    pub fn into_owned(self) -> Self {
        match self {
            Self::Owned(_) => self,
            Self::Shared(_) => self.to_owned_buffer(),
        }
    }

    /// Mutable access, copying the underlying memory first if anyone else can observe it.
    pub fn view_mut(&mut self) -> ArrayViewMut<'_, A, D> {
        if let Self::Shared(mapped) = self {
            let owned = mapped.view().to_owned().into_shared();
            *self = Self::Owned(owned);
        }
        match self {
            Self::Owned(array) => array.view_mut(),
            Self::Shared(_) => unreachable!("shared buffers are converted to owned ones above"),
        }
    }
}

impl<A, D: Dimension> Clone for FrameBuffer<A, D> {
    fn clone(&self) -> Self {
        match self {
            Self::Owned(array) => Self::Owned(array.clone()),
            Self::Shared(mapped) => Self::Shared(mapped.clone()),
        }
    }
}

impl<A: Pod, D: Dimension> From<Array<A, D>> for FrameBuffer<A, D> {
    fn from(array: Array<A, D>) -> Self {
        Self::owned(array)
    }
}

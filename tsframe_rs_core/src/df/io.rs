//! # df/io
//!
//! Binary format of a [`DataFrame`], shared by every codec in this module. Little-endian,
//! every section starts at an offset that is a multiple of [`DF_ALIGN`]:
//!
//! | section | size (bytes) |
//! |---|---|
//! | header: [`MAGIC`], `R`, `C`, label width, value width (`u64` each) | [`HEADER_NBYTES`] |
//! | index | `R * 8` |
//! | columns | `C * COLUMNS_NBYTES`, zero-padded to [`DF_ALIGN`] |
//! | values (row-major) | `R * C * size_of::<T>()` |

use super::{
    frame::{align_nbytes, DataFrame, FrameBuffer, DF_ALIGN},
    ColumnsDtype, IndexDtype, COLUMNS_NBYTES,
};
use crate::{
    as_data_slice_or_err,
    error::{Error, Result},
    toolkit::{
        array::AFloat,
        convert::{from_bytes, to_bytes, to_nbytes},
    },
};
use ndarray::{Array1, Array2};
use std::mem::size_of;

mod buffer;
mod bytes;
mod fs;

pub use self::bytes::serialized_nbytes;

#[cfg(target_endian = "big")]
compile_error!("the frame binary format is little-endian, big-endian targets are not supported");

/// The last byte is the format version.
pub const MAGIC: [u8; 8] = *b"TSFRAME\x01";
pub const HEADER_NBYTES: usize = 5 * 8;
const PADDING: [u8; DF_ALIGN] = [0u8; DF_ALIGN];

fn dtype_name(nbytes: usize) -> &'static str {
    match nbytes {
        4 => "f32",
        8 => "f64",
        _ => "unknown",
    }
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut field = [0u8; 8];
    field.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(field)
}

fn to_usize(value: u64, name: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::corrupt(format!("`{name}` ({value}) overflows")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub nrows: usize,
    pub ncols: usize,
}

/// Byte offsets of each section, relative to the start of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub index: usize,
    pub columns: usize,
    pub values: usize,
    pub total: usize,
}

impl Header {
    pub fn encode<T: AFloat>(&self) -> [u8; HEADER_NBYTES] {
        let fields = [
            self.nrows as u64,
            self.ncols as u64,
            COLUMNS_NBYTES as u64,
            size_of::<T>() as u64,
        ];
        let mut bytes = [0u8; HEADER_NBYTES];
        bytes[..8].copy_from_slice(&MAGIC);
        fields.iter().enumerate().for_each(|(i, field)| {
            bytes[8 * (i + 1)..8 * (i + 2)].copy_from_slice(&field.to_le_bytes());
        });
        bytes
    }

    /// Parses and validates the header at the start of `bytes`, for values of type `T`.
    pub fn decode<T: AFloat>(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_NBYTES {
            return Err(Error::corrupt(format!(
                "{} bytes are not enough for a header ({HEADER_NBYTES} bytes)",
                bytes.len()
            )));
        }
        let (magic, version) = (&bytes[..7], bytes[7]);
        if magic != &MAGIC[..7] {
            return Err(Error::corrupt("bad magic, not a frame file"));
        }
        if version != MAGIC[7] {
            return Err(Error::corrupt(format!(
                "unsupported format version {version}"
            )));
        }
        let nrows = to_usize(read_u64(bytes, 8), "nrows")?;
        let ncols = to_usize(read_u64(bytes, 16), "ncols")?;
        let label_nbytes = read_u64(bytes, 24);
        if label_nbytes != COLUMNS_NBYTES as u64 {
            return Err(Error::corrupt(format!(
                "label width should be {COLUMNS_NBYTES}, got {label_nbytes}"
            )));
        }
        let value_nbytes = to_usize(read_u64(bytes, 32), "value width")?;
        if value_nbytes != size_of::<T>() {
            return Err(Error::DtypeMismatch {
                expected: dtype_name(size_of::<T>()),
                got: dtype_name(value_nbytes),
            });
        }
        Ok(Self { nrows, ncols })
    }

    pub fn layout<T: AFloat>(&self) -> Result<Layout> {
        let overflow = || Error::corrupt(format!("shape {:?} overflows", (self.nrows, self.ncols)));
        let index_nbytes = self
            .nrows
            .checked_mul(size_of::<IndexDtype>())
            .ok_or_else(overflow)?;
        let columns_nbytes = self
            .ncols
            .checked_mul(size_of::<ColumnsDtype>())
            .map(align_nbytes)
            .ok_or_else(overflow)?;
        let values_nbytes = self
            .nrows
            .checked_mul(self.ncols)
            .and_then(|n| n.checked_mul(size_of::<T>()))
            .ok_or_else(overflow)?;
        let index = HEADER_NBYTES;
        let columns = index.checked_add(index_nbytes).ok_or_else(overflow)?;
        let values = columns.checked_add(columns_nbytes).ok_or_else(overflow)?;
        let total = values.checked_add(values_nbytes).ok_or_else(overflow)?;
        Ok(Layout {
            index,
            columns,
            values,
            total,
        })
    }
}

impl Layout {
    /// Checks that `len` available bytes can hold this layout (exactly, if `exact`).
    pub fn check_len(&self, len: usize, exact: bool) -> Result<()> {
        let fits = if exact {
            len == self.total
        } else {
            len >= self.total
        };
        if fits {
            Ok(())
        } else {
            Err(Error::corrupt(format!(
                "header implies {} bytes, but {len} bytes are available",
                self.total
            )))
        }
    }
}

/// The serialized sections of a frame, borrowed from its buffers.
pub(crate) struct Sections<'a> {
    pub header: [u8; HEADER_NBYTES],
    pub index: &'a [u8],
    pub columns: &'a [u8],
    pub padding: &'static [u8],
    pub values: &'a [u8],
}

impl Sections<'_> {
    pub fn nbytes(&self) -> usize {
        self.header.len()
            + self.index.len()
            + self.columns.len()
            + self.padding.len()
            + self.values.len()
    }
}

impl<T: AFloat> DataFrame<T> {
    pub(crate) fn header(&self) -> Header {
        let (nrows, ncols) = self.shape();
        Header { nrows, ncols }
    }

    pub(crate) fn sections(&self) -> Result<Sections<'_>> {
        let index = as_data_slice_or_err!(self.index_buffer());
        let columns = as_data_slice_or_err!(self.columns_buffer());
        let values = as_data_slice_or_err!(self.values_buffer());
        let columns = to_bytes(columns);
        let padding = &PADDING[..align_nbytes(columns.len()) - columns.len()];
        Ok(Sections {
            header: self.header().encode::<T>(),
            index: to_bytes(index),
            columns,
            padding,
            values: to_bytes(values),
        })
    }

    /// Builds an owned frame out of `body`, the bytes that follow a (decoded) `header`.
    pub(crate) fn from_body(header: Header, body: &[u8]) -> Result<Self> {
        let layout = header.layout::<T>()?;
        layout.check_len(body.len() + HEADER_NBYTES, false)?;
        let section = |start: usize, nbytes: usize| {
            &body[start - HEADER_NBYTES..start - HEADER_NBYTES + nbytes]
        };
        let index: Vec<IndexDtype> =
            from_bytes(section(layout.index, to_nbytes::<IndexDtype>(header.nrows)));
        let columns: Vec<ColumnsDtype> =
            from_bytes(section(layout.columns, to_nbytes::<ColumnsDtype>(header.ncols)));
        let values: Vec<T> = from_bytes(section(layout.values, layout.total - layout.values));
        let values = Array2::from_shape_vec((header.nrows, header.ncols), values).map_err(|_| {
            Error::corrupt(format!(
                "values do not fit shape {:?}",
                (header.nrows, header.ncols)
            ))
        })?;
        DataFrame::from_buffers(
            FrameBuffer::owned(Array1::from_vec(index)),
            FrameBuffer::owned(Array1::from_vec(columns)),
            FrameBuffer::owned(values),
        )
    }
}

use super::{Header, HEADER_NBYTES};
use crate::{
    df::frame::DataFrame,
    error::{Error, Result},
    toolkit::array::AFloat,
};
use bytes::Buf;

impl<T: AFloat> DataFrame<T> {
    /// Reads a frame serialized by [`DataFrame::to_bytes`] from `buf` into an owned frame.
    ///
    /// `buf` is advanced past the frame, so consecutive frames can be read from one buffer.
    pub fn from_buffer(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < HEADER_NBYTES {
            return Err(Error::corrupt(format!(
                "{} bytes are not enough for a header",
                buf.remaining()
            )));
        }
        let mut header = [0u8; HEADER_NBYTES];
        buf.copy_to_slice(&mut header);
        let header = Header::decode::<T>(&header)?;
        let body_nbytes = header.layout::<T>()?.total - HEADER_NBYTES;
        if buf.remaining() < body_nbytes {
            return Err(Error::corrupt(format!(
                "expected {body_nbytes} bytes after the header, got {}",
                buf.remaining()
            )));
        }
        let body = buf.copy_to_bytes(body_nbytes);
        Self::from_body(header, &body)
    }
}

use bytemuck::Pod;
use core::mem::size_of;

#[inline]
pub fn to_bytes<T: Pod>(values: &[T]) -> &[u8] {
    bytemuck::cast_slice(values)
}

/// Collects `bytes` into a vector of `T`s.
///
/// Misaligned input is read element by element, so this never fails on alignment.
/// Trailing bytes that cannot form a whole `T` are ignored.
pub fn from_bytes<T: Pod>(bytes: &[u8]) -> Vec<T> {
    let nbytes = bytes.len() - bytes.len() % size_of::<T>();
    let bytes = &bytes[..nbytes];
    match bytemuck::try_cast_slice::<u8, T>(bytes) {
        Ok(values) => values.to_vec(),
        Err(_) => bytes
            .chunks_exact(size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
            .collect(),
    }
}

#[inline]
pub fn to_nbytes<T: Sized>(values_len: usize) -> usize {
    values_len * size_of::<T>()
}

//! # toolkit/array
//!
//! Row-wise ("axis1") numerics and fast concatenation over plain 2-D views.
//!
//! Every axis1 routine follows the same execution model:
//! - the output is allocated once, with one slot per row;
//! - rows are split into contiguous ranges, one range per worker;
//! - each worker writes only into its own range of the output (see [`UnsafeSlice`]),
//!   so nothing has to be synchronized except the final join of the [`rayon`] scope.
//!
//! `num_threads == 0` means 'use all available hardware threads', and `1` runs inline.

use bytemuck::Pod;
use ndarray::{ArrayView1, ScalarOperand};
use num_traits::{Float, FromPrimitive};
use std::{
    cell::UnsafeCell,
    fmt::{Debug, Display},
    ops::{AddAssign, MulAssign, Range, SubAssign},
    ptr,
    thread::available_parallelism,
};
use tracing::warn;

mod coeff;
mod concat;
mod reduce;

pub use coeff::{coeff_axis1, masked_coeff_axis1};
pub use concat::{fast_concat_2d_axis0, fast_concat_2d_axis0_dyn, FloatArray2, FloatArrayView2};
pub use reduce::{
    masked_corr_axis1, masked_mean_axis1, mean_axis1, nancorr_axis1, nanmean_axis1, sum_axis1,
};

#[macro_export]
macro_rules! as_data_slice_or_err {
    ($data:expr) => {
        match $data.as_slice() {
            Some(data) => data,
            None => return Err($crate::error::Error::DataNotContiguous),
        }
    };
}

#[derive(Copy, Clone)]
pub struct UnsafeSlice<'a, T> {
    slice: &'a [UnsafeCell<T>],
}
unsafe impl<'a, T: Send + Sync> Send for UnsafeSlice<'a, T> {}
unsafe impl<'a, T: Send + Sync> Sync for UnsafeSlice<'a, T> {}
impl<'a, T> UnsafeSlice<'a, T> {
    pub fn new(slice: &'a mut [T]) -> Self {
        let ptr = slice as *mut [T] as *const [UnsafeCell<T>];
        Self {
            slice: unsafe { &*ptr },
        }
    }

    pub fn shadow(&mut self) -> Self {
        Self { slice: self.slice }
    }

    pub fn len(&self) -> usize {
        self.slice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }

    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            slice: &self.slice[start..end],
        }
    }

    /// Callers must guarantee that no other [`UnsafeSlice`] writes to (or reads) `i` concurrently.
    pub fn set(&mut self, i: usize, value: T) {
        let ptr = self.slice[i].get();
        unsafe {
            ptr::write(ptr, value);
        }
    }

    /// Copies `src` into `[i, i + src.len())`, same contract as [`UnsafeSlice::set`].
    pub fn copy_from_slice(&mut self, i: usize, src: &[T])
    where
        T: Copy,
    {
        let dst = &self.slice[i..i + src.len()];
        if dst.is_empty() {
            return;
        }
        let ptr = UnsafeCell::raw_get(dst.as_ptr());
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), ptr, src.len());
        }
    }
}

pub trait AFloat:
    Float
    + AddAssign
    + SubAssign
    + MulAssign
    + FromPrimitive
    + ScalarOperand
    + Pod
    + Send
    + Sync
    + Debug
    + Display
{
}
impl<T> AFloat for T where
    T: Float
        + AddAssign
        + SubAssign
        + MulAssign
        + FromPrimitive
        + ScalarOperand
        + Pod
        + Send
        + Sync
        + Debug
        + Display
{
}

// workers

pub fn max_num_threads() -> usize {
    available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[inline]
fn resolve_num_threads(num_threads: usize) -> usize {
    if num_threads == 0 {
        max_num_threads()
    } else {
        num_threads
    }
}

pub(crate) fn build_pool(num_threads: usize) -> Option<rayon::ThreadPool> {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
    {
        Ok(pool) => Some(pool),
        Err(err) => {
            warn!("failed to build a pool of {num_threads} threads, running inline: {err}");
            None
        }
    }
}

/// Runs `f` over `[0, nrows)`, split into at most `num_threads` contiguous ranges.
fn par_row_ranges<F>(nrows: usize, num_threads: usize, f: F)
where
    F: Fn(Range<usize>) + Send + Sync,
{
    let num_threads = resolve_num_threads(num_threads).min(nrows);
    if num_threads <= 1 {
        f(0..nrows);
        return;
    }
    let Some(pool) = build_pool(num_threads) else {
        f(0..nrows);
        return;
    };
    let chunk_size = nrows.div_ceil(num_threads);
    let f = &f;
    pool.scope(|s| {
        (0..nrows).step_by(chunk_size).for_each(|start| {
            let end = (start + chunk_size).min(nrows);
            s.spawn(move |_| f(start..end));
        });
    });
}

/// Computes `f(i)` for every row `i`, writing results into a pre-sized output.
pub(crate) fn fill_axis1<T, F>(nrows: usize, num_threads: usize, f: F) -> Vec<T>
where
    T: AFloat,
    F: Fn(usize) -> T + Send + Sync,
{
    let mut res: Vec<T> = vec![T::zero(); nrows];
    let slice = UnsafeSlice::new(res.as_mut_slice());
    par_row_ranges(nrows, num_threads, |rows| {
        let mut out = slice.slice(rows.start, rows.end);
        rows.enumerate().for_each(|(j, i)| out.set(j, f(i)));
    });
    res
}

/// Same as [`fill_axis1`], but for routines that produce two values per row.
pub(crate) fn fill_axis1_pair<T, F>(nrows: usize, num_threads: usize, f: F) -> (Vec<T>, Vec<T>)
where
    T: AFloat,
    F: Fn(usize) -> (T, T) + Send + Sync,
{
    let mut res0: Vec<T> = vec![T::zero(); nrows];
    let mut res1: Vec<T> = vec![T::zero(); nrows];
    let slice0 = UnsafeSlice::new(res0.as_mut_slice());
    let slice1 = UnsafeSlice::new(res1.as_mut_slice());
    par_row_ranges(nrows, num_threads, |rows| {
        let mut out0 = slice0.slice(rows.start, rows.end);
        let mut out1 = slice1.slice(rows.start, rows.end);
        rows.enumerate().for_each(|(j, i)| {
            let (v0, v1) = f(i);
            out0.set(j, v0);
            out1.set(j, v1);
        });
    });
    (res0, res1)
}

// misc

/// Leftmost insertion point of `value` in the sorted `arr`.
pub fn searchsorted<T: Ord>(arr: &ArrayView1<T>, value: &T) -> usize {
    match arr.as_slice() {
        Some(arr) => arr.partition_point(|x| x < value),
        None => arr.iter().take_while(|&x| x < value).count(),
    }
}

pub fn batch_searchsorted<T: Ord>(arr: &ArrayView1<T>, values: &ArrayView1<T>) -> Vec<usize> {
    values
        .iter()
        .map(|value| searchsorted(arr, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{s, Array1};

    #[test]
    fn test_fill_axis1() {
        for num_threads in [0, 1, 2, 3, 16] {
            let out: Vec<f64> = fill_axis1(7, num_threads, |i| i as f64 * 2.);
            assert_eq!(out, vec![0., 2., 4., 6., 8., 10., 12.]);
            let (a, b): (Vec<f32>, Vec<f32>) = fill_axis1_pair(5, num_threads, |i| (i as f32, -1.));
            assert_eq!(a, vec![0., 1., 2., 3., 4.]);
            assert_eq!(b, vec![-1.; 5]);
        }
        let empty: Vec<f64> = fill_axis1(0, 4, |_| 1.);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_unsafe_slice() {
        let mut data = vec![0i64; 6];
        let mut slice = UnsafeSlice::new(data.as_mut_slice());
        let mut tail = slice.slice(3, 6);
        assert_eq!(tail.len(), 3);
        tail.copy_from_slice(1, &[7, 8]);
        slice.set(0, 1);
        slice.copy_from_slice(6, &[]);
        assert_eq!(data, vec![1, 0, 0, 0, 7, 8]);
    }

    #[test]
    fn test_searchsorted() {
        let array = ArrayView1::<i64>::from_shape(5, &[1, 2, 3, 5, 6]).unwrap();
        assert_eq!(searchsorted(&array, &0), 0);
        assert_eq!(searchsorted(&array, &1), 0);
        assert_eq!(searchsorted(&array, &3), 2);
        assert_eq!(searchsorted(&array, &4), 3);
        assert_eq!(searchsorted(&array, &5), 3);
        assert_eq!(searchsorted(&array, &6), 4);
        assert_eq!(searchsorted(&array, &7), 5);
        assert_eq!(batch_searchsorted(&array, &array), vec![0, 1, 2, 3, 4]);

        let strided = Array1::from_vec(vec![1i64, 100, 2, 100, 4, 100]);
        let strided = strided.slice(s![..;2]);
        assert_eq!(searchsorted(&strided, &3), 2);
        assert_eq!(searchsorted(&strided, &5), 3);
    }
}

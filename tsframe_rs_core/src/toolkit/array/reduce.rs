use super::{fill_axis1, AFloat};
use crate::error::{Error, Result};
use itertools::izip;
use ndarray::{ArrayView1, ArrayView2};
use std::iter::zip;

pub(super) fn check_same_shape<T, U>(a: &ArrayView2<T>, b: &ArrayView2<U>) -> Result<()> {
    if a.dim() != b.dim() {
        return Err(Error::ShapeMismatch {
            expected: a.dim(),
            got: b.dim(),
        });
    }
    Ok(())
}

// row kernels

#[inline]
fn sum<T: AFloat>(a: ArrayView1<T>) -> T {
    a.iter().fold(T::zero(), |acc, &x| acc + x)
}

#[inline]
fn mean<T: AFloat>(a: ArrayView1<T>) -> T {
    match T::from_usize(a.len()) {
        Some(n) => sum(a) / n,
        None => T::nan(),
    }
}

#[inline]
fn mean_where<T: AFloat>(values: impl Iterator<Item = (T, bool)>) -> T {
    let mut sum = T::zero();
    let mut num = T::zero();
    for (x, valid) in values {
        if !valid {
            continue;
        }
        sum += x;
        num += T::one();
    }
    if num.is_zero() {
        T::nan()
    } else {
        sum / num
    }
}

fn nanmean<T: AFloat>(a: ArrayView1<T>) -> T {
    mean_where(a.iter().map(|&x| (x, x.is_finite())))
}

fn masked_mean<T: AFloat>(a: ArrayView1<T>, valid_mask: ArrayView1<bool>) -> T {
    mean_where(zip(a.iter().copied(), valid_mask.iter().copied()))
}

/// Single-pass sufficient statistics of a pair of series.
///
/// Constant series are tracked exactly, the moment-based variance of a constant series whose
/// value is not representable may not round to zero.
struct CorrStats<T> {
    n: T,
    sa: T,
    sb: T,
    saa: T,
    sbb: T,
    sab: T,
    first: Option<(T, T)>,
    varying_a: bool,
    varying_b: bool,
}
impl<T: AFloat> CorrStats<T> {
    fn new() -> Self {
        let zero = T::zero();
        Self {
            n: zero,
            sa: zero,
            sb: zero,
            saa: zero,
            sbb: zero,
            sab: zero,
            first: None,
            varying_a: false,
            varying_b: false,
        }
    }

    #[inline]
    fn push(&mut self, a: T, b: T) {
        match self.first {
            None => self.first = Some((a, b)),
            Some((a0, b0)) => {
                self.varying_a |= a != a0;
                self.varying_b |= b != b0;
            }
        }
        self.n += T::one();
        self.sa += a;
        self.sb += b;
        self.saa += a * a;
        self.sbb += b * b;
        self.sab += a * b;
    }

    fn corr(&self) -> T {
        let two = T::one() + T::one();
        if self.n < two || !(self.varying_a && self.varying_b) {
            return T::nan();
        }
        let cov = self.n * self.sab - self.sa * self.sb;
        let var_a = self.n * self.saa - self.sa * self.sa;
        let var_b = self.n * self.sbb - self.sb * self.sb;
        if !(var_a > T::zero() && var_b > T::zero()) {
            return T::nan();
        }
        cov / (var_a.sqrt() * var_b.sqrt())
    }
}

fn nancorr<T: AFloat>(a: ArrayView1<T>, b: ArrayView1<T>) -> T {
    let mut stats = CorrStats::new();
    zip(a.iter(), b.iter()).for_each(|(&x, &y)| {
        if x.is_finite() && y.is_finite() {
            stats.push(x, y);
        }
    });
    stats.corr()
}

fn masked_corr<T: AFloat>(a: ArrayView1<T>, b: ArrayView1<T>, valid_mask: ArrayView1<bool>) -> T {
    let mut stats = CorrStats::new();
    izip!(a.iter(), b.iter(), valid_mask.iter()).for_each(|(&x, &y, &valid)| {
        if valid {
            stats.push(x, y);
        }
    });
    stats.corr()
}

// axis1 wrappers

/// Plain row sums, NaN propagates.
pub fn sum_axis1<T: AFloat>(a: &ArrayView2<T>, num_threads: usize) -> Vec<T> {
    fill_axis1(a.nrows(), num_threads, |i| sum(a.row(i)))
}

/// Plain row means (`sum_axis1 / ncols`), NaN propagates.
pub fn mean_axis1<T: AFloat>(a: &ArrayView2<T>, num_threads: usize) -> Vec<T> {
    fill_axis1(a.nrows(), num_threads, |i| mean(a.row(i)))
}

/// Row means over finite entries only; a row without any finite entry yields NaN.
pub fn nanmean_axis1<T: AFloat>(a: &ArrayView2<T>, num_threads: usize) -> Vec<T> {
    fill_axis1(a.nrows(), num_threads, |i| nanmean(a.row(i)))
}

/// Same as [`nanmean_axis1`], but validity is read from `valid_mask` instead of being derived.
pub fn masked_mean_axis1<T: AFloat>(
    a: &ArrayView2<T>,
    valid_mask: &ArrayView2<bool>,
    num_threads: usize,
) -> Result<Vec<T>> {
    check_same_shape(a, valid_mask)?;
    Ok(fill_axis1(a.nrows(), num_threads, |i| {
        masked_mean(a.row(i), valid_mask.row(i))
    }))
}

/// Row-wise Pearson correlation over positions that are finite in both `a` and `b`.
///
/// Rows with fewer than two such positions, or with zero variance in either series, yield NaN.
pub fn nancorr_axis1<T: AFloat>(
    a: &ArrayView2<T>,
    b: &ArrayView2<T>,
    num_threads: usize,
) -> Result<Vec<T>> {
    check_same_shape(a, b)?;
    Ok(fill_axis1(a.nrows(), num_threads, |i| {
        nancorr(a.row(i), b.row(i))
    }))
}

/// Same as [`nancorr_axis1`], but validity is read from `valid_mask` instead of being derived.
pub fn masked_corr_axis1<T: AFloat>(
    a: &ArrayView2<T>,
    b: &ArrayView2<T>,
    valid_mask: &ArrayView2<bool>,
    num_threads: usize,
) -> Result<Vec<T>> {
    check_same_shape(a, b)?;
    check_same_shape(a, valid_mask)?;
    Ok(fill_axis1(a.nrows(), num_threads, |i| {
        masked_corr(a.row(i), b.row(i), valid_mask.row(i))
    }))
}

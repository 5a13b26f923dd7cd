//! Per-row robust least-squares coefficients.
//!
//! For each row, `labels ≈ w * signal + b` is fitted over the valid positions of that row,
//! after the signal is winsorized into `median ± 100 * MAD`. When `q > 0`, only the two
//! `q`-tails of the standardized signal take part in the fit.
//!
//! Rows that cannot be fitted (fewer than two usable points, or a constant signal) yield `(NaN, NaN)`.

use super::{fill_axis1_pair, reduce::check_same_shape, AFloat};
use crate::error::{Error, Result};
use itertools::{izip, Itertools};
use ndarray::{ArrayView1, ArrayView2};
use std::{cmp::Ordering, iter::zip};

const WINSORIZE_NUM_MADS: f64 = 100.0;

#[inline]
fn cmp_float<T: AFloat>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Linear interpolation between the order statistics around `q * (n - 1)`.
fn sorted_quantile<T: AFloat>(sorted: &[T], q: T) -> T {
    let n = sorted.len();
    if n == 0 {
        return T::nan();
    }
    let Some(last) = T::from_usize(n - 1) else {
        return T::nan();
    };
    let pos = q * last;
    let floor = pos.floor();
    let i = floor.to_usize().unwrap_or(0).min(n - 1);
    if i + 1 >= n {
        return sorted[n - 1];
    }
    let frac = pos - floor;
    sorted[i] + (sorted[i + 1] - sorted[i]) * frac
}

#[inline]
fn sorted_median<T: AFloat>(sorted: &[T]) -> T {
    sorted_quantile(sorted, T::from_f64(0.5).unwrap_or_else(T::nan))
}

fn mean_std<T: AFloat>(a: &[T]) -> (T, T) {
    let Some(n) = T::from_usize(a.len()) else {
        return (T::nan(), T::nan());
    };
    let mean = a.iter().fold(T::zero(), |acc, &x| acc + x) / n;
    let var = a
        .iter()
        .fold(T::zero(), |acc, &x| acc + (x - mean) * (x - mean))
        / n;
    (mean, var.sqrt())
}

/// Exact check, rounding in `mean_std` leaves a tiny nonzero std for some constant series.
#[inline]
fn is_constant<T: AFloat>(a: &[T]) -> bool {
    match a.split_first() {
        Some((&first, rest)) => rest.iter().all(|&v| v == first),
        None => true,
    }
}

/// Ordinary least squares of `y ≈ w * x + b`.
fn solve_1d<T: AFloat>(x: &[T], y: &[T]) -> (T, T) {
    if x.len() < 2 || is_constant(x) {
        return (T::nan(), T::nan());
    }
    let (x_mean, _) = mean_std(x);
    let (y_mean, _) = mean_std(y);
    let mut sxx = T::zero();
    let mut sxy = T::zero();
    zip(x, y).for_each(|(&xi, &yi)| {
        let dx = xi - x_mean;
        sxx += dx * dx;
        sxy += dx * (yi - y_mean);
    });
    if !(sxx > T::zero()) {
        return (T::nan(), T::nan());
    }
    let w = sxy / sxx;
    (w, y_mean - w * x_mean)
}

fn coeff_with<T: AFloat>(
    x: &ArrayView1<T>,
    y: &ArrayView1<T>,
    valid: impl Iterator<Item = usize>,
    q: T,
) -> (T, T) {
    let (mut x, y): (Vec<T>, Vec<T>) = valid.map(|i| (x[i], y[i])).unzip();
    if x.len() < 2 {
        return (T::nan(), T::nan());
    }

    let x_sorted = x.iter().copied().sorted_by(cmp_float).collect_vec();
    let x_med = sorted_median(&x_sorted);
    let x_dev = x_sorted
        .iter()
        .map(|&v| (v - x_med).abs())
        .sorted_by(cmp_float)
        .collect_vec();
    let x_mad = sorted_median(&x_dev);
    let num_mads = T::from_f64(WINSORIZE_NUM_MADS).unwrap_or_else(T::nan);
    let x_floor = x_med - num_mads * x_mad;
    let x_ceil = x_med + num_mads * x_mad;
    x.iter_mut().for_each(|v| *v = v.max(x_floor).min(x_ceil));

    let (x_mean, x_std) = mean_std(&x);
    if is_constant(&x) || !(x_std > T::zero()) {
        return (T::nan(), T::nan());
    }
    if q <= T::zero() {
        return solve_1d(&x, &y);
    }

    let z = x.iter().map(|&v| (v - x_mean) / x_std).collect_vec();
    let z_sorted = z.iter().copied().sorted_by(cmp_float).collect_vec();
    let z_floor = sorted_quantile(&z_sorted, q);
    let z_ceil = sorted_quantile(&z_sorted, T::one() - q);
    let (x, y): (Vec<T>, Vec<T>) = izip!(&z, &x, &y)
        .filter_map(|(&zi, &xi, &yi)| {
            if zi <= z_floor || zi >= z_ceil {
                Some((xi, yi))
            } else {
                None
            }
        })
        .unzip();
    solve_1d(&x, &y)
}

fn coeff<T: AFloat>(x: ArrayView1<T>, y: ArrayView1<T>, q: T) -> (T, T) {
    let valid = zip(x.iter(), y.iter()).positions(|(a, b)| a.is_finite() && b.is_finite());
    coeff_with(&x, &y, valid, q)
}

fn masked_coeff<T: AFloat>(
    x: ArrayView1<T>,
    y: ArrayView1<T>,
    valid_mask: ArrayView1<bool>,
    q: T,
) -> (T, T) {
    let valid = valid_mask.iter().positions(|&valid| valid);
    coeff_with(&x, &y, valid, q)
}

fn check_q<T: AFloat>(q: T) -> Result<()> {
    let half = T::from_f64(0.5).unwrap_or_else(T::nan);
    if q >= T::zero() && q < half {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "`q` should be in [0, 0.5), got {q}"
        )))
    }
}

/// Fits `labels ≈ w * signal + b` row by row, returns `(ws, bs)`.
///
/// Positions where either `signal` or `labels` is not finite are ignored.
pub fn coeff_axis1<T: AFloat>(
    signal: &ArrayView2<T>,
    labels: &ArrayView2<T>,
    q: T,
    num_threads: usize,
) -> Result<(Vec<T>, Vec<T>)> {
    check_same_shape(signal, labels)?;
    check_q(q)?;
    Ok(fill_axis1_pair(signal.nrows(), num_threads, |i| {
        coeff(signal.row(i), labels.row(i), q)
    }))
}

/// Same as [`coeff_axis1`], but only positions where `valid_mask` is `true` are used.
pub fn masked_coeff_axis1<T: AFloat>(
    signal: &ArrayView2<T>,
    labels: &ArrayView2<T>,
    valid_mask: &ArrayView2<bool>,
    q: T,
    num_threads: usize,
) -> Result<(Vec<T>, Vec<T>)> {
    check_same_shape(signal, labels)?;
    check_same_shape(signal, valid_mask)?;
    check_q(q)?;
    Ok(fill_axis1_pair(signal.nrows(), num_threads, |i| {
        masked_coeff(signal.row(i), labels.row(i), valid_mask.row(i), q)
    }))
}

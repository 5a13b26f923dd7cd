use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{Array2, ArrayView2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use tsframe_core::toolkit::array::*;

macro_rules! bench_nanmean_axis1 {
    ($c:expr, $multiplier:expr, $nthreads:expr, $a32:expr, $a64:expr) => {{
        let name_f32 = format!("nanmean_axis1 (f32) (x{}, {} threads)", $multiplier, $nthreads);
        let name_f64 = format!("nanmean_axis1 (f64) (x{}, {} threads)", $multiplier, $nthreads);
        $c.bench_function(&name_f32, |b| {
            b.iter(|| nanmean_axis1(black_box($a32), black_box($nthreads)))
        });
        $c.bench_function(&name_f64, |b| {
            b.iter(|| nanmean_axis1(black_box($a64), black_box($nthreads)))
        });
    }};
}
macro_rules! bench_nanmean_axis1_full {
    ($c:expr, $multiplier:expr) => {
        let array_f32 = Array2::<f32>::random((239 * $multiplier, 5000), Uniform::new(0., 1.));
        let array_f64 = Array2::<f64>::random((239 * $multiplier, 5000), Uniform::new(0., 1.));
        let array_f32 = &array_f32.view();
        let array_f64 = &array_f64.view();
        bench_nanmean_axis1!($c, $multiplier, 1, array_f32, array_f64);
        bench_nanmean_axis1!($c, $multiplier, 4, array_f32, array_f64);
        bench_nanmean_axis1!($c, $multiplier, 0, array_f32, array_f64);
    };
}
macro_rules! bench_nancorr_axis1 {
    ($c:expr, $multiplier:expr, $nthreads:expr, $a32:expr, $a64:expr) => {{
        let name_f32 = format!("nancorr_axis1 (f32) (x{}, {} threads)", $multiplier, $nthreads);
        let name_f64 = format!("nancorr_axis1 (f64) (x{}, {} threads)", $multiplier, $nthreads);
        $c.bench_function(&name_f32, |b| {
            b.iter(|| nancorr_axis1(black_box($a32), black_box($a32), black_box($nthreads)))
        });
        $c.bench_function(&name_f64, |b| {
            b.iter(|| nancorr_axis1(black_box($a64), black_box($a64), black_box($nthreads)))
        });
    }};
}
macro_rules! bench_nancorr_axis1_full {
    ($c:expr, $multiplier:expr) => {
        let array_f32 = Array2::<f32>::random((239 * $multiplier, 5000), Uniform::new(0., 1.));
        let array_f64 = Array2::<f64>::random((239 * $multiplier, 5000), Uniform::new(0., 1.));
        let array_f32 = &array_f32.view();
        let array_f64 = &array_f64.view();
        bench_nancorr_axis1!($c, $multiplier, 1, array_f32, array_f64);
        bench_nancorr_axis1!($c, $multiplier, 4, array_f32, array_f64);
        bench_nancorr_axis1!($c, $multiplier, 0, array_f32, array_f64);
    };
}

pub fn bench_axis1_ops(c: &mut Criterion) {
    bench_nanmean_axis1_full!(c, 1);
    bench_nanmean_axis1_full!(c, 4);
    bench_nancorr_axis1_full!(c, 1);
    bench_nancorr_axis1_full!(c, 4);
}

pub fn bench_coeff_axis1(c: &mut Criterion) {
    let signal = Array2::<f64>::random((239, 5000), Uniform::new(-1., 1.));
    let noise = Array2::<f64>::random((239, 5000), Uniform::new(-0.1, 0.1));
    let labels = &signal * 2. + &noise;
    let (signal, labels) = (&signal.view(), &labels.view());
    for q in [0., 0.1] {
        for nthreads in [1, 0] {
            let name = format!("coeff_axis1 (f64) (q={q}, {nthreads} threads)");
            c.bench_function(&name, |b| {
                b.iter(|| {
                    coeff_axis1(
                        black_box(signal),
                        black_box(labels),
                        black_box(q),
                        black_box(nthreads),
                    )
                })
            });
        }
    }
}

pub fn bench_concat(c: &mut Criterion) {
    let arrays: Vec<Array2<f32>> = (0..64)
        .map(|_| Array2::<f32>::random((239, 5000), Uniform::new(0., 1.)))
        .collect();
    let views: Vec<ArrayView2<f32>> = arrays.iter().map(|a| a.view()).collect();
    c.bench_function("fast_concat_2d_axis0 (f32) (64 x 239 x 5000)", |b| {
        b.iter(|| fast_concat_2d_axis0(black_box(&views)))
    });
    c.bench_function("ndarray::concatenate (f32) (64 x 239 x 5000)", |b| {
        b.iter(|| ndarray::concatenate(ndarray::Axis(0), black_box(&views)))
    });
}

criterion_group!(benches, bench_axis1_ops, bench_coeff_axis1, bench_concat);
criterion_main!(benches);

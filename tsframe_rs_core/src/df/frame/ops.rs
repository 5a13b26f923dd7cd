use super::{DataFrame, FrameBuffer};
use crate::{
    error::{Error, Result},
    toolkit::array::{self, AFloat},
};
use ndarray::{Array2, ArrayView2};

impl<T: AFloat> DataFrame<T> {
    /// A new owned frame with the same `index` and `columns` (shared, not copied) and new `values`.
    pub fn with_data(&self, values: Array2<T>) -> Result<Self> {
        let expected = self.shape();
        let got = values.dim();
        if expected != got {
            return Err(Error::ShapeMismatch { expected, got });
        }
        Ok(Self {
            index: self.index.to_owned_buffer(),
            columns: self.columns.to_owned_buffer(),
            values: FrameBuffer::owned(values),
        })
    }

    /// Elementwise `values - rhs`, `rhs` must have exactly the same shape (no broadcasting).
    pub fn subtract(&self, rhs: &ArrayView2<T>) -> Result<Self> {
        let expected = self.shape();
        let got = rhs.dim();
        if expected != got {
            return Err(Error::ShapeMismatch { expected, got });
        }
        self.with_data(&self.values() - rhs)
    }

    pub fn subtract_frame(&self, rhs: &DataFrame<T>) -> Result<Self> {
        self.subtract(&rhs.values())
    }

    /// Elementwise `values ** exponent`, following [`num_traits::Float::powf`].
    pub fn pow(&self, exponent: T) -> Self {
        let values = self.values().mapv(|v| v.powf(exponent));
        Self {
            index: self.index.to_owned_buffer(),
            columns: self.columns.to_owned_buffer(),
            values: FrameBuffer::owned(values),
        }
    }

    /// An owned frame with `values` converted to `U`, `index` and `columns` are shared.
    pub fn cast<U: AFloat>(&self) -> DataFrame<U> {
        let values = self
            .values()
            .mapv(|v| num_traits::cast::<T, U>(v).unwrap_or_else(U::nan));
        DataFrame {
            index: self.index.to_owned_buffer(),
            columns: self.columns.to_owned_buffer(),
            values: FrameBuffer::owned(values),
        }
    }

    // reductions

    pub fn mean_axis1(&self, num_threads: usize) -> Vec<T> {
        array::mean_axis1(&self.values(), num_threads)
    }

    pub fn nanmean_axis1(&self, num_threads: usize) -> Vec<T> {
        array::nanmean_axis1(&self.values(), num_threads)
    }

    pub fn nancorr_with_axis1(&self, other: &ArrayView2<T>, num_threads: usize) -> Result<Vec<T>> {
        array::nancorr_axis1(&self.values(), other, num_threads)
    }

    /// Regresses `labels` on this frame's values row by row, see [`array::coeff_axis1`].
    pub fn coeff_with_axis1(
        &self,
        labels: &ArrayView2<T>,
        q: T,
        num_threads: usize,
    ) -> Result<(Vec<T>, Vec<T>)> {
        array::coeff_axis1(&self.values(), labels, q, num_threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::df::frame::tests::get_test_df;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};

    macro_rules! test_arithmetic {
        ($dtype:ty) => {
            let df = get_test_df::<$dtype>();
            let rhs: Array2<$dtype> = Array2::ones((2, 3));
            let diff = df.subtract(&rhs.view()).unwrap();
            assert_eq!(diff.values(), array![[0., 1., 2.], [3., 4., 5.]]);
            assert_eq!(diff.index(), df.index());
            assert_eq!(diff.columns(), df.columns());
            assert_eq!(df.values()[[0, 0]], 1.);

            let zeros = df.subtract_frame(&df).unwrap();
            assert!(zeros.values().iter().all(|&v| v == 0.));

            let squared = df.pow(2.);
            assert_eq!(squared.values(), array![[1., 4., 9.], [16., 25., 36.]]);
        };
    }

    #[test]
    fn test_arithmetic_f32() {
        test_arithmetic!(f32);
    }
    #[test]
    fn test_arithmetic_f64() {
        test_arithmetic!(f64);
    }

    #[test]
    fn test_shape_mismatch() {
        let df = get_test_df::<f64>();
        let rhs: Array2<f64> = Array2::ones((3, 2));
        assert!(matches!(
            df.subtract(&rhs.view()),
            Err(Error::ShapeMismatch {
                expected: (2, 3),
                got: (3, 2)
            })
        ));
        assert!(matches!(
            df.with_data(Array2::zeros((2, 2))),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_pow_nan_semantics() {
        let df = DataFrame::new(
            Array1::from_vec(vec![0]),
            Array1::from_elem(3, Default::default()),
            array![[f64::NAN, -8., 4.]],
        )
        .unwrap();
        let out = df.pow(0.5);
        assert!(out.values()[[0, 0]].is_nan());
        assert!(out.values()[[0, 1]].is_nan());
        assert_eq!(out.values()[[0, 2]], 2.);
        assert_eq!(df.pow(3.).values()[[0, 1]], -512.);
    }

    #[test]
    fn test_cast() {
        let df = get_test_df::<f64>()
            .with_data(array![[0.1, f64::NAN, 3.], [4., -2., 6.]])
            .unwrap();
        let narrowed = df.cast::<f32>();
        assert!(narrowed.is_owned());
        assert_eq!(narrowed.index(), df.index());
        assert_eq!(narrowed.columns(), df.columns());
        assert_eq!(narrowed.values()[[0, 0]], 0.1f32);
        assert!(narrowed.values()[[0, 1]].is_nan());
        assert_eq!(narrowed.cast::<f64>().values()[[1, 1]], -2.);
    }

    #[test]
    fn test_frame_reductions() {
        let df = get_test_df::<f64>();
        assert_eq!(df.mean_axis1(0), vec![2., 5.]);
        assert_eq!(df.nanmean_axis1(1), vec![2., 5.]);
        let labels = df.values().mapv(|v| 3. * v + 1.);
        let corr = df.nancorr_with_axis1(&labels.view(), 2).unwrap();
        corr.iter().for_each(|&c| assert_relative_eq!(c, 1., epsilon = 1e-9));
        let (ws, bs) = df.coeff_with_axis1(&labels.view(), 0., 0).unwrap();
        ws.iter().for_each(|&w| assert_relative_eq!(w, 3., epsilon = 1e-6));
        bs.iter().for_each(|&b| assert_relative_eq!(b, 1., epsilon = 1e-6));
    }
}

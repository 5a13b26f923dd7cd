use super::{build_pool, max_num_threads, AFloat, UnsafeSlice};
use crate::{
    as_data_slice_or_err,
    error::{Error, Result},
};
use ndarray::{Array2, ArrayView2, CowArray, Ix2};
use std::mem;
use tracing::debug;

/// Byte budget of a single copy task: one `239 x 5000` `f32` matrix.
const CONCAT_GROUP_LIMIT: usize = 4 * 239 * 5000;
const CONCAT_MAX_THREADS: usize = 512;

type Task<'a, 'b, D> = (Vec<usize>, Vec<&'a [D]>, UnsafeSlice<'b, D>);
#[inline]
fn fill_concat<D: Copy>((offsets, arrays, mut out): Task<D>) {
    offsets.iter().zip(arrays).for_each(|(&offset, array)| {
        out.copy_from_slice(offset, array);
    });
}

/// Groups consecutive inputs into copy tasks of (roughly) `group_limit` bytes each, and returns
/// the tasks together with the number of tasks each worker should take.
fn plan_tasks<'a, 'b, D: Copy>(
    arrays: Vec<&'a [D]>,
    mut out: UnsafeSlice<'b, D>,
) -> (Vec<Task<'a, 'b, D>>, usize) {
    let nbytes = mem::size_of::<D>();
    let total_bytes = out.len() * nbytes;
    let bumped_limit = CONCAT_GROUP_LIMIT * 16;
    let (mut group_limit, mut tasks_divisor) = if total_bytes <= bumped_limit {
        (CONCAT_GROUP_LIMIT, 8)
    } else {
        (bumped_limit, 1)
    };
    let prior_num_tasks = total_bytes.div_ceil(group_limit);
    let prior_num_threads = prior_num_tasks / tasks_divisor;
    if prior_num_threads > 1 {
        group_limit = total_bytes.div_ceil(prior_num_threads);
        tasks_divisor = 1;
    }

    let mut tasks: Vec<Task<D>> = Vec::new();
    let mut current: Task<D> = (Vec::new(), Vec::new(), out.shadow());
    let mut offset = 0;
    let mut nbytes_cumsum = 0;
    arrays.into_iter().for_each(|array| {
        nbytes_cumsum += nbytes * array.len();
        current.0.push(offset);
        current.1.push(array);
        offset += array.len();
        if nbytes_cumsum >= group_limit {
            nbytes_cumsum = 0;
            let next = (Vec::new(), Vec::new(), out.shadow());
            tasks.push(mem::replace(&mut current, next));
        }
    });
    if !current.0.is_empty() {
        tasks.push(current);
    }
    (tasks, tasks_divisor)
}

/// Stacks `arrays` vertically, i.e. `np.concatenate(arrays, axis=0)`.
///
/// The destination is allocated once, then each input is copied into its own row range.
/// Large inputs are copied concurrently.
pub fn fast_concat_2d_axis0<D: AFloat>(arrays: &[ArrayView2<D>]) -> Result<Array2<D>> {
    let Some(pivot) = arrays.first() else {
        return Err(Error::EmptyInput("fast_concat_2d_axis0"));
    };
    let num_columns = pivot.ncols();
    if let Some(array) = arrays.iter().find(|array| array.ncols() != num_columns) {
        return Err(Error::ColumnCountMismatch {
            expected: num_columns,
            got: array.ncols(),
        });
    }
    let num_total_rows: usize = arrays.iter().map(|array| array.nrows()).sum();

    let standard: Vec<CowArray<D, Ix2>> = arrays
        .iter()
        .map(|array| array.as_standard_layout())
        .collect();
    let slices = standard
        .iter()
        .map(|array| -> Result<&[D]> { Ok(as_data_slice_or_err!(array)) })
        .collect::<Result<Vec<_>>>()?;

    let mut out: Vec<D> = vec![D::zero(); num_total_rows * num_columns];
    let out_slice = UnsafeSlice::new(out.as_mut_slice());
    let (tasks, tasks_divisor) = plan_tasks(slices, out_slice);

    let num_threads = (tasks.len() / tasks_divisor)
        .min(max_num_threads() * 8)
        .min(CONCAT_MAX_THREADS);
    debug!(
        "concatenating {} arrays into ({num_total_rows}, {num_columns}) with {} tasks on {num_threads} threads",
        arrays.len(),
        tasks.len(),
    );
    let pool = if num_threads > 1 {
        build_pool(num_threads)
    } else {
        None
    };
    match pool {
        None => tasks.into_iter().for_each(fill_concat),
        Some(pool) => pool.scope(move |s| {
            tasks.into_iter().for_each(|task| {
                s.spawn(move |_| fill_concat(task));
            });
        }),
    }

    Array2::from_shape_vec((num_total_rows, num_columns), out).map_err(|_| Error::ShapeMismatch {
        expected: (num_total_rows, num_columns),
        got: (num_total_rows, num_columns),
    })
}

/// A 2-D view whose float width is only known at runtime.
#[derive(Debug, Clone)]
pub enum FloatArrayView2<'a> {
    F32(ArrayView2<'a, f32>),
    F64(ArrayView2<'a, f64>),
}
impl<'a> FloatArrayView2<'a> {
    pub fn dtype(&self) -> &'static str {
        match self {
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
        }
    }
}
impl<'a> From<ArrayView2<'a, f32>> for FloatArrayView2<'a> {
    fn from(array: ArrayView2<'a, f32>) -> Self {
        Self::F32(array)
    }
}
impl<'a> From<ArrayView2<'a, f64>> for FloatArrayView2<'a> {
    fn from(array: ArrayView2<'a, f64>) -> Self {
        Self::F64(array)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FloatArray2 {
    F32(Array2<f32>),
    F64(Array2<f64>),
}

macro_rules! collect_variant {
    ($arrays:expr, $variant:ident, $dtype:literal) => {
        $arrays
            .iter()
            .map(|array| match array {
                FloatArrayView2::$variant(array) => Ok(array.view()),
                other => Err(Error::DtypeMismatch {
                    expected: $dtype,
                    got: other.dtype(),
                }),
            })
            .collect::<Result<Vec<_>>>()
    };
}

/// Dispatches to [`fast_concat_2d_axis0`] based on the float width of the first array.
///
/// All arrays must share that width, otherwise [`Error::DtypeMismatch`] is returned.
pub fn fast_concat_2d_axis0_dyn(arrays: &[FloatArrayView2]) -> Result<FloatArray2> {
    match arrays.first() {
        None => Err(Error::EmptyInput("fast_concat_2d_axis0")),
        Some(FloatArrayView2::F32(_)) => {
            let arrays = collect_variant!(arrays, F32, "f32")?;
            Ok(FloatArray2::F32(fast_concat_2d_axis0(&arrays)?))
        }
        Some(FloatArrayView2::F64(_)) => {
            let arrays = collect_variant!(arrays, F64, "f64")?;
            Ok(FloatArray2::F64(fast_concat_2d_axis0(&arrays)?))
        }
    }
}

use super::{DataFrame, FrameBuffer};
use crate::{
    df::{ColumnsDtype, IndexDtype},
    error::{Error, Result},
    toolkit::array::{fast_concat_2d_axis0, AFloat},
};
use ndarray::{Array1, ArrayView2};

/// Stacks `tables` vertically into one owned frame.
///
/// `columns` defaults to the first table's labels. Labels of the other tables are not checked,
/// only their column counts have to agree.
pub fn fast_concat_tables_axis0<T: AFloat>(
    tables: &[DataFrame<T>],
    columns: Option<Array1<ColumnsDtype>>,
) -> Result<DataFrame<T>> {
    let Some(first) = tables.first() else {
        return Err(Error::EmptyInput("fast_concat_tables_axis0"));
    };
    let index: Vec<IndexDtype> = tables
        .iter()
        .flat_map(|table| table.index().into_iter().copied())
        .collect();
    let values: Vec<ArrayView2<T>> = tables.iter().map(|table| table.values()).collect();
    let values = fast_concat_2d_axis0(&values)?;
    let columns = match columns {
        Some(columns) => FrameBuffer::owned(columns),
        None => first.columns.to_owned_buffer(),
    };
    DataFrame::from_buffers(FrameBuffer::owned(Array1::from_vec(index)), columns, values.into())
}

/// Same as [`fast_concat_tables_axis0`], with every table's values converted to `f32` first.
pub fn fast_concat_tables_axis0_f32<T: AFloat>(
    tables: &[DataFrame<T>],
    columns: Option<Array1<ColumnsDtype>>,
) -> Result<DataFrame<f32>> {
    let tables: Vec<DataFrame<f32>> = tables.iter().map(DataFrame::cast::<f32>).collect();
    fast_concat_tables_axis0(&tables, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::df::frame::tests::get_test_df;
    use ndarray::array;

    macro_rules! test_concat_tables {
        ($dtype:ty) => {
            let df = get_test_df::<$dtype>();
            let tail = df.rows(&[1]).unwrap();
            let out = fast_concat_tables_axis0(&[df.clone(), tail, df.clone()], None).unwrap();
            assert_eq!(out.shape(), (5, 3));
            assert_eq!(out.index(), array![1, 2, 2, 1, 2]);
            assert_eq!(out.columns(), df.columns());
            assert_eq!(
                out.values(),
                array![
                    [1., 2., 3.],
                    [4., 5., 6.],
                    [4., 5., 6.],
                    [1., 2., 3.],
                    [4., 5., 6.]
                ]
            );
            assert!(out.is_owned());
        };
    }

    #[test]
    fn test_concat_tables_f32() {
        test_concat_tables!(f32);
    }
    #[test]
    fn test_concat_tables_f64() {
        test_concat_tables!(f64);
    }

    #[test]
    fn test_concat_tables_columns_override() {
        let df = get_test_df::<f64>();
        let columns = Array1::from_iter(["x", "y", "z"].map(ColumnsDtype::from));
        let out = fast_concat_tables_axis0(&[df], Some(columns.clone())).unwrap();
        assert_eq!(out.columns(), columns);

        let df = get_test_df::<f64>();
        let narrow = Array1::from_elem(2, ColumnsDtype::default());
        assert!(matches!(
            fast_concat_tables_axis0(&[df], Some(narrow)),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_concat_tables_cast_to_f32() {
        let df = get_test_df::<f64>();
        let tail = df.rows(&[1]).unwrap();
        let out = fast_concat_tables_axis0_f32(&[df.clone(), tail], None).unwrap();
        assert_eq!(out.index(), array![1, 2, 2]);
        assert_eq!(out.columns(), df.columns());
        assert_eq!(
            out.values(),
            array![[1f32, 2., 3.], [4., 5., 6.], [4., 5., 6.]]
        );
        let empty: [DataFrame<f64>; 0] = [];
        assert!(matches!(
            fast_concat_tables_axis0_f32(&empty, None),
            Err(Error::EmptyInput(_))
        ));
    }

    #[test]
    fn test_concat_tables_errors() {
        let empty: [DataFrame<f64>; 0] = [];
        assert!(matches!(
            fast_concat_tables_axis0(&empty, None),
            Err(Error::EmptyInput(_))
        ));
        let df = get_test_df::<f64>();
        let other = DataFrame::from_padded_labels(vec![0], &["a"], vec![1.]).unwrap();
        assert!(matches!(
            fast_concat_tables_axis0(&[df, other], None),
            Err(Error::ColumnCountMismatch {
                expected: 3,
                got: 1
            })
        ));
    }
}

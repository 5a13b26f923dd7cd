use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("column label should have exactly {expected} bytes, got {got}")]
    LabelWidthMismatch { expected: usize, got: usize },

    #[error("row index {index} is out of range for {len} rows")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("dtype mismatch: expected `{expected}`, got `{got}`")]
    DtypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("column count mismatch: expected {expected}, got {got}")]
    ColumnCountMismatch { expected: usize, got: usize },

    #[error("corrupt file: {0}")]
    CorruptFile(String),

    #[error("`{0}` requires at least one input")]
    EmptyInput(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("data is not contiguous")]
    DataNotContiguous,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptFile(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod array;
pub mod convert;

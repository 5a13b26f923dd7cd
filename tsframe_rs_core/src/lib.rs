//! # tsframe_core
//!
//! The numeric engine behind a compact, temporal-indexed columnar frame:
//! - [`df`]: the [`df::DataFrame`] itself, its ownership model and its binary codec.
//! - [`toolkit`]: axis1 reductions, the robust regression estimator and fast concatenation,
//!   all of which operate on plain [`ndarray`] views and do not depend on [`df`].

pub mod df;
pub mod error;
pub mod toolkit;

pub use error::{Error, Result};

//! Numerical utilities: least squares, summary statistics and the slope
//! significance test.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;

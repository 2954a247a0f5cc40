//! `energy-cpm` library crate.
//!
//! Change-point regression of building energy use against outdoor temperature.
//! [`fit`] tries the 1P, 3P heating, 3P cooling and 5P shapes, searches their
//! breakpoints and returns an immutable [`FitResult`].
//!
//! The binary (`cpm`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the engine has no I/O and can be embedded elsewhere

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;

pub use domain::{FitOptions, FitResult, ModelShape, TieBreak};
pub use error::FitError;
pub use fit::fit;

//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - model shapes and fit configuration (`ModelShape`, `FitOptions`, `TieBreak`)
//! - the validated observation series (`Observations`)
//! - transient candidates and the final immutable `FitResult`

pub mod observations;
pub mod result;
pub mod types;

pub use observations::*;
pub use result::*;
pub use types::*;

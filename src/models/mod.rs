//! Change-point model implementations.
//!
//! Models are implemented as small, pure functions so that fitting/search code can
//! stay generic over `ModelShape`.

pub mod model;

pub use model::*;

//! Numerical utilities: sample grids, interpolants and weighted least squares.

pub mod grid;
pub mod interp;
pub mod ols;

pub use grid::*;
pub use interp::*;
pub use ols::*;

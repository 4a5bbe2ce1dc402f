//! Calibrated suppression model.
//!
//! For a relation `f_b(M, z)` the suppression at wavenumber `k` is
//!
//! ```text
//! S(k) = λ(k) - (λ(k) - μ(k)) exp(-ν(k) f_b(M_opt(k), z))
//! ```
//!
//! where `M_opt(k)` is the halo mass whose baryon fraction best predicts the
//! suppression at that scale. All parameters come from the calibration table.

pub mod shape;
pub mod suppression;

pub use shape::*;
pub use suppression::*;

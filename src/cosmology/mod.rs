//! Cosmology collaborator.
//!
//! The suppression model needs exactly two things from a cosmology:
//!
//! - the universal baryon fraction `Ω_b / Ω_m`
//! - the dimensionless Hubble parameter `E(z) = H(z) / H0`
//!
//! Both are exposed through the [`Cosmology`] trait so a full external
//! cosmology library can be plugged in. [`FlatLcdm`] is the in-process
//! implementation used by default.

pub mod flat_lcdm;

pub use flat_lcdm::*;

use thiserror::Error;

/// Errors raised by a cosmology evaluator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CosmologyError {
    #[error("cosmology parameter `{name}` is invalid: {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("cannot evaluate E(z) at z = {z} (requires finite z > -1)")]
    InvalidRedshift { z: f64 },
    #[error("cosmology evaluator failed: {0}")]
    Evaluator(String),
}

/// Capability interface for the external cosmology service.
pub trait Cosmology: Send + Sync {
    /// Dimensionless Hubble parameter `E(z) = H(z) / H0`.
    fn expansion_rate(&self, z: f64) -> Result<f64, CosmologyError>;

    /// Universal baryon fraction `Ω_b / Ω_m`.
    fn baryon_to_matter_ratio(&self) -> f64;
}

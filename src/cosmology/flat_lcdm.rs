//! Minimal flat ΛCDM evaluator.
//!
//! `E(z) = sqrt(Ω_m (1 + z)^3 + (1 − Ω_m))`. Radiation is neglected; over the
//! calibrated range (`z ≤ 3`) its contribution to `E(z)` is below 1e-3.

use serde::{Deserialize, Serialize};

use super::{Cosmology, CosmologyError};

/// Planck 2018 (TT,TE,EE+lowE+lensing+BAO) values.
pub const PLANCK18_H0: f64 = 67.66;
pub const PLANCK18_OMEGA_M: f64 = 0.30966;
pub const PLANCK18_OMEGA_B: f64 = 0.04897;

/// Flat ΛCDM cosmology described by `{H0, Ω_m, Ω_b}`.
///
/// Deserialization goes through [`FlatLcdm::new`], so invalid parameters are
/// rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FlatLcdmParams")]
pub struct FlatLcdm {
    h0: f64,
    omega_m: f64,
    omega_b: f64,
}

#[derive(Deserialize)]
struct FlatLcdmParams {
    h0: f64,
    omega_m: f64,
    omega_b: f64,
}

impl TryFrom<FlatLcdmParams> for FlatLcdm {
    type Error = CosmologyError;

    fn try_from(p: FlatLcdmParams) -> Result<Self, Self::Error> {
        Self::new(p.h0, p.omega_m, p.omega_b)
    }
}

impl FlatLcdm {
    /// Build a cosmology, validating the parameters.
    ///
    /// Requires `H0 > 0`, `0 < Ω_m ≤ 1` and `0 < Ω_b ≤ Ω_m`.
    pub fn new(h0: f64, omega_m: f64, omega_b: f64) -> Result<Self, CosmologyError> {
        if !(h0.is_finite() && h0 > 0.0) {
            return Err(CosmologyError::InvalidParameter {
                name: "H0",
                value: h0,
                reason: "must be finite and > 0",
            });
        }
        if !(omega_m.is_finite() && omega_m > 0.0 && omega_m <= 1.0) {
            return Err(CosmologyError::InvalidParameter {
                name: "Omega_m",
                value: omega_m,
                reason: "must lie in (0, 1] for a flat universe",
            });
        }
        if !(omega_b.is_finite() && omega_b > 0.0 && omega_b <= omega_m) {
            return Err(CosmologyError::InvalidParameter {
                name: "Omega_b",
                value: omega_b,
                reason: "must lie in (0, Omega_m]",
            });
        }
        Ok(Self { h0, omega_m, omega_b })
    }

    pub fn planck18() -> Self {
        Self {
            h0: PLANCK18_H0,
            omega_m: PLANCK18_OMEGA_M,
            omega_b: PLANCK18_OMEGA_B,
        }
    }

    pub fn h0(&self) -> f64 {
        self.h0
    }

    pub fn omega_m(&self) -> f64 {
        self.omega_m
    }

    pub fn omega_b(&self) -> f64 {
        self.omega_b
    }

    pub fn omega_lambda(&self) -> f64 {
        1.0 - self.omega_m
    }
}

impl Default for FlatLcdm {
    fn default() -> Self {
        Self::planck18()
    }
}

impl Cosmology for FlatLcdm {
    fn expansion_rate(&self, z: f64) -> Result<f64, CosmologyError> {
        if !(z.is_finite() && z > -1.0) {
            return Err(CosmologyError::InvalidRedshift { z });
        }
        let a_inv = 1.0 + z;
        let e2 = self.omega_m * a_inv * a_inv * a_inv + self.omega_lambda();
        Ok(e2.sqrt())
    }

    fn baryon_to_matter_ratio(&self) -> f64 {
        self.omega_b / self.omega_m
    }
}

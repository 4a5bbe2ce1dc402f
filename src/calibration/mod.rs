//! Calibration of the suppression model.
//!
//! The calibration is fixed, read-only data. It holds, per overdensity
//! definition:
//!
//! - quadratic-in-`(1+z)` coefficients for the eleven fitting-function
//!   parameters (`FitCoefficients`)
//! - the baryon-fraction envelope spanned by the simulation suite, tabulated at
//!   redshift nodes (`FittingLimits`)
//! - the anchor mass used to summarize a relation by its shape parameters
//!
//! plus the wavenumber/redshift support shared by both definitions.
//!
//! The standard table is built once per process ([`CalibrationTable::standard`])
//! and passed around by reference; tests and callers may construct or load
//! their own tables instead. Its coefficients are illustrative placeholders
//! with the right shape and magnitude (see [`standard`]); load the published
//! simulation fit as JSON for physical results.
//!
//! Statistical error bands live in a separate, optional [`StatErrorTable`].

pub mod errors;
pub mod standard;

pub use errors::{ErrorRow, StatErrorTable};

use std::io::Read;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::domain::Overdensity;
use crate::error::{SpkError, SpkResult};
use crate::math::{Interpolant, Scheme};

/// `c0 + c1 (1+z) + c2 (1+z)^2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadratic(pub [f64; 3]);

impl Quadratic {
    pub fn at(&self, z: f64) -> f64 {
        let x = 1.0 + z;
        self.0[2] * x * x + self.0[1] * x + self.0[0]
    }
}

/// Redshift-dependent coefficients of the fitting function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitCoefficients {
    pub alpha: Quadratic,
    pub beta: Quadratic,
    pub gamma: Quadratic,
    pub lambda_a: Quadratic,
    pub lambda_b: Quadratic,
    pub mu_a: Quadratic,
    pub mu_b: Quadratic,
    pub mu_c: Quadratic,
    pub nu_a: Quadratic,
    pub nu_b: Quadratic,
    pub nu_c: Quadratic,
}

/// Fitting-function parameters evaluated at one redshift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// `log10` optimal mass as `k → 0`.
    pub alpha: f64,
    /// `log10` optimal mass at `k = 1 h/Mpc`.
    pub beta: f64,
    pub gamma: f64,
    pub lambda_a: f64,
    pub lambda_b: f64,
    pub mu_a: f64,
    pub mu_b: f64,
    pub mu_c: f64,
    pub nu_a: f64,
    pub nu_b: f64,
    pub nu_c: f64,
}

impl FitCoefficients {
    pub fn at(&self, z: f64) -> ModelParameters {
        ModelParameters {
            alpha: self.alpha.at(z),
            beta: self.beta.at(z),
            gamma: self.gamma.at(z),
            lambda_a: self.lambda_a.at(z),
            lambda_b: self.lambda_b.at(z),
            mu_a: self.mu_a.at(z),
            mu_b: self.mu_b.at(z),
            mu_c: self.mu_c.at(z),
            nu_a: self.nu_a.at(z),
            nu_b: self.nu_b.at(z),
            nu_c: self.nu_c.at(z),
        }
    }
}

/// Baryon-fraction envelope of the calibration suite.
///
/// At each redshift node the limits are
/// `log10 f_lim(M) = x0 + x1 log10 M + x2 (log10 M)^2`, in units of the
/// universal baryon fraction. Between nodes the coefficients are
/// Akima-interpolated; outside the node range they are held at the end nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittingLimits {
    pub z: Vec<f64>,
    pub min_x0: Vec<f64>,
    pub min_x1: Vec<f64>,
    pub min_x2: Vec<f64>,
    pub max_x0: Vec<f64>,
    pub max_x1: Vec<f64>,
    pub max_x2: Vec<f64>,
}

/// Limit polynomials evaluated at one redshift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitPolynomials {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl LimitPolynomials {
    /// `(min_fb, max_fb)` at `mass` (M_sun).
    pub fn bounds(&self, mass: f64) -> (f64, f64) {
        let l = mass.log10();
        let eval = |c: &[f64; 3]| 10f64.powf(c[0] + c[1] * l + c[2] * l * l);
        (eval(&self.min), eval(&self.max))
    }
}

impl FittingLimits {
    fn columns(&self) -> [(&'static str, &Vec<f64>); 6] {
        [
            ("min_x0", &self.min_x0),
            ("min_x1", &self.min_x1),
            ("min_x2", &self.min_x2),
            ("max_x0", &self.max_x0),
            ("max_x1", &self.max_x1),
            ("max_x2", &self.max_x2),
        ]
    }

    fn validate(&self) -> SpkResult<()> {
        for (name, col) in self.columns() {
            if col.len() != self.z.len() {
                return Err(SpkError::configuration(format!(
                    "Fitting limits column `{name}` has {} entries, expected {}.",
                    col.len(),
                    self.z.len()
                )));
            }
        }
        for (name, col) in self.columns() {
            if let Some(bad) = col.iter().find(|v| !v.is_finite()) {
                return Err(SpkError::configuration(format!(
                    "Fitting limits column `{name}` holds a non-finite value ({bad})."
                )));
            }
        }
        // Redshift node checks (count, order) are shared with the interpolant.
        Interpolant::new(Scheme::Akima, &self.z, &self.min_x0)?;
        Ok(())
    }

    /// Limit polynomials at redshift `z`.
    pub fn at(&self, z: f64) -> SpkResult<LimitPolynomials> {
        let z_lo = self.z[0];
        let z_hi = self.z[self.z.len() - 1];
        let zc = z.clamp(z_lo, z_hi);

        let mut values = [0.0; 6];
        for (slot, (_, col)) in values.iter_mut().zip(self.columns()) {
            *slot = Interpolant::new(Scheme::Akima, &self.z, col)?.eval(zc);
        }
        Ok(LimitPolynomials {
            min: [values[0], values[1], values[2]],
            max: [values[3], values[4], values[5]],
        })
    }
}

/// Calibration block for one overdensity definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdensityCalibration {
    pub overdensity: Overdensity,
    /// Mass (M_sun) at which shape parameters are measured.
    pub anchor_mass: f64,
    pub fit: FitCoefficients,
    pub limits: FittingLimits,
}

/// Wavenumber and redshift support of the calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavenumberSupport {
    /// Lowest native sample (h/Mpc).
    pub k_min: f64,
    /// Nyquist wavenumber of the simulation suite (h/Mpc); trusted up to here.
    pub k_trusted: f64,
    /// Largest wavenumber the fit was calibrated to (h/Mpc); hard ceiling.
    pub k_ceiling: f64,
    /// Number of native log-spaced samples on `[k_min, k_ceiling]`.
    pub n_native: usize,
    /// Lowest calibrated redshift; below it results are less accurate.
    pub z_min_trusted: f64,
    /// Highest calibrated redshift; above it requests are rejected.
    pub z_max: f64,
}

impl WavenumberSupport {
    fn validate(&self) -> SpkResult<()> {
        let ok = self.k_min.is_finite()
            && self.k_min > 0.0
            && self.k_trusted > self.k_min
            && self.k_ceiling >= self.k_trusted
            && self.k_ceiling.is_finite()
            && self.n_native >= 2
            && self.z_min_trusted.is_finite()
            && self.z_max.is_finite()
            && self.z_max > 0.0;
        if ok {
            Ok(())
        } else {
            Err(SpkError::configuration(format!(
                "Invalid calibration support: {self:?}"
            )))
        }
    }

    /// Native k-sampling of the calibration.
    pub fn native_grid(&self) -> SpkResult<Vec<f64>> {
        crate::math::log_space(self.k_min, self.k_ceiling, self.n_native)
    }

    /// Native samples needed to interpolate on `[k_min, k_max]`.
    ///
    /// That is the nodes bracketing the range plus one neighbour on each side,
    /// so interior cubic slopes match those of the full grid.
    pub fn native_window(&self, k_min: f64, k_max: f64) -> SpkResult<Vec<f64>> {
        let grid = self.native_grid()?;
        let last = grid.len() - 1;
        let lo = grid
            .iter()
            .rposition(|&k| k <= k_min)
            .unwrap_or(0)
            .saturating_sub(1);
        let hi = grid
            .iter()
            .position(|&k| k >= k_max)
            .map_or(last, |i| (i + 1).min(last))
            .max(lo + 1);
        Ok(grid[lo..=hi].to_vec())
    }
}

/// Immutable calibration shared by all model evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    blocks: Vec<OverdensityCalibration>,
    support: WavenumberSupport,
}

impl CalibrationTable {
    /// Build a table, validating its structure.
    pub fn new(blocks: Vec<OverdensityCalibration>, support: WavenumberSupport) -> SpkResult<Self> {
        support.validate()?;
        if blocks.is_empty() {
            return Err(SpkError::configuration("Calibration table has no overdensity blocks."));
        }
        for (i, block) in blocks.iter().enumerate() {
            if blocks[..i].iter().any(|b| b.overdensity == block.overdensity) {
                return Err(SpkError::configuration(format!(
                    "Calibration table lists overdensity {} twice.",
                    block.overdensity
                )));
            }
            if !(block.anchor_mass.is_finite() && block.anchor_mass > 0.0) {
                return Err(SpkError::configuration(format!(
                    "Calibration anchor mass for {} must be > 0.",
                    block.overdensity
                )));
            }
            block.limits.validate()?;
        }
        Ok(Self { blocks, support })
    }

    /// The standard calibration, built once per process.
    pub fn standard() -> &'static CalibrationTable {
        static STANDARD: OnceLock<CalibrationTable> = OnceLock::new();
        STANDARD.get_or_init(standard::table)
    }

    /// Load a table from JSON (the serde form of this type).
    pub fn from_json_reader(reader: impl Read) -> SpkResult<Self> {
        let raw: CalibrationTable = serde_json::from_reader(reader)
            .map_err(|e| SpkError::configuration(format!("Invalid calibration JSON: {e}")))?;
        Self::new(raw.blocks, raw.support)
    }

    pub fn support(&self) -> &WavenumberSupport {
        &self.support
    }

    pub fn blocks(&self) -> &[OverdensityCalibration] {
        &self.blocks
    }

    /// Calibration block for `overdensity`.
    pub fn block(&self, overdensity: Overdensity) -> SpkResult<&OverdensityCalibration> {
        self.blocks
            .iter()
            .find(|b| b.overdensity == overdensity)
            .ok_or_else(|| {
                SpkError::configuration(format!(
                    "No calibration available for overdensity {overdensity}."
                ))
            })
    }

    /// Fitting-function parameters for `overdensity` at `z`.
    pub fn parameters(&self, overdensity: Overdensity, z: f64) -> SpkResult<ModelParameters> {
        Ok(self.block(overdensity)?.fit.at(z))
    }
}

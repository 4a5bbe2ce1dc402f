//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - passed between the resolver, the model and the assembler
//! - parsed straight from CLI flags (`clap::ValueEnum`)
//! - exported to JSON/CSV and reloaded for plotting

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::assemble::GridSpec;
use crate::error::{SpkError, SpkResult};

/// Spherical-overdensity halo mass definition the relation is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Overdensity {
    /// `M200c`: mean density 200× critical.
    #[serde(rename = "200c")]
    #[value(name = "200")]
    So200c,
    /// `M500c`: mean density 500× critical.
    #[serde(rename = "500c")]
    #[value(name = "500")]
    So500c,
}

impl Overdensity {
    pub const ALL: [Overdensity; 2] = [Overdensity::So200c, Overdensity::So500c];

    /// Parse the integer form used by callers (`200` or `500`).
    pub fn from_value(value: u32) -> SpkResult<Self> {
        match value {
            200 => Ok(Overdensity::So200c),
            500 => Ok(Overdensity::So500c),
            other => Err(SpkError::configuration(format!(
                "Spherical overdensity must be 200 or 500 (got {other})."
            ))),
        }
    }

    pub fn value(self) -> u32 {
        match self {
            Overdensity::So200c => 200,
            Overdensity::So500c => 500,
        }
    }

    /// Mass label for terminal output.
    pub fn mass_label(self) -> &'static str {
        match self {
            Overdensity::So200c => "M200c",
            Overdensity::So500c => "M500c",
        }
    }
}

impl fmt::Display for Overdensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}c", self.value())
    }
}

/// Spacing of the output wavenumber grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    #[default]
    Log,
    Linear,
}

/// Interpolation of the native suppression curve onto the output grid (in `ln k`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CurveInterpolation {
    /// Fritsch–Carlson monotone cubic; preserves the monotonicity of the curve.
    #[default]
    MonotoneCubic,
    Linear,
}

/// Interpolation of a binned baryon-fraction relation (in `log10 M`, `log10 f_b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BinnedInterpolation {
    /// Piecewise linear in log-log space.
    #[default]
    LogLinear,
    /// Akima spline in log-log space.
    Akima,
}

/// Extrapolation of a binned relation outside its mass range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Extrapolation {
    /// Continue with the log-log slope of the outermost interval.
    #[default]
    BoundarySlope,
    /// Hold the boundary value.
    Flat,
}

/// Settings shared by the suppression subcommands.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub overdensity: Overdensity,
    pub redshifts: Vec<f64>,
    pub grid: GridSpec,

    pub h0: f64,
    pub omega_m: f64,
    pub omega_b: f64,

    /// Optional calibration table override (JSON).
    pub calibration_path: Option<PathBuf>,
    /// Optional statistical error table (CSV).
    pub stat_errors_path: Option<PathBuf>,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

/// A saved suppression curve (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub overdensity: Overdensity,
    pub z: f64,
    pub shape: ShapeParameters,
    pub grid: CurveGrid,
}

/// Amplitude and slope of a relation at the calibration anchor mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeParameters {
    pub anchor_mass: f64,
    pub amplitude: f64,
    pub slope: f64,
    pub within_hull: bool,
}

/// Bootstrapped statistical error bands of `S` at one wavenumber.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorBand {
    /// -1 sigma (68%).
    pub minus_68: f64,
    /// +1 sigma (68%).
    pub plus_68: f64,
    /// -2 sigma (95%).
    pub minus_95: f64,
    /// +2 sigma (95%).
    pub plus_95: f64,
}

impl ErrorBand {
    pub fn is_finite(&self) -> bool {
        [self.minus_68, self.plus_68, self.minus_95, self.plus_95]
            .iter()
            .all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub k: Vec<f64>,
    pub sup: Vec<f64>,
    pub extrapolated: Vec<bool>,
    /// Per-point error bands; `null` where the error table has no coverage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Option<ErrorBand>>>,
}

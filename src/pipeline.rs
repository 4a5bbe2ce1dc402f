//! Library entry point: relation in, suppression curves out.
//!
//! compute_suppression runs the whole workflow for one request:
//! validate redshifts -> resolve relation -> evaluate on the native samples
//! covering the requested grid -> assemble onto the requested grid.
//! Redshifts are processed independently and in request order.

use tracing::{debug, warn};

use crate::assemble::{AssembledCurve, GridSpec, assemble, attach_errors};
use crate::calibration::{CalibrationTable, StatErrorTable, WavenumberSupport};
use crate::cosmology::{Cosmology, FlatLcdm};
use crate::domain::Overdensity;
use crate::error::{SpkError, SpkResult};
use crate::model::suppression;
use crate::relation::{RelationSpec, resolve};

/// A suppression request.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressionRequest {
    pub overdensity: Overdensity,
    pub redshifts: Vec<f64>,
    pub relation: RelationSpec,
    pub grid: GridSpec,
}

impl SuppressionRequest {
    /// Request on the default grid.
    pub fn new(overdensity: Overdensity, redshifts: Vec<f64>, relation: RelationSpec) -> Self {
        Self {
            overdensity,
            redshifts,
            relation,
            grid: GridSpec::default(),
        }
    }

    pub fn with_grid(mut self, grid: GridSpec) -> Self {
        self.grid = grid;
        self
    }
}

/// One assembled curve per requested redshift, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressionResult {
    pub curves: Vec<AssembledCurve>,
}

impl SuppressionResult {
    pub fn is_extrapolated(&self) -> bool {
        self.curves.iter().any(AssembledCurve::is_extrapolated)
    }
}

/// Compute `S(k)` for every redshift of `request`.
pub fn compute_suppression(
    request: &SuppressionRequest,
    calibration: &CalibrationTable,
    cosmology: &dyn Cosmology,
) -> SpkResult<SuppressionResult> {
    let support = calibration.support();
    validate_redshifts(&request.redshifts, support)?;
    // Reject bad grids before any model work.
    request.grid.validate(support)?;

    let relation = resolve(
        &request.relation,
        request.overdensity,
        &request.redshifts,
        cosmology,
    )?;
    // Only the native samples the output grid interpolates from; the relation
    // is never evaluated at masses the request does not reach.
    let native = support.native_window(request.grid.k_min, request.grid.k_max)?;

    let mut curves = Vec::with_capacity(request.redshifts.len());
    for &z in &request.redshifts {
        let curve = suppression(&relation, calibration, request.overdensity, z, &native)?;
        curves.push(assemble(&curve, support, &request.grid)?);
    }
    debug!(n_curves = curves.len(), "suppression computed");

    Ok(SuppressionResult { curves })
}

/// [`compute_suppression`] plus statistical error bands from `errors`.
pub fn compute_suppression_with_errors(
    request: &SuppressionRequest,
    calibration: &CalibrationTable,
    cosmology: &dyn Cosmology,
    errors: &StatErrorTable,
) -> SpkResult<SuppressionResult> {
    if errors.overdensity() != request.overdensity {
        return Err(SpkError::configuration(format!(
            "Error table is for {} but SO={} was requested.",
            errors.overdensity(),
            request.overdensity
        )));
    }
    let mut result = compute_suppression(request, calibration, cosmology)?;
    for curve in &mut result.curves {
        attach_errors(curve, errors)?;
    }
    Ok(result)
}

/// [`compute_suppression`] with the standard calibration and Planck 2018.
pub fn compute_suppression_default(request: &SuppressionRequest) -> SpkResult<SuppressionResult> {
    compute_suppression(request, CalibrationTable::standard(), &FlatLcdm::planck18())
}

/// Redshifts must be finite, non-negative, distinct and within the calibrated
/// range.
pub fn validate_redshifts(redshifts: &[f64], support: &WavenumberSupport) -> SpkResult<()> {
    if redshifts.is_empty() {
        return Err(SpkError::configuration("At least one redshift is required."));
    }
    for (i, &z) in redshifts.iter().enumerate() {
        // Per-redshift parameters pair with redshifts by position.
        if redshifts[..i].contains(&z) {
            return Err(SpkError::configuration(format!(
                "Redshift z={z} is listed more than once."
            )));
        }
        if !z.is_finite() || z < 0.0 {
            return Err(SpkError::domain(format!(
                "Redshift must be finite and >= 0 (got {z})."
            )));
        }
        if z > support.z_max {
            return Err(SpkError::range(format!(
                "Redshift z={z} exceeds the calibrated maximum of {}.",
                support.z_max
            )));
        }
        if z < support.z_min_trusted {
            warn!(
                z,
                z_min = support.z_min_trusted,
                "redshift below the calibrated range; results are less accurate"
            );
        }
    }
    Ok(())
}

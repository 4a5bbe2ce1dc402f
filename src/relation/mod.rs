//! Baryon fraction – halo mass relations.
//!
//! Callers describe the relation in one of three forms ([`RelationSpec`]):
//!
//! - `PowerLaw`: `f = a (M / pivot)^b`, with `a`/`b` uniform or given per redshift
//! - `RedshiftPowerLaw`: closed form in `M500c` and `E(z)/E(0.3)`
//! - `Binned`: tabulated `(M, f)` pairs interpolated in log-log space
//!
//! [`resolve`] validates the input and produces a [`BaryonFractionRelation`],
//! a pure function of `(mass, z)` evaluable at any positive mass and at the
//! redshifts it was resolved for.
//!
//! Fractions are normalized by the universal baryon fraction, i.e. they are
//! `f_b / (Ω_b / Ω_m)` and physically lie in `[0, 1]`.

pub mod binned;
pub mod power_law;
pub mod redshift_power_law;

pub use binned::*;
pub use power_law::*;
pub use redshift_power_law::*;

use tracing::debug;

use crate::cosmology::Cosmology;
use crate::domain::Overdensity;
use crate::error::{SpkError, SpkResult};

/// A scalar applied to every redshift, or one value per requested redshift.
#[derive(Debug, Clone, PartialEq)]
pub enum PerRedshift {
    Scalar(f64),
    Sequence(Vec<f64>),
}

impl PerRedshift {
    /// Expand to one value per redshift.
    ///
    /// A scalar is repeated; a sequence must have exactly `n` entries and is
    /// paired positionally with the redshifts. Anything else is rejected.
    pub fn broadcast(&self, name: &str, n: usize) -> SpkResult<Vec<f64>> {
        match self {
            PerRedshift::Scalar(v) => Ok(vec![*v; n]),
            PerRedshift::Sequence(values) if values.len() == n => Ok(values.clone()),
            PerRedshift::Sequence(values) => Err(SpkError::configuration(format!(
                "`{name}` has {} values but {n} redshift(s) were requested; \
                 give a scalar or exactly one value per redshift.",
                values.len()
            ))),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, PerRedshift::Scalar(_))
    }
}

impl From<f64> for PerRedshift {
    fn from(value: f64) -> Self {
        PerRedshift::Scalar(value)
    }
}

impl From<Vec<f64>> for PerRedshift {
    fn from(values: Vec<f64>) -> Self {
        if values.len() == 1 {
            PerRedshift::Scalar(values[0])
        } else {
            PerRedshift::Sequence(values)
        }
    }
}

/// User-facing description of the relation.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationSpec {
    PowerLaw(PowerLawParams),
    RedshiftPowerLaw(RedshiftPowerLawParams),
    Binned(BinnedParams),
}

impl RelationSpec {
    pub fn mode_name(&self) -> &'static str {
        match self {
            RelationSpec::PowerLaw(_) => "power_law",
            RelationSpec::RedshiftPowerLaw(_) => "redshift_power_law",
            RelationSpec::Binned(_) => "binned",
        }
    }
}

/// A fraction value plus whether it came from extrapolating beyond tabulated data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionSample {
    pub value: f64,
    pub extrapolated: bool,
}

impl FractionSample {
    /// Finite, non-negative, and at most the universal fraction unless it was
    /// extrapolated.
    pub fn is_physical(&self) -> bool {
        self.value.is_finite() && self.value >= 0.0 && (self.value <= 1.0 || self.extrapolated)
    }
}

/// Canonical relation: `(halo mass [M_sun], z) → f_b / (Ω_b / Ω_m)`.
#[derive(Debug, Clone, PartialEq)]
pub enum BaryonFractionRelation {
    PowerLaw(PowerLawRelation),
    RedshiftPowerLaw(RedshiftPowerLawRelation),
    Binned(BinnedRelation),
}

impl BaryonFractionRelation {
    pub fn overdensity(&self) -> Overdensity {
        match self {
            BaryonFractionRelation::PowerLaw(r) => r.overdensity(),
            BaryonFractionRelation::RedshiftPowerLaw(_) => Overdensity::So500c,
            BaryonFractionRelation::Binned(r) => r.overdensity(),
        }
    }

    /// Universal baryon fraction `Ω_b / Ω_m` used to convert to physical fractions.
    pub fn baryon_to_matter_ratio(&self) -> f64 {
        match self {
            BaryonFractionRelation::PowerLaw(r) => r.baryon_to_matter_ratio(),
            BaryonFractionRelation::RedshiftPowerLaw(r) => r.baryon_to_matter_ratio(),
            BaryonFractionRelation::Binned(r) => r.baryon_to_matter_ratio(),
        }
    }

    /// Evaluate the normalized fraction, reporting extrapolation.
    ///
    /// Errors:
    /// - `Domain` for a non-positive or non-finite mass
    /// - `Domain` for a negative/non-finite fraction, or a fraction above the
    ///   universal value that was not produced by extrapolation
    /// - `Configuration` for a redshift the relation was not resolved for
    pub fn sample(&self, mass: f64, z: f64) -> SpkResult<FractionSample> {
        let sample = self.evaluate(mass, z)?;
        if !sample.is_physical() {
            return Err(if sample.value.is_finite() && sample.value >= 0.0 {
                SpkError::domain(format!(
                    "Baryon fraction at M={mass:.3e} M_sun, z={z} is {:.4} times the universal \
                     fraction (must not exceed Omega_b/Omega_m).",
                    sample.value
                ))
            } else {
                SpkError::domain(format!(
                    "Baryon fraction at M={mass:.3e} M_sun, z={z} is {} (must be finite and >= 0).",
                    sample.value
                ))
            });
        }
        Ok(sample)
    }

    /// Evaluate without the physical-range check on the result.
    ///
    /// The mass must still be finite and positive.
    pub fn evaluate(&self, mass: f64, z: f64) -> SpkResult<FractionSample> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SpkError::domain(format!(
                "Halo mass must be finite and > 0 (got {mass})."
            )));
        }

        Ok(match self {
            BaryonFractionRelation::PowerLaw(r) => FractionSample {
                value: r.evaluate(mass, z)?,
                extrapolated: false,
            },
            BaryonFractionRelation::RedshiftPowerLaw(r) => FractionSample {
                value: r.evaluate(mass, z)?,
                extrapolated: false,
            },
            BaryonFractionRelation::Binned(r) => r.evaluate(mass),
        })
    }

    /// Normalized fraction `f_b / (Ω_b / Ω_m)`.
    pub fn fraction(&self, mass: f64, z: f64) -> SpkResult<f64> {
        Ok(self.sample(mass, z)?.value)
    }

    /// Physical fraction `f_b`.
    pub fn physical_fraction(&self, mass: f64, z: f64) -> SpkResult<f64> {
        Ok(self.fraction(mass, z)? * self.baryon_to_matter_ratio())
    }
}

/// Validate `spec` and build the canonical relation for the requested redshifts.
pub fn resolve(
    spec: &RelationSpec,
    overdensity: Overdensity,
    redshifts: &[f64],
    cosmology: &dyn Cosmology,
) -> SpkResult<BaryonFractionRelation> {
    debug!(mode = spec.mode_name(), %overdensity, n_z = redshifts.len(), "resolving relation");
    let ratio = cosmology.baryon_to_matter_ratio();
    match spec {
        RelationSpec::PowerLaw(params) => {
            PowerLawRelation::resolve(params, overdensity, redshifts, ratio)
                .map(BaryonFractionRelation::PowerLaw)
        }
        RelationSpec::RedshiftPowerLaw(params) => {
            RedshiftPowerLawRelation::resolve(params, overdensity, redshifts, cosmology)
                .map(BaryonFractionRelation::RedshiftPowerLaw)
        }
        RelationSpec::Binned(params) => {
            BinnedRelation::resolve(params, overdensity, ratio).map(BaryonFractionRelation::Binned)
        }
    }
}

/// Position of `z` among resolved redshifts (exact match).
pub(crate) fn redshift_index(resolved: &[f64], z: f64) -> SpkResult<usize> {
    resolved.iter().position(|&v| v == z).ok_or_else(|| {
        SpkError::configuration(format!(
            "Relation was not resolved for z={z} (resolved for {resolved:?})."
        ))
    })
}

//! Redshift-dependent power law in `M500c`.
//!
//! `f_b = 0.1658 (e^α / 100) (M / 1e14)^(β-1) (E(z) / E(0.3))^γ`, divided by
//! `Ω_b / Ω_m` to obtain the normalized fraction.

use tracing::debug;

use super::redshift_index;
use crate::cosmology::Cosmology;
use crate::domain::Overdensity;
use crate::error::{SpkError, SpkResult};

/// Physical normalization of the closed form.
pub const NORMALIZATION: f64 = 0.1658;
/// Redshift at which the evolution term is unity.
pub const REFERENCE_REDSHIFT: f64 = 0.3;
/// Pivot mass (M_sun).
pub const PIVOT_MASS: f64 = 1.0e14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedshiftPowerLawParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl RedshiftPowerLawParams {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedshiftPowerLawRelation {
    params: RedshiftPowerLawParams,
    baryon_to_matter: f64,
    redshifts: Vec<f64>,
    /// `E(z) / E(0.3)` per resolved redshift.
    expansion_ratios: Vec<f64>,
}

impl RedshiftPowerLawRelation {
    pub fn resolve(
        params: &RedshiftPowerLawParams,
        overdensity: Overdensity,
        redshifts: &[f64],
        cosmology: &dyn Cosmology,
    ) -> SpkResult<Self> {
        if overdensity != Overdensity::So500c {
            return Err(SpkError::configuration(format!(
                "The redshift power law is defined for M500c only (got SO={overdensity})."
            )));
        }
        let RedshiftPowerLawParams { alpha, beta, gamma } = *params;
        if !(alpha.is_finite() && beta.is_finite() && gamma.is_finite()) {
            return Err(SpkError::configuration(format!(
                "Redshift power-law parameters must be finite (alpha={alpha}, beta={beta}, gamma={gamma})."
            )));
        }

        let baryon_to_matter = cosmology.baryon_to_matter_ratio();
        if !(baryon_to_matter.is_finite() && baryon_to_matter > 0.0) {
            return Err(SpkError::domain(format!(
                "Omega_b/Omega_m must be finite and > 0 (got {baryon_to_matter})."
            )));
        }

        let e_ref = cosmology.expansion_rate(REFERENCE_REDSHIFT)?;
        let expansion_ratios = redshifts
            .iter()
            .map(|&z| Ok(cosmology.expansion_rate(z)? / e_ref))
            .collect::<SpkResult<Vec<_>>>()?;

        debug!(alpha, beta, gamma, "using redshift-dependent power law for fb - M500c");

        Ok(Self {
            params: *params,
            baryon_to_matter,
            redshifts: redshifts.to_vec(),
            expansion_ratios,
        })
    }

    pub fn params(&self) -> RedshiftPowerLawParams {
        self.params
    }

    pub fn baryon_to_matter_ratio(&self) -> f64 {
        self.baryon_to_matter
    }

    pub(crate) fn evaluate(&self, mass: f64, z: f64) -> SpkResult<f64> {
        let e_ratio = self.expansion_ratios[redshift_index(&self.redshifts, z)?];
        let RedshiftPowerLawParams { alpha, beta, gamma } = self.params;
        let physical = NORMALIZATION
            * (alpha.exp() / 100.0)
            * (mass / PIVOT_MASS).powf(beta - 1.0)
            * e_ratio.powf(gamma);
        Ok(physical / self.baryon_to_matter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmology::{CosmologyError, FlatLcdm};

    struct Failing;

    impl Cosmology for Failing {
        fn expansion_rate(&self, _z: f64) -> Result<f64, CosmologyError> {
            Err(CosmologyError::Evaluator("no network".to_string()))
        }

        fn baryon_to_matter_ratio(&self) -> f64 {
            0.16
        }
    }

    fn bahamas() -> RedshiftPowerLawParams {
        RedshiftPowerLawParams::new(4.189, 1.273, 0.298)
    }

    #[test]
    fn evolution_term_cancels_at_reference_redshift() {
        let cosmo = FlatLcdm::planck18();
        let rel =
            RedshiftPowerLawRelation::resolve(&bahamas(), Overdensity::So500c, &[0.3], &cosmo)
                .unwrap();
        let ratio = cosmo.baryon_to_matter_ratio();
        let expected = (NORMALIZATION / ratio) * (4.189f64.exp() / 100.0);
        let got = rel.evaluate(1e14, 0.3).unwrap();
        assert!((got - expected).abs() < 1e-12, "got {got}, expected {expected}");
    }

    #[test]
    fn fraction_grows_with_redshift_for_positive_gamma() {
        let cosmo = FlatLcdm::planck18();
        let rel = RedshiftPowerLawRelation::resolve(
            &bahamas(),
            Overdensity::So500c,
            &[0.125, 1.0],
            &cosmo,
        )
        .unwrap();
        assert!(rel.evaluate(1e14, 1.0).unwrap() > rel.evaluate(1e14, 0.125).unwrap());
        assert!(matches!(rel.evaluate(1e14, 0.5), Err(SpkError::Configuration(_))));
    }

    #[test]
    fn m200c_is_rejected() {
        let cosmo = FlatLcdm::planck18();
        let err =
            RedshiftPowerLawRelation::resolve(&bahamas(), Overdensity::So200c, &[0.3], &cosmo)
                .unwrap_err();
        assert!(matches!(err, SpkError::Configuration(_)), "{err}");
    }

    #[test]
    fn cosmology_failure_propagates() {
        let err = RedshiftPowerLawRelation::resolve(&bahamas(), Overdensity::So500c, &[0.3], &Failing)
            .unwrap_err();
        assert_eq!(
            err,
            SpkError::Cosmology(CosmologyError::Evaluator("no network".to_string()))
        );
    }
}

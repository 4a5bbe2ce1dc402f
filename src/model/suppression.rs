//! Fitting function, optimal mass and fitting limits.

use tracing::{debug, warn};

use super::shape_parameters;
use crate::calibration::{CalibrationTable, ModelParameters};
use crate::domain::{Overdensity, ShapeParameters};
use crate::error::{SpkError, SpkResult};
use crate::relation::BaryonFractionRelation;

/// Suppression on a wavenumber grid for one redshift.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressionCurve {
    pub overdensity: Overdensity,
    pub z: f64,
    /// Wavenumbers (h/Mpc), strictly increasing.
    pub k: Vec<f64>,
    /// `P_hydro / P_DMO` at `k`.
    pub sup: Vec<f64>,
    /// `M_opt(k)` (M_sun).
    pub optimal_mass: Vec<f64>,
    /// Normalized baryon fraction at `M_opt(k)`.
    pub baryon_fraction: Vec<f64>,
    /// Fraction outside the calibrated envelope (or extrapolated by the relation).
    pub outside_limits: Vec<bool>,
    pub shape: ShapeParameters,
}

impl SuppressionCurve {
    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }

    /// True if any point was evaluated outside the calibrated envelope.
    pub fn is_extrapolated(&self) -> bool {
        self.outside_limits.iter().any(|&f| f)
    }
}

/// The eleven fitting-function parameters for `overdensity` at `z`.
pub fn model_parameters(
    calibration: &CalibrationTable,
    overdensity: Overdensity,
    z: f64,
) -> SpkResult<ModelParameters> {
    check_redshift(z)?;
    calibration.parameters(overdensity, z)
}

/// Optimal mass `M_opt(k)` (M_sun) for each wavenumber in `k` (h/Mpc).
///
/// Wavenumbers above the calibration ceiling are a range error; above the
/// trusted wavenumber a warning is logged.
pub fn optimal_mass(
    calibration: &CalibrationTable,
    overdensity: Overdensity,
    z: f64,
    k: &[f64],
) -> SpkResult<Vec<f64>> {
    check_wavenumbers(k)?;
    let support = calibration.support();
    let k_max = k.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if k_max > support.k_ceiling {
        return Err(SpkError::range(format!(
            "Maximum k={k_max} h/Mpc exceeds the calibrated ceiling of {} h/Mpc.",
            support.k_ceiling
        )));
    }
    if k_max > support.k_trusted {
        warn!(
            k_max,
            k_trusted = support.k_trusted,
            "optimal mass requested beyond the Nyquist wavenumber of the calibration suite"
        );
    }

    let params = model_parameters(calibration, overdensity, z)?;
    Ok(k.iter().map(|&k| optimal_mass_at(&params, k)).collect())
}

/// Fitting limits `(min_fb, max_fb)` at each mass, normalized by `Ω_b / Ω_m`.
pub fn fitting_limits(
    calibration: &CalibrationTable,
    overdensity: Overdensity,
    z: f64,
    masses: &[f64],
) -> SpkResult<(Vec<f64>, Vec<f64>)> {
    check_redshift(z)?;
    if let Some(bad) = masses.iter().find(|m| !(m.is_finite() && **m > 0.0)) {
        return Err(SpkError::domain(format!(
            "Halo mass must be finite and > 0 (got {bad})."
        )));
    }
    let limits = calibration.block(overdensity)?.limits.at(z)?;
    Ok(masses.iter().map(|&m| limits.bounds(m)).unzip())
}

/// Evaluate the calibrated suppression of `relation` on `k_grid`.
///
/// `k_grid` must be finite, positive and strictly increasing; it is not
/// checked against the calibration ceiling. Points whose baryon fraction lies
/// outside the fitting limits are evaluated with the same fitting function and
/// flagged in [`SuppressionCurve::outside_limits`].
pub fn suppression(
    relation: &BaryonFractionRelation,
    calibration: &CalibrationTable,
    overdensity: Overdensity,
    z: f64,
    k_grid: &[f64],
) -> SpkResult<SuppressionCurve> {
    if relation.overdensity() != overdensity {
        return Err(SpkError::configuration(format!(
            "Relation is expressed in {} but SO={overdensity} was requested.",
            relation.overdensity().mass_label()
        )));
    }
    check_wavenumbers(k_grid)?;
    if !k_grid.windows(2).all(|w| w[1] > w[0]) {
        return Err(SpkError::configuration(
            "Wavenumber grid must be strictly increasing.",
        ));
    }

    let block = calibration.block(overdensity)?;
    let params = model_parameters(calibration, overdensity, z)?;
    let limits = block.limits.at(z)?;

    let n = k_grid.len();
    let mut sup = Vec::with_capacity(n);
    let mut masses = Vec::with_capacity(n);
    let mut fractions = Vec::with_capacity(n);
    let mut outside = Vec::with_capacity(n);
    for &k in k_grid {
        let mass = optimal_mass_at(&params, k);
        let sample = relation.sample(mass, z)?;
        let (lo, hi) = limits.bounds(mass);
        sup.push(fitting_function(&params, k, sample.value));
        masses.push(mass);
        fractions.push(sample.value);
        outside.push(sample.extrapolated || sample.value < lo || sample.value > hi);
    }

    let flagged: Vec<f64> = masses
        .iter()
        .zip(&outside)
        .filter_map(|(m, &o)| o.then_some(*m))
        .collect();
    if !flagged.is_empty() {
        let lo = flagged.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = flagged.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        warn!(
            %overdensity,
            z,
            n_points = flagged.len(),
            mass_min = format_args!("{lo:.3e}"),
            mass_max = format_args!("{hi:.3e}"),
            "baryon fraction outside the fitting limits; suppression is extrapolated"
        );
    }

    let shape = shape_parameters(relation, z, block.anchor_mass, &limits)?;
    if !shape.within_hull {
        warn!(
            %overdensity,
            z,
            amplitude = shape.amplitude,
            anchor_mass = block.anchor_mass,
            "relation amplitude lies outside the calibrated region"
        );
    }
    debug!(%overdensity, z, n_k = n, slope = shape.slope, "suppression evaluated");

    Ok(SuppressionCurve {
        overdensity,
        z,
        k: k_grid.to_vec(),
        sup,
        optimal_mass: masses,
        baryon_fraction: fractions,
        outside_limits: outside,
        shape,
    })
}

/// `10^(α - (α - β) k^γ)`.
fn optimal_mass_at(p: &ModelParameters, k: f64) -> f64 {
    10f64.powf(p.alpha - (p.alpha - p.beta) * k.powf(p.gamma))
}

/// `S = λ - (λ - μ) exp(-ν f)` with `λ, μ, ν` functions of `log10 k`.
fn fitting_function(p: &ModelParameters, k: f64, fraction: f64) -> f64 {
    let x = k.log10();
    let lambda = 1.0 + p.lambda_a * (p.lambda_b * x).exp();
    let mu = p.mu_a + (1.0 - p.mu_a) / (1.0 + (p.mu_b * x + p.mu_c).exp());
    let nu = p.nu_a * (-0.5 * ((x - p.nu_b) / p.nu_c).powi(2)).exp();
    lambda - (lambda - mu) * (-nu * fraction).exp()
}

fn check_redshift(z: f64) -> SpkResult<()> {
    if z.is_finite() && z >= 0.0 {
        Ok(())
    } else {
        Err(SpkError::domain(format!(
            "Redshift must be finite and >= 0 (got {z})."
        )))
    }
}

fn check_wavenumbers(k: &[f64]) -> SpkResult<()> {
    if k.is_empty() {
        return Err(SpkError::configuration("Wavenumber grid is empty."));
    }
    if let Some(bad) = k.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(SpkError::domain(format!(
            "Wavenumbers must be finite and > 0 (got {bad})."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmology::FlatLcdm;
    use crate::relation::{PowerLawParams, RelationSpec, resolve};

    fn power_law(so: Overdensity, a: f64, b: f64, z: f64) -> BaryonFractionRelation {
        let spec = RelationSpec::PowerLaw(PowerLawParams::new(a, b));
        resolve(&spec, so, &[z], &FlatLcdm::planck18()).unwrap()
    }

    fn native() -> Vec<f64> {
        CalibrationTable::standard().support().native_grid().unwrap()
    }

    #[test]
    fn bahamas_curve_is_monotone_and_within_limits() {
        let cal = CalibrationTable::standard();
        for so in Overdensity::ALL {
            for z in [0.125, 1.0, 3.0] {
                let rel = power_law(so, 8.44e-5, 0.275, z);
                let curve = suppression(&rel, cal, so, z, &native()).unwrap();
                assert!(!curve.is_extrapolated(), "{so} z={z}");
                assert!(curve.shape.within_hull);
                assert!(curve.sup[0] > 0.99 && curve.sup[0] <= 1.0);
                for w in curve.sup.windows(2) {
                    assert!(w[0] >= w[1], "{so} z={z}: {} < {}", w[0], w[1]);
                }
                assert!(curve.sup.iter().all(|&s| s > 0.0 && s <= 1.0));
            }
        }
    }

    #[test]
    fn low_k_approaches_unity_for_valid_power_laws() {
        let cal = CalibrationTable::standard();
        for (a, b) in [(0.9, 0.0), (0.05, 0.0), (8.44e-5, 0.275)] {
            let rel = power_law(Overdensity::So200c, a, b, 0.5);
            let curve = suppression(&rel, cal, Overdensity::So200c, 0.5, &[0.01, 0.02, 0.05]).unwrap();
            assert!(curve.sup[0] > 0.995, "a={a} b={b}: {}", curve.sup[0]);
            assert!(curve.sup[0] >= curve.sup[1] && curve.sup[1] >= curve.sup[2]);
        }
    }

    #[test]
    fn tiny_fraction_is_flagged_not_rejected() {
        let cal = CalibrationTable::standard();
        let rel = power_law(Overdensity::So200c, 1e-6, 0.0, 0.125);
        let curve = suppression(&rel, cal, Overdensity::So200c, 0.125, &native()).unwrap();
        assert!(curve.outside_limits.iter().all(|&f| f));
        assert!(curve.sup.iter().all(|s| s.is_finite()));
        assert!(!curve.shape.within_hull);
    }

    #[test]
    fn overdensity_mismatch_is_configuration_error() {
        let cal = CalibrationTable::standard();
        let rel = power_law(Overdensity::So200c, 0.5, 0.0, 0.5);
        assert!(matches!(
            suppression(&rel, cal, Overdensity::So500c, 0.5, &[0.1, 1.0]),
            Err(SpkError::Configuration(_))
        ));
    }

    #[test]
    fn unordered_grid_is_rejected() {
        let cal = CalibrationTable::standard();
        let rel = power_law(Overdensity::So200c, 0.5, 0.0, 0.5);
        assert!(matches!(
            suppression(&rel, cal, Overdensity::So200c, 0.5, &[1.0, 0.1]),
            Err(SpkError::Configuration(_))
        ));
        assert!(matches!(
            suppression(&rel, cal, Overdensity::So200c, 0.5, &[0.0, 0.1]),
            Err(SpkError::Domain(_))
        ));
    }

    #[test]
    fn optimal_mass_decreases_with_k() {
        let cal = CalibrationTable::standard();
        let z = 0.5;
        let masses = optimal_mass(cal, Overdensity::So200c, z, &[0.1, 1.0, 8.0]).unwrap();
        assert!(masses[0] > masses[1] && masses[1] > masses[2]);

        // k = 1 h/Mpc gives 10^β exactly.
        let beta = model_parameters(cal, Overdensity::So200c, z).unwrap().beta;
        assert!((masses[1].log10() - beta).abs() < 1e-12);
    }

    #[test]
    fn optimal_mass_beyond_ceiling_is_range_error() {
        let cal = CalibrationTable::standard();
        assert!(matches!(
            optimal_mass(cal, Overdensity::So500c, 0.5, &[1.0, 12.5]),
            Err(SpkError::Range(_))
        ));
        assert!(optimal_mass(cal, Overdensity::So500c, 0.5, &[1.0, 10.0]).is_ok());
    }

    #[test]
    fn fitting_limits_bracket_and_clamp_redshift() {
        let cal = CalibrationTable::standard();
        let masses = [1e12, 1e13, 1e14, 1e15];
        let (lo, hi) = fitting_limits(cal, Overdensity::So200c, 0.5, &masses).unwrap();
        assert!(lo.iter().zip(&hi).all(|(l, h)| l < h));

        let below = fitting_limits(cal, Overdensity::So200c, 0.0, &masses).unwrap();
        let first = fitting_limits(cal, Overdensity::So200c, 0.125, &masses).unwrap();
        assert_eq!(below, first);

        assert!(matches!(
            fitting_limits(cal, Overdensity::So200c, 0.5, &[0.0]),
            Err(SpkError::Domain(_))
        ));
    }

    #[test]
    fn negative_redshift_is_domain_error() {
        let cal = CalibrationTable::standard();
        assert!(matches!(
            model_parameters(cal, Overdensity::So200c, -0.1),
            Err(SpkError::Domain(_))
        ));
    }
}

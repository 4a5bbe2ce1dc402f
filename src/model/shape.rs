//! Shape parameters: a relation summarized near the calibration anchor mass.

use crate::calibration::LimitPolynomials;
use crate::domain::ShapeParameters;
use crate::error::{SpkError, SpkResult};
use crate::math::fit_polynomial;
use crate::relation::BaryonFractionRelation;

/// Half-width of the slope window (dex).
pub const SLOPE_WINDOW_DEX: f64 = 0.5;
const SLOPE_SAMPLES: usize = 11;
/// Gaussian width (dex) of the sample weights.
const SLOPE_WEIGHT_DEX: f64 = 0.25;

/// Amplitude and local log-log slope of `relation` at `anchor_mass`.
///
/// The slope is a weighted linear fit of `log10 f` against `log10 M` over
/// `anchor ± 0.5 dex`. Window samples above the universal fraction (or
/// otherwise unphysical) are left out of the fit and put the shape outside
/// the calibrated region. A relation that vanishes over the window has slope 0.
pub fn shape_parameters(
    relation: &BaryonFractionRelation,
    z: f64,
    anchor_mass: f64,
    limits: &LimitPolynomials,
) -> SpkResult<ShapeParameters> {
    let anchor = relation.evaluate(anchor_mass, z)?;
    if !anchor.value.is_finite() {
        return Err(SpkError::domain(format!(
            "Baryon fraction at the anchor mass M={anchor_mass:.3e} M_sun, z={z} is {}.",
            anchor.value
        )));
    }
    let amplitude = anchor.value;
    let mut physical = anchor.is_physical();

    let log_anchor = anchor_mass.log10();
    let mut dx = Vec::with_capacity(SLOPE_SAMPLES);
    let mut log_f = Vec::with_capacity(SLOPE_SAMPLES);
    let mut weights = Vec::with_capacity(SLOPE_SAMPLES);
    for i in 0..SLOPE_SAMPLES {
        let offset = -SLOPE_WINDOW_DEX + 2.0 * SLOPE_WINDOW_DEX * i as f64 / (SLOPE_SAMPLES - 1) as f64;
        let sample = relation.evaluate(10f64.powf(log_anchor + offset), z)?;
        if !sample.is_physical() {
            physical = false;
            continue;
        }
        if sample.value > 0.0 {
            dx.push(offset);
            log_f.push(sample.value.log10());
            weights.push((-0.5 * (offset / SLOPE_WEIGHT_DEX).powi(2)).exp());
        }
    }

    let slope = if dx.len() < 2 {
        0.0
    } else {
        let coeffs = fit_polynomial(&dx, &log_f, Some(&weights), 1).ok_or_else(|| {
            SpkError::domain(format!(
                "Could not estimate the relation slope at M={anchor_mass:.3e} M_sun, z={z}."
            ))
        })?;
        coeffs[1]
    };

    let (lo, hi) = limits.bounds(anchor_mass);
    Ok(ShapeParameters {
        anchor_mass,
        amplitude,
        slope,
        within_hull: physical && amplitude >= lo && amplitude <= hi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationTable;
    use crate::cosmology::FlatLcdm;
    use crate::domain::Overdensity;
    use crate::relation::{PowerLawParams, RelationSpec, resolve};

    fn relation(a: f64, b: f64, pivot: f64) -> BaryonFractionRelation {
        let spec = RelationSpec::PowerLaw(PowerLawParams::new(a, b).with_pivot(pivot));
        resolve(&spec, Overdensity::So200c, &[0.5], &FlatLcdm::planck18()).unwrap()
    }

    fn limits() -> LimitPolynomials {
        CalibrationTable::standard()
            .block(Overdensity::So200c)
            .unwrap()
            .limits
            .at(0.5)
            .unwrap()
    }

    #[test]
    fn recovers_power_law_amplitude_and_slope() {
        let shape = shape_parameters(&relation(0.5, 0.2, 1e14), 0.5, 1e14, &limits()).unwrap();
        assert!((shape.amplitude - 0.5).abs() < 1e-12);
        assert!((shape.slope - 0.2).abs() < 1e-9, "{}", shape.slope);
        assert!(shape.within_hull);
    }

    #[test]
    fn tiny_fraction_is_outside_hull() {
        let shape = shape_parameters(&relation(1e-6, 0.0, 1.0), 0.5, 1e14, &limits()).unwrap();
        assert!(!shape.within_hull);
        assert!(shape.slope.abs() < 1e-9);
    }

    #[test]
    fn window_above_universal_fraction_is_skipped_not_fatal() {
        // 0.9 (M / 1e14)^0.2 crosses 1 at ~1.7e14, inside the +0.5 dex window.
        let shape = shape_parameters(&relation(0.9, 0.2, 1e14), 0.5, 1e14, &limits()).unwrap();
        assert!((shape.amplitude - 0.9).abs() < 1e-12);
        assert!((shape.slope - 0.2).abs() < 1e-9, "{}", shape.slope);
        assert!(!shape.within_hull);
    }

    #[test]
    fn vanishing_relation_has_zero_slope() {
        let shape = shape_parameters(&relation(0.0, 0.3, 1.0), 0.5, 1e14, &limits()).unwrap();
        assert_eq!(shape.amplitude, 0.0);
        assert_eq!(shape.slope, 0.0);
        assert!(!shape.within_hull);
    }
}

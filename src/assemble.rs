//! Output assembly: resample a native suppression curve onto the requested
//! wavenumber grid.
//!
//! Interpolation happens in `ln k`. Outside the native support the boundary
//! value is held (S saturates toward 1 at low k and toward the calibrated
//! asymptote at high k). Flags on the output follow the native samples that
//! bracket each point; points beyond the calibration ceiling are always
//! flagged.
//!
//! Statistical error bands are optional and attached afterwards from a
//! [`StatErrorTable`] ([`attach_errors`]).

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calibration::{StatErrorTable, WavenumberSupport};
use crate::domain::{CurveInterpolation, ErrorBand, Overdensity, ShapeParameters, Spacing};
use crate::error::{SpkError, SpkResult};
use crate::math::{End, Interpolant, Scheme, lin_space, log_space};
use crate::model::SuppressionCurve;

pub const DEFAULT_K_MIN: f64 = 0.1;
pub const DEFAULT_K_MAX: f64 = 8.0;
pub const DEFAULT_N_K: usize = 100;

/// Requested output grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub k_min: f64,
    pub k_max: f64,
    pub n_k: usize,
    pub spacing: Spacing,
    pub interpolation: CurveInterpolation,
    /// Permit `k_max` above the calibration ceiling (points there are flagged).
    pub allow_beyond_ceiling: bool,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            k_min: DEFAULT_K_MIN,
            k_max: DEFAULT_K_MAX,
            n_k: DEFAULT_N_K,
            spacing: Spacing::Log,
            interpolation: CurveInterpolation::MonotoneCubic,
            allow_beyond_ceiling: false,
        }
    }
}

impl GridSpec {
    /// Check bounds and point count, and the ceiling against `support`.
    pub fn validate(&self, support: &WavenumberSupport) -> SpkResult<()> {
        if !(self.k_min.is_finite() && self.k_max.is_finite()) {
            return Err(SpkError::configuration(format!(
                "k_min and k_max must be finite (got {}, {}).",
                self.k_min, self.k_max
            )));
        }
        if self.k_min <= 0.0 {
            return Err(SpkError::configuration(format!(
                "k_min must be > 0 (got {}).",
                self.k_min
            )));
        }
        if self.k_min >= self.k_max {
            return Err(SpkError::configuration(format!(
                "k_min must be < k_max (got {} >= {}).",
                self.k_min, self.k_max
            )));
        }
        if self.n_k < 2 {
            return Err(SpkError::configuration(format!(
                "n_k must be >= 2 (got {}).",
                self.n_k
            )));
        }
        if self.k_max > support.k_ceiling && !self.allow_beyond_ceiling {
            return Err(SpkError::range(format!(
                "k_max={} h/Mpc exceeds the calibrated ceiling of {} h/Mpc; \
                 set allow_beyond_ceiling to extrapolate.",
                self.k_max, support.k_ceiling
            )));
        }
        Ok(())
    }

    /// The output wavenumbers.
    pub fn wavenumbers(&self) -> SpkResult<Vec<f64>> {
        match self.spacing {
            Spacing::Log => log_space(self.k_min, self.k_max, self.n_k),
            Spacing::Linear => lin_space(self.k_min, self.k_max, self.n_k),
        }
    }
}

/// `(k, S, extrapolated)` on the requested grid for one redshift.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledCurve {
    pub overdensity: Overdensity,
    pub z: f64,
    pub k: Vec<f64>,
    pub sup: Vec<f64>,
    pub extrapolated: Vec<bool>,
    /// Normalized baryon fraction at `M_opt(k)`, interpolated like `sup`.
    pub baryon_fraction: Vec<f64>,
    pub shape: ShapeParameters,
    /// Error bands per point when an error table was supplied.
    pub errors: Option<Vec<Option<ErrorBand>>>,
}

impl AssembledCurve {
    pub fn is_extrapolated(&self) -> bool {
        self.extrapolated.iter().any(|&f| f)
    }
}

/// Resample `curve` onto the grid described by `spec`.
pub fn assemble(
    curve: &SuppressionCurve,
    support: &WavenumberSupport,
    spec: &GridSpec,
) -> SpkResult<AssembledCurve> {
    spec.validate(support)?;
    if spec.k_max > support.k_trusted {
        warn!(
            k_max = spec.k_max,
            k_trusted = support.k_trusted,
            "k_max exceeds the Nyquist wavenumber of the calibration suite; results above it are less reliable"
        );
    }

    let ln_k: Vec<f64> = curve.k.iter().map(|k| k.ln()).collect();
    let scheme = match spec.interpolation {
        CurveInterpolation::MonotoneCubic => Scheme::MonotoneCubic,
        CurveInterpolation::Linear => Scheme::Linear,
    };
    let native = Interpolant::new(scheme, &ln_k, &curve.sup)?;
    if curve.outside_limits.len() != ln_k.len() {
        return Err(SpkError::configuration(
            "Suppression curve flags do not match its wavenumbers.",
        ));
    }
    let fraction = Interpolant::new(Scheme::Linear, &ln_k, &curve.baryon_fraction)?;

    let k = spec.wavenumbers()?;
    let mut sup = Vec::with_capacity(k.len());
    let mut extrapolated = Vec::with_capacity(k.len());
    let mut baryon_fraction = Vec::with_capacity(k.len());
    for &kv in &k {
        let x = kv.ln();
        baryon_fraction.push(fraction.eval(x.clamp(fraction.x_min(), fraction.x_max())));
        let (value, flag) = if x < native.x_min() {
            (native.boundary_value(End::Lower), curve.outside_limits[0])
        } else if x > native.x_max() {
            (native.boundary_value(End::Upper), true)
        } else {
            let i = native.interval(x);
            (
                native.eval(x),
                curve.outside_limits[i] || curve.outside_limits[i + 1],
            )
        };
        sup.push(value);
        extrapolated.push(flag || kv > support.k_ceiling);
    }

    Ok(AssembledCurve {
        overdensity: curve.overdensity,
        z: curve.z,
        k,
        sup,
        extrapolated,
        baryon_fraction,
        shape: curve.shape,
        errors: None,
    })
}

/// Attach error bands from `table`, looked up at `(k, f_b, z)` of each point.
///
/// Points the table does not cover get no band.
pub fn attach_errors(curve: &mut AssembledCurve, table: &StatErrorTable) -> SpkResult<()> {
    if table.overdensity() != curve.overdensity {
        return Err(SpkError::configuration(format!(
            "Error table is for {} but the curve is {}.",
            table.overdensity(),
            curve.overdensity
        )));
    }
    let bands: Vec<Option<ErrorBand>> = curve
        .k
        .iter()
        .zip(&curve.baryon_fraction)
        .map(|(&k, &fb)| table.band(k, fb, curve.z))
        .collect();
    let missing = bands.iter().filter(|b| b.is_none()).count();
    if missing > 0 {
        warn!(
            z = curve.z,
            n_points = missing,
            "error table does not cover every point; those points have no error band"
        );
    }
    curve.errors = Some(bands);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationTable;

    fn support() -> WavenumberSupport {
        *CalibrationTable::standard().support()
    }

    /// Synthetic native curve `S = 1 - 0.1 ln(k / 0.01) / ln(1200)`.
    fn native(outside_from: Option<usize>) -> SuppressionCurve {
        let k = support().native_grid().unwrap();
        let span = (12.0f64 / 0.01).ln();
        let sup: Vec<f64> = k.iter().map(|k| 1.0 - 0.1 * (k / 0.01).ln() / span).collect();
        let outside = (0..k.len())
            .map(|i| outside_from.is_some_and(|from| i >= from))
            .collect();
        SuppressionCurve {
            overdensity: Overdensity::So200c,
            z: 0.5,
            optimal_mass: vec![1e14; k.len()],
            baryon_fraction: vec![0.5; k.len()],
            k,
            sup,
            outside_limits: outside,
            shape: ShapeParameters {
                anchor_mass: 1e14,
                amplitude: 0.5,
                slope: 0.2,
                within_hull: true,
            },
        }
    }

    #[test]
    fn default_grid_spans_requested_bounds() {
        let out = assemble(&native(None), &support(), &GridSpec::default()).unwrap();
        assert_eq!(out.k.len(), 100);
        assert_eq!(out.k[0], 0.1);
        assert_eq!(out.k[99], 8.0);
        assert!(out.k.windows(2).all(|w| w[1] > w[0]));
        assert!(!out.is_extrapolated());
    }

    #[test]
    fn interpolation_is_exact_for_curves_linear_in_ln_k() {
        let span = (12.0f64 / 0.01).ln();
        for interpolation in [CurveInterpolation::MonotoneCubic, CurveInterpolation::Linear] {
            let spec = GridSpec {
                interpolation,
                ..GridSpec::default()
            };
            let out = assemble(&native(None), &support(), &spec).unwrap();
            for (k, s) in out.k.iter().zip(&out.sup) {
                let expected = 1.0 - 0.1 * (k / 0.01).ln() / span;
                assert!((s - expected).abs() < 1e-12, "{interpolation:?} k={k}");
            }
        }
    }

    #[test]
    fn holds_boundary_value_below_native_support() {
        let spec = GridSpec {
            k_min: 1e-3,
            k_max: 1.0,
            n_k: 5,
            ..GridSpec::default()
        };
        let out = assemble(&native(None), &support(), &spec).unwrap();
        assert_eq!(out.sup[0], 1.0);
        assert!(!out.extrapolated[0]);
    }

    #[test]
    fn flags_follow_bracketing_native_samples() {
        let curve = native(Some(200));
        let boundary = curve.k[200];
        let out = assemble(&curve, &support(), &GridSpec::default()).unwrap();
        for (k, flag) in out.k.iter().zip(&out.extrapolated) {
            if *k >= boundary {
                assert!(*flag, "k={k} should be flagged");
            }
            if *k < curve.k[199] {
                assert!(!*flag, "k={k} should not be flagged");
            }
        }
    }

    #[test]
    fn beyond_ceiling_requires_override() {
        let spec = GridSpec {
            k_max: 20.0,
            ..GridSpec::default()
        };
        assert!(matches!(
            assemble(&native(None), &support(), &spec),
            Err(SpkError::Range(_))
        ));

        let spec = GridSpec {
            allow_beyond_ceiling: true,
            ..spec
        };
        let out = assemble(&native(None), &support(), &spec).unwrap();
        for (k, flag) in out.k.iter().zip(&out.extrapolated) {
            assert_eq!(*flag, *k > 12.0, "k={k}");
        }
        assert!((out.sup.last().unwrap() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn baryon_fraction_follows_the_output_grid() {
        let mut curve = native(None);
        curve.baryon_fraction = curve.k.iter().map(|k| 0.5 + 0.01 * (k / 0.01).ln()).collect();
        let spec = GridSpec {
            k_min: 1e-3,
            ..GridSpec::default()
        };
        let out = assemble(&curve, &support(), &spec).unwrap();
        assert_eq!(out.baryon_fraction[0], 0.5);
        let last = out.k.len() - 1;
        let expected = 0.5 + 0.01 * (8.0f64 / 0.01).ln();
        assert!((out.baryon_fraction[last] - expected).abs() < 1e-12);
        assert!(out.errors.is_none());
    }

    #[test]
    fn error_bands_are_looked_up_per_point() {
        use crate::calibration::ErrorRow;

        let mut rows = Vec::new();
        for &z in &[0.0, 1.0] {
            for &fb in &[0.0, 1.0] {
                for &k in &[0.1, 1.0] {
                    let band = ErrorBand {
                        minus_68: -0.01,
                        plus_68: 0.01,
                        minus_95: -0.02,
                        plus_95: 0.02,
                    };
                    rows.push(ErrorRow { k, fb, z, band });
                }
            }
        }
        let table = StatErrorTable::new(Overdensity::So200c, &rows).unwrap();
        let mut out = assemble(&native(None), &support(), &GridSpec::default()).unwrap();
        attach_errors(&mut out, &table).unwrap();

        let errors = out.errors.as_ref().unwrap();
        assert_eq!(errors.len(), out.k.len());
        for (k, band) in out.k.iter().zip(errors) {
            match band {
                Some(b) => {
                    assert!(*k <= 1.0);
                    assert!((b.plus_95 - 0.02).abs() < 1e-12);
                }
                None => assert!(*k > 1.0),
            }
        }

        let other = StatErrorTable::new(Overdensity::So500c, &rows).unwrap();
        assert!(matches!(
            attach_errors(&mut out, &other),
            Err(SpkError::Configuration(_))
        ));
    }

    #[test]
    fn linear_spacing() {
        let spec = GridSpec {
            k_min: 1.0,
            k_max: 5.0,
            n_k: 5,
            spacing: Spacing::Linear,
            ..GridSpec::default()
        };
        let out = assemble(&native(None), &support(), &spec).unwrap();
        assert_eq!(out.k, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn invalid_grids_are_configuration_errors() {
        let bad = [
            GridSpec { k_min: 0.0, ..GridSpec::default() },
            GridSpec { k_min: 9.0, ..GridSpec::default() },
            GridSpec { k_max: f64::NAN, ..GridSpec::default() },
            GridSpec { n_k: 1, ..GridSpec::default() },
        ];
        for spec in bad {
            assert!(
                matches!(spec.validate(&support()), Err(SpkError::Configuration(_))),
                "{spec:?}"
            );
        }
    }
}

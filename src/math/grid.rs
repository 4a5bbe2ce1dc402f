//! Sample grids.
//!
//! Endpoints are written exactly (not recomputed through `exp(ln x)`), so a grid
//! requested on `[0.1, 10]` never reports `10.000000000000002` as its last point.

use crate::error::{SpkError, SpkResult};

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> SpkResult<Vec<f64>> {
    validate_bounds(min, max, steps)?;

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_min + step * i as f64).exp());
    }
    out[0] = min;
    out[steps - 1] = max;
    Ok(out)
}

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn lin_space(min: f64, max: f64, steps: usize) -> SpkResult<Vec<f64>> {
    validate_bounds(min, max, steps)?;

    let step = (max - min) / (steps as f64 - 1.0);
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push(min + step * i as f64);
    }
    out[steps - 1] = max;
    Ok(out)
}

fn validate_bounds(min: f64, max: f64, steps: usize) -> SpkResult<()> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > min) {
        return Err(SpkError::configuration(format!(
            "Invalid grid range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(SpkError::configuration("Grid must have at least 2 points."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_space_includes_endpoints() {
        let v = log_space(0.1, 10.0, 5).unwrap();
        assert_eq!(v[0], 0.1);
        assert_eq!(v[v.len() - 1], 10.0);
        assert!((v[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lin_space_is_evenly_spaced() {
        let v = lin_space(1.0, 3.0, 5).unwrap();
        assert_eq!(v, vec![1.0, 1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn grids_are_strictly_increasing() {
        for v in [log_space(0.01, 12.0, 256).unwrap(), lin_space(0.01, 12.0, 256).unwrap()] {
            assert!(v.windows(2).all(|w| w[1] > w[0]));
        }
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(matches!(log_space(0.0, 1.0, 10), Err(SpkError::Configuration(_))));
        assert!(matches!(log_space(2.0, 1.0, 10), Err(SpkError::Configuration(_))));
        assert!(matches!(lin_space(0.1, 1.0, 1), Err(SpkError::Configuration(_))));
    }
}

//! Read/write curve JSON files.
//!
//! A curve file is the portable form of an assembled curve: SO, redshift,
//! shape parameters and the `(k, S, extrapolated)` grid, stamped with the
//! generation time. Files hold a JSON array with one entry per redshift.
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::assemble::AssembledCurve;
use crate::domain::{CurveFile, CurveGrid};
use crate::error::AppError;

pub const TOOL_NAME: &str = "spk";

impl From<&AssembledCurve> for CurveFile {
    fn from(curve: &AssembledCurve) -> Self {
        CurveFile {
            tool: TOOL_NAME.to_string(),
            generated_at: Utc::now(),
            overdensity: curve.overdensity,
            z: curve.z,
            shape: curve.shape,
            grid: CurveGrid {
                k: curve.k.clone(),
                sup: curve.sup.clone(),
                extrapolated: curve.extrapolated.clone(),
                errors: curve.errors.clone(),
            },
        }
    }
}

/// Write curves to a JSON file.
pub fn write_curve_json(path: &Path, curves: &[AssembledCurve]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    let files: Vec<CurveFile> = curves.iter().map(CurveFile::from).collect();
    serde_json::to_writer_pretty(file, &files)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<Vec<CurveFile>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curves: Vec<CurveFile> =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;
    for curve in &curves {
        let n = curve.grid.k.len();
        let errors_ok = curve.grid.errors.as_ref().is_none_or(|e| e.len() == n);
        if curve.grid.sup.len() != n || curve.grid.extrapolated.len() != n || !errors_ok {
            return Err(AppError::new(
                2,
                format!("Invalid curve JSON: grid columns differ in length at z={}.", curve.z),
            ));
        }
    }
    Ok(curves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorBand, Overdensity, ShapeParameters};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("spk_{name}_{}.json", std::process::id()))
    }

    #[test]
    fn written_file_reads_back() {
        let curve = AssembledCurve {
            overdensity: Overdensity::So200c,
            z: 0.125,
            k: vec![0.1, 1.0, 8.0],
            sup: vec![0.998, 0.93, 0.8],
            extrapolated: vec![false, false, true],
            baryon_fraction: vec![0.5; 3],
            shape: ShapeParameters {
                anchor_mass: 1e14,
                amplitude: 0.6,
                slope: 0.275,
                within_hull: true,
            },
            errors: None,
        };
        let path = temp_path("curve");
        write_curve_json(&path, std::slice::from_ref(&curve)).unwrap();
        let files = read_curve_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(files.len(), 1);
        let file = &files[0];
        assert_eq!(file.tool, TOOL_NAME);
        assert_eq!(file.overdensity, Overdensity::So200c);
        assert_eq!(file.grid.extrapolated, curve.extrapolated);
        assert_eq!(file.shape.within_hull, true);
        assert!(file.grid.errors.is_none());
        for (a, b) in file.grid.sup.iter().zip(&curve.sup) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn error_bands_survive_the_round_trip() {
        let band = ErrorBand {
            minus_68: -0.01,
            plus_68: 0.01,
            minus_95: -0.02,
            plus_95: 0.025,
        };
        let curve = AssembledCurve {
            overdensity: Overdensity::So500c,
            z: 1.0,
            k: vec![0.1, 1.0],
            sup: vec![0.99, 0.9],
            extrapolated: vec![false, false],
            baryon_fraction: vec![0.4, 0.3],
            shape: ShapeParameters {
                anchor_mass: 7e13,
                amplitude: 0.4,
                slope: 0.3,
                within_hull: true,
            },
            errors: Some(vec![Some(band), None]),
        };
        let path = temp_path("curve_errors");
        write_curve_json(&path, std::slice::from_ref(&curve)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let files = read_curve_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert!(text.contains("null"));
        assert_eq!(files[0].grid.errors, Some(vec![Some(band), None]));
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        let path = temp_path("bad_curve");
        let json = r#"[{"tool":"spk","generated_at":"2024-01-01T00:00:00Z","overdensity":"500c","z":0.5,
            "shape":{"anchor_mass":7e13,"amplitude":0.5,"slope":0.2,"within_hull":true},
            "grid":{"k":[0.1,1.0],"sup":[0.99],"extrapolated":[false,false]}}]"#;
        std::fs::write(&path, json).unwrap();
        let err = read_curve_json(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert_eq!(err.exit_code(), 2);
    }
}

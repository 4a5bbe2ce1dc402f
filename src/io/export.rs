//! Export assembled curves to CSV.
//!
//! One row per `(z, k)` point, long format, easy to load in spreadsheets or
//! dataframes: `z,so,k,sup,extrapolated` followed by the four error-band
//! columns, left empty when no band is available.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::assemble::AssembledCurve;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    z: f64,
    so: &'a str,
    k: f64,
    sup: f64,
    extrapolated: bool,
    err_68_m: Option<f64>,
    err_68_p: Option<f64>,
    err_95_m: Option<f64>,
    err_95_p: Option<f64>,
}

/// Write curves to a CSV file.
pub fn write_results_csv(path: &Path, curves: &[AssembledCurve]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(file, curves)
}

/// Write curves as CSV to any sink.
pub fn write_results(sink: impl Write, curves: &[AssembledCurve]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);
    for curve in curves {
        let so = curve.overdensity.to_string();
        for i in 0..curve.k.len() {
            let band = curve.errors.as_ref().and_then(|e| e.get(i).copied().flatten());
            writer
                .serialize(ExportRow {
                    z: curve.z,
                    so: &so,
                    k: curve.k[i],
                    sup: curve.sup[i],
                    extrapolated: curve.extrapolated[i],
                    err_68_m: band.map(|b| b.minus_68),
                    err_68_p: band.map(|b| b.plus_68),
                    err_95_m: band.map(|b| b.minus_95),
                    err_95_p: band.map(|b| b.plus_95),
                })
                .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
        }
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))?;
    Ok(())
}

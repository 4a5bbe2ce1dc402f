//! Statistical error table ingest (CSV).
//!
//! One header row, then one row per grid node with positional columns:
//! `k, fb, z, <ignored>, err_68_m, err_68_p, err_95_m, err_95_p`.
//! Unlike binned relations, a bad row fails the whole load: a partial grid
//! cannot be interpolated.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::calibration::{ErrorRow, StatErrorTable};
use crate::domain::{ErrorBand, Overdensity};
use crate::error::AppError;

const MIN_COLUMNS: usize = 8;

/// Load the error table for `overdensity` from a CSV file.
pub fn load_stat_errors(path: &Path, overdensity: Overdensity) -> Result<StatErrorTable, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open error table CSV '{}': {e}", path.display()),
        )
    })?;
    read_stat_errors(file, overdensity)
}

/// Read an error table from any CSV source.
pub fn read_stat_errors(source: impl Read, overdensity: Overdensity) -> Result<StatErrorTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("Error table line {line}: {e}")))?;
        if record.len() < MIN_COLUMNS {
            return Err(AppError::new(
                2,
                format!(
                    "Error table line {line}: expected {MIN_COLUMNS} columns, found {}.",
                    record.len()
                ),
            ));
        }
        let field = |i: usize| -> Result<f64, AppError> {
            let s = record.get(i).unwrap_or_default();
            s.parse::<f64>().map_err(|_| {
                AppError::new(
                    2,
                    format!("Error table line {line}: invalid number '{s}' in column {}.", i + 1),
                )
            })
        };
        rows.push(ErrorRow {
            k: field(0)?,
            fb: field(1)?,
            z: field(2)?,
            band: ErrorBand {
                minus_68: field(4)?,
                plus_68: field(5)?,
                minus_95: field(6)?,
                plus_95: field(7)?,
            },
        });
    }

    if rows.is_empty() {
        return Err(AppError::new(2, "Error table CSV has no rows."));
    }
    Ok(StatErrorTable::new(overdensity, &rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_csv() -> String {
        let mut out = String::from("k,fb,z,sup,e68m,e68p,e95m,e95p\n");
        for k in [0.1, 1.0] {
            for fb in [0.1, 0.9] {
                for z in [0.0, 2.0] {
                    out.push_str(&format!("{k},{fb},{z},0.9,-0.01,0.01,-0.02,0.02\n"));
                }
            }
        }
        out
    }

    #[test]
    fn reads_a_full_grid() {
        let table = read_stat_errors(grid_csv().as_bytes(), Overdensity::So500c).unwrap();
        assert_eq!(table.overdensity(), Overdensity::So500c);
        let band = table.band(0.5, 0.5, 1.0).unwrap();
        assert!((band.plus_68 - 0.01).abs() < 1e-12);
        assert!((band.minus_95 + 0.02).abs() < 1e-12);
    }

    #[test]
    fn bad_rows_fail_the_load() {
        let short = "k,fb,z,sup,e68m,e68p,e95m,e95p\n0.1,0.5,0.0,0.9,-0.01\n";
        assert_eq!(
            read_stat_errors(short.as_bytes(), Overdensity::So200c)
                .unwrap_err()
                .exit_code(),
            2
        );

        let text = grid_csv().replacen("-0.01", "abc", 1);
        let err = read_stat_errors(text.as_bytes(), Overdensity::So200c).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn incomplete_grid_is_a_configuration_error() {
        let text: String = grid_csv().lines().take(5).map(|l| format!("{l}\n")).collect();
        let err = read_stat_errors(text.as_bytes(), Overdensity::So200c).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

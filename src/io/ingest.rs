//! CSV ingest for binned baryon-fraction relations.
//!
//! Expected layout: a header row, then one row per mass bin with a halo mass
//! column, a baryon-fraction column and (optionally) a redshift column. Rows
//! sharing a redshift form one table; tables keep the order in which their
//! redshift first appears, and rows keep file order so that unsorted bins are
//! reported by the relation resolver rather than silently fixed here.
//!
//! Malformed rows are skipped and reported with their line number.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::AppError;

/// Column names used to read a binned relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinnedColumns {
    pub mass: String,
    pub fraction: String,
    pub redshift: String,
}

impl Default for BinnedColumns {
    fn default() -> Self {
        Self {
            mass: "m_halo".to_string(),
            fraction: "fb".to_string(),
            redshift: "z".to_string(),
        }
    }
}

/// Bins for one redshift (`None` when the file has no redshift column).
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedTable {
    pub z: Option<f64>,
    pub m_halo: Vec<f64>,
    pub fb: Vec<f64>,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestedBins {
    pub tables: Vec<BinnedTable>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl IngestedBins {
    /// True when the file carried a redshift column.
    pub fn has_redshifts(&self) -> bool {
        self.tables.iter().any(|t| t.z.is_some())
    }
}

/// Load a binned relation from a CSV file.
pub fn load_binned_csv(path: &Path, columns: &BinnedColumns) -> Result<IngestedBins, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_binned_csv(file, columns)
}

/// Read a binned relation from any CSV source.
pub fn read_binned_csv(source: impl Read, columns: &BinnedColumns) -> Result<IngestedBins, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let mass_col = normalize_header_name(&columns.mass);
    let fraction_col = normalize_header_name(&columns.fraction);
    let redshift_col = normalize_header_name(&columns.redshift);
    for name in [&mass_col, &fraction_col] {
        if !header_map.contains_key(name) {
            return Err(AppError::new(2, format!("Missing required column: `{name}`")));
        }
    }
    let has_z = header_map.contains_key(&redshift_col);

    let mut tables: Vec<BinnedTable> = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_used = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = (|| -> Result<(Option<f64>, f64, f64), String> {
            let mass = parse_f64(get_required(&record, &header_map, &mass_col)?, &mass_col)?;
            let fraction = parse_f64(get_required(&record, &header_map, &fraction_col)?, &fraction_col)?;
            let z = if has_z {
                Some(parse_f64(get_required(&record, &header_map, &redshift_col)?, &redshift_col)?)
            } else {
                None
            };
            Ok((z, mass, fraction))
        })();

        match parsed {
            Ok((z, mass, fraction)) => {
                let table = match tables.iter().position(|t| t.z == z) {
                    Some(i) => &mut tables[i],
                    None => {
                        tables.push(BinnedTable {
                            z,
                            m_halo: Vec::new(),
                            fb: Vec::new(),
                        });
                        let last = tables.len() - 1;
                        &mut tables[last]
                    }
                };
                table.m_halo.push(mass);
                table.fb.push(fraction);
                rows_used += 1;
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if rows_used == 0 {
        return Err(AppError::new(2, "No valid rows found in binned CSV."));
    }

    Ok(IngestedBins {
        tables,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .map_err(|_| format!("Invalid number '{s}' in column `{name}`"))
}

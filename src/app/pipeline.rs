//! Shared run logic for the suppression subcommands.
//!
//! Keeping this in one place avoids duplicating the workflow:
//! calibration + cosmology -> request(s) -> compute_suppression -> curves
//!
//! The command handlers can then focus on presentation (printing/exporting).

use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

use tracing::{debug, info};

use crate::assemble::AssembledCurve;
use crate::calibration::CalibrationTable;
use crate::cosmology::FlatLcdm;
use crate::domain::{BinnedInterpolation, Extrapolation, RunConfig};
use crate::error::{AppError, SpkError};
use crate::io::ingest::IngestedBins;
use crate::io::errors::load_stat_errors;
use crate::pipeline::{SuppressionRequest, compute_suppression, compute_suppression_with_errors};
use crate::relation::{BinnedParams, RelationSpec};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub mode: &'static str,
    pub curves: Vec<AssembledCurve>,
}

/// The standard calibration, or the table stored at `path`.
pub fn load_calibration(path: Option<&Path>) -> Result<Cow<'static, CalibrationTable>, AppError> {
    let Some(path) = path else {
        return Ok(Cow::Borrowed(CalibrationTable::standard()));
    };
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open calibration JSON '{}': {e}", path.display()),
        )
    })?;
    let table = CalibrationTable::from_json_reader(file)?;
    info!(path = %path.display(), "loaded calibration override");
    Ok(Cow::Owned(table))
}

pub fn cosmology_from_config(config: &RunConfig) -> Result<FlatLcdm, AppError> {
    FlatLcdm::new(config.h0, config.omega_m, config.omega_b)
        .map_err(|e| AppError::from(SpkError::from(e)))
}

/// Run one relation over every configured redshift.
pub fn run_suppression(config: &RunConfig, relation: RelationSpec) -> Result<RunOutput, AppError> {
    let calibration = load_calibration(config.calibration_path.as_deref())?;
    let cosmology = cosmology_from_config(config)?;

    let mode = relation.mode_name();
    let request = SuppressionRequest {
        overdensity: config.overdensity,
        redshifts: config.redshifts.clone(),
        relation,
        grid: config.grid,
    };
    let result = match &config.stat_errors_path {
        Some(path) => {
            let errors = load_stat_errors(path, config.overdensity)?;
            compute_suppression_with_errors(&request, &calibration, &cosmology, &errors)?
        }
        None => compute_suppression(&request, &calibration, &cosmology)?,
    };
    Ok(RunOutput {
        mode,
        curves: result.curves,
    })
}

/// Run binned tables read from CSV.
///
/// With a redshift column each table is applied at its own redshift (and
/// `config.redshifts` must be empty); otherwise the single table is applied at
/// every configured redshift.
pub fn run_binned(
    config: &RunConfig,
    bins: &IngestedBins,
    interpolation: BinnedInterpolation,
    extrapolation: Extrapolation,
) -> Result<RunOutput, AppError> {
    let spec_for = |m_halo: &[f64], fb: &[f64]| {
        RelationSpec::Binned(
            BinnedParams::new(m_halo.to_vec(), fb.to_vec())
                .with_interpolation(interpolation)
                .with_extrapolation(extrapolation),
        )
    };

    if !bins.has_redshifts() {
        let table = bins
            .tables
            .first()
            .ok_or_else(|| AppError::new(2, "Binned CSV contains no tables."))?;
        return run_suppression(config, spec_for(&table.m_halo, &table.fb));
    }

    if !config.redshifts.is_empty() {
        return Err(AppError::new(
            2,
            "The binned CSV has a redshift column; drop `-z` or remove the column.",
        ));
    }

    let mut curves = Vec::with_capacity(bins.tables.len());
    for table in &bins.tables {
        let Some(z) = table.z else { continue };
        debug!(z, n_bins = table.m_halo.len(), "running binned table");
        let per_z = RunConfig {
            redshifts: vec![z],
            ..config.clone()
        };
        let out = run_suppression(&per_z, spec_for(&table.m_halo, &table.fb))?;
        curves.extend(out.curves);
    }

    Ok(RunOutput {
        mode: "binned",
        curves,
    })
}

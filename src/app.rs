//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the log subscriber
//! - parses CLI arguments
//! - resolves the relation and computes the suppression curves
//! - prints reports/plots
//! - writes optional exports

use std::io::IsTerminal;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::assemble::GridSpec;
use crate::cli::{
    BinnedArgs, Command, CosmologyArgs, GridArgs, LimitsArgs, OptimalMassArgs, OutputArgs,
    PlotArgs, PowerLawArgs, RedshiftPowerLawArgs,
};
use crate::domain::{CurveInterpolation, Extrapolation, Overdensity, RunConfig, Spacing};
use crate::error::AppError;
use crate::io::ingest::BinnedColumns;
use crate::relation::{PerRedshift, PowerLawParams, RedshiftPowerLawParams, RelationSpec};

pub mod pipeline;

/// Environment variable holding the log filter (falls back to `RUST_LOG`).
pub const LOG_ENV: &str = "SPK_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";
const TABLE_ROWS: usize = 25;

/// Entry point for the `spk` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::PowerLaw(args) => handle_power_law(args),
        Command::RedshiftPowerLaw(args) => handle_redshift_power_law(args),
        Command::Binned(args) => handle_binned(args),
        Command::OptimalMass(args) => handle_optimal_mass(args),
        Command::Limits(args) => handle_limits(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn init_tracing() {
    let directive = log_filter_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Pick the filter directive: `SPK_LOG`, then `RUST_LOG`, then `warn`.
fn log_filter_directive(spk_log: Option<String>, rust_log: Option<String>) -> String {
    [spk_log, rust_log]
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn handle_power_law(args: PowerLawArgs) -> Result<(), AppError> {
    let config = run_config_from_args(
        args.so,
        args.redshifts.clone(),
        args.calibration.clone(),
        &args.grid,
        &args.cosmology,
        &args.output,
    );
    let params = PowerLawParams {
        fb_a: per_redshift(args.fb_a),
        fb_pow: per_redshift(args.fb_pow),
        fb_pivot: args.fb_pivot,
    };
    let run = pipeline::run_suppression(&config, RelationSpec::PowerLaw(params))?;
    present(&config, &run)
}

fn handle_redshift_power_law(args: RedshiftPowerLawArgs) -> Result<(), AppError> {
    let config = run_config_from_args(
        args.so,
        args.redshifts.clone(),
        args.calibration.clone(),
        &args.grid,
        &args.cosmology,
        &args.output,
    );
    let params = RedshiftPowerLawParams::new(args.alpha, args.beta, args.gamma);
    let run = pipeline::run_suppression(&config, RelationSpec::RedshiftPowerLaw(params))?;
    present(&config, &run)
}

fn handle_binned(args: BinnedArgs) -> Result<(), AppError> {
    let config = run_config_from_args(
        args.so,
        args.redshifts.clone(),
        args.calibration.clone(),
        &args.grid,
        &args.cosmology,
        &args.output,
    );
    let columns = BinnedColumns {
        mass: args.mass_column.clone(),
        fraction: args.fraction_column.clone(),
        redshift: args.redshift_column.clone(),
    };
    let bins = crate::io::ingest::load_binned_csv(&args.csv, &columns)?;
    for row in &bins.row_errors {
        warn!(line = row.line, "skipped row: {}", row.message);
    }

    let extrapolation = if args.flat_extrapolation {
        Extrapolation::Flat
    } else {
        Extrapolation::BoundarySlope
    };
    let run = pipeline::run_binned(&config, &bins, args.interpolation, extrapolation)?;
    present(&config, &run)
}

fn handle_optimal_mass(args: OptimalMassArgs) -> Result<(), AppError> {
    let calibration = pipeline::load_calibration(args.calibration.as_deref())?;
    crate::pipeline::validate_redshifts(&args.redshifts, calibration.support())?;

    let grid = grid_spec_from_args(&args.grid);
    grid.validate(calibration.support())?;
    let k = grid.wavenumbers()?;

    for &z in &args.redshifts {
        let masses = crate::model::optimal_mass(&calibration, args.so, z, &k)?;
        println!(
            "{}",
            crate::report::format_optimal_mass(args.so, z, &k, &masses)
        );
    }
    Ok(())
}

fn handle_limits(args: LimitsArgs) -> Result<(), AppError> {
    let calibration = pipeline::load_calibration(args.calibration.as_deref())?;
    crate::pipeline::validate_redshifts(&args.redshifts, calibration.support())?;

    for &z in &args.redshifts {
        let (min, max) = crate::model::fitting_limits(&calibration, args.so, z, &args.masses)?;
        println!(
            "{}",
            crate::report::format_limits(args.so, z, &args.masses, &min, &max)
        );
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curves = crate::io::curve::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_curve_files(&curves, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn present(config: &RunConfig, run: &pipeline::RunOutput) -> Result<(), AppError> {
    println!(
        "{}",
        crate::report::format_run_summary(run.mode, config, &run.curves)
    );
    println!(
        "{}",
        crate::report::format_suppression_table(&run.curves, TABLE_ROWS)
    );

    if config.plot {
        let plot =
            crate::plot::render_suppression_plot(&run.curves, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.curves)?;
    }
    if let Some(path) = &config.export_curve {
        crate::io::curve::write_curve_json(path, &run.curves)?;
    }

    Ok(())
}

pub fn grid_spec_from_args(args: &GridArgs) -> GridSpec {
    GridSpec {
        k_min: args.k_min,
        k_max: args.k_max,
        n_k: args.n_k,
        spacing: if args.linear {
            Spacing::Linear
        } else {
            Spacing::Log
        },
        interpolation: if args.linear_interpolation {
            CurveInterpolation::Linear
        } else {
            CurveInterpolation::MonotoneCubic
        },
        allow_beyond_ceiling: args.allow_beyond_ceiling,
    }
}

pub fn run_config_from_args(
    overdensity: Overdensity,
    redshifts: Vec<f64>,
    calibration_path: Option<std::path::PathBuf>,
    grid: &GridArgs,
    cosmology: &CosmologyArgs,
    output: &OutputArgs,
) -> RunConfig {
    RunConfig {
        overdensity,
        redshifts,
        grid: grid_spec_from_args(grid),
        h0: cosmology.h0,
        omega_m: cosmology.omega_m,
        omega_b: cosmology.omega_b,
        calibration_path,
        stat_errors_path: output.stat_errors.clone(),
        plot: !output.no_plot,
        plot_width: output.width,
        plot_height: output.height,
        export_results: output.export.clone(),
        export_curve: output.export_curve.clone(),
    }
}

/// Empty flag lists mean "not given".
fn per_redshift(values: Vec<f64>) -> Option<PerRedshift> {
    if values.is_empty() {
        None
    } else {
        Some(PerRedshift::from(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn parse(argv: &[&str]) -> Command {
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn power_law_flags_map_to_run_config() {
        let Command::PowerLaw(args) = parse(&[
            "spk", "power-law", "-z", "0.5", "--fb-a", "0.1", "--fb-pow", "0.2", "--k-min", "0.05",
            "--linear", "--no-plot", "--export", "out.csv",
        ]) else {
            panic!("expected power-law");
        };
        let config = run_config_from_args(
            args.so,
            args.redshifts.clone(),
            None,
            &args.grid,
            &args.cosmology,
            &args.output,
        );
        assert_eq!(config.overdensity, Overdensity::So200c);
        assert_eq!(config.redshifts, vec![0.5]);
        assert_eq!(config.grid.k_min, 0.05);
        assert_eq!(config.grid.spacing, Spacing::Linear);
        assert_eq!(config.grid.interpolation, CurveInterpolation::MonotoneCubic);
        assert!(!config.plot);
        assert_eq!(config.export_results.as_deref(), Some(std::path::Path::new("out.csv")));
        assert_eq!(per_redshift(args.fb_a), Some(PerRedshift::Scalar(0.1)));
    }

    #[test]
    fn missing_power_law_parameter_is_none() {
        assert_eq!(per_redshift(Vec::new()), None);
        assert_eq!(
            per_redshift(vec![0.1, 0.2]),
            Some(PerRedshift::Sequence(vec![0.1, 0.2]))
        );
    }

    #[test]
    fn log_filter_prefers_spk_log() {
        assert_eq!(
            log_filter_directive(Some("debug".into()), Some("info".into())),
            "debug"
        );
        assert_eq!(log_filter_directive(None, Some("info".into())), "info");
        assert_eq!(log_filter_directive(Some("  ".into()), None), "warn");
        assert_eq!(log_filter_directive(None, None), "warn");
    }
}

//! Command-line parsing for the `spk` suppression calculator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::cosmology::{PLANCK18_H0, PLANCK18_OMEGA_B, PLANCK18_OMEGA_M};
use crate::domain::{BinnedInterpolation, Overdensity};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "spk",
    version,
    about = "Baryonic suppression of the matter power spectrum from the baryon fraction - halo mass relation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Suppression for a power law `f_b = a (M / pivot)^b`.
    PowerLaw(PowerLawArgs),
    /// Suppression for the redshift-dependent power law in M500c.
    RedshiftPowerLaw(RedshiftPowerLawArgs),
    /// Suppression for a tabulated relation read from CSV.
    Binned(BinnedArgs),
    /// Print the optimal halo mass M_opt(k).
    OptimalMass(OptimalMassArgs),
    /// Print the fitting limits of the calibration suite.
    Limits(LimitsArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
}

/// Output wavenumber grid.
#[derive(Debug, Args, Clone)]
pub struct GridArgs {
    /// Smallest output wavenumber (h/Mpc).
    #[arg(long, default_value_t = 0.1)]
    pub k_min: f64,

    /// Largest output wavenumber (h/Mpc).
    #[arg(long, default_value_t = 8.0)]
    pub k_max: f64,

    /// Number of output wavenumbers.
    #[arg(long, default_value_t = 100)]
    pub n_k: usize,

    /// Linear instead of logarithmic spacing.
    #[arg(long)]
    pub linear: bool,

    /// Allow k_max above the calibration ceiling (those points are flagged).
    #[arg(long)]
    pub allow_beyond_ceiling: bool,

    /// Interpolate the native curve linearly instead of with a monotone cubic.
    #[arg(long)]
    pub linear_interpolation: bool,
}

/// Background cosmology (flat ΛCDM; Planck 2018 by default).
#[derive(Debug, Args, Clone)]
pub struct CosmologyArgs {
    /// Hubble constant (km/s/Mpc).
    #[arg(long, default_value_t = PLANCK18_H0)]
    pub h0: f64,

    /// Matter density parameter.
    #[arg(long, default_value_t = PLANCK18_OMEGA_M)]
    pub omega_m: f64,

    /// Baryon density parameter.
    #[arg(long, default_value_t = PLANCK18_OMEGA_B)]
    pub omega_b: f64,
}

/// Terminal output and exports.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export curves to CSV (`z,so,k,sup,extrapolated`).
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export curves (with shape parameters) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,

    /// Attach 68%/95% statistical error bands from a table
    /// (`k,fb,z,_,err_68_m,err_68_p,err_95_m,err_95_p`) for the chosen SO.
    #[arg(long = "stat-errors", value_name = "CSV")]
    pub stat_errors: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PowerLawArgs {
    /// Spherical overdensity of the halo masses (200 or 500).
    #[arg(long, value_enum, default_value = "200")]
    pub so: Overdensity,

    /// Redshift(s); repeat for several.
    #[arg(short = 'z', long = "redshift", required = true, allow_negative_numbers = true)]
    pub redshifts: Vec<f64>,

    /// Normalization; one value, or one per redshift.
    #[arg(long = "fb-a", allow_negative_numbers = true)]
    pub fb_a: Vec<f64>,

    /// Power-law index; one value, or one per redshift.
    #[arg(long = "fb-pow", allow_negative_numbers = true)]
    pub fb_pow: Vec<f64>,

    /// Pivot mass (M_sun).
    #[arg(long = "fb-pivot", default_value_t = 1.0, allow_negative_numbers = true)]
    pub fb_pivot: f64,

    /// Calibration table override (JSON).
    #[arg(long, value_name = "JSON")]
    pub calibration: Option<PathBuf>,

    #[command(flatten)]
    pub grid: GridArgs,

    #[command(flatten)]
    pub cosmology: CosmologyArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RedshiftPowerLawArgs {
    /// Spherical overdensity; only 500 is supported by this relation.
    #[arg(long, value_enum, default_value = "500")]
    pub so: Overdensity,

    #[arg(short = 'z', long = "redshift", required = true, allow_negative_numbers = true)]
    pub redshifts: Vec<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub alpha: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub beta: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub gamma: f64,

    #[arg(long, value_name = "JSON")]
    pub calibration: Option<PathBuf>,

    #[command(flatten)]
    pub grid: GridArgs,

    #[command(flatten)]
    pub cosmology: CosmologyArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct BinnedArgs {
    #[arg(long, value_enum, default_value = "200")]
    pub so: Overdensity,

    /// CSV with halo masses, baryon fractions and an optional redshift column.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// Redshift(s) to apply a single table to (when the CSV has no redshift column).
    #[arg(short = 'z', long = "redshift", allow_negative_numbers = true)]
    pub redshifts: Vec<f64>,

    #[arg(long, default_value = "m_halo")]
    pub mass_column: String,

    #[arg(long, default_value = "fb")]
    pub fraction_column: String,

    #[arg(long, default_value = "z")]
    pub redshift_column: String,

    /// Interpolation between bins (in log-log space).
    #[arg(long, value_enum, default_value_t = BinnedInterpolation::LogLinear)]
    pub interpolation: BinnedInterpolation,

    /// Hold the boundary value outside the bins instead of following the boundary slope.
    #[arg(long)]
    pub flat_extrapolation: bool,

    #[arg(long, value_name = "JSON")]
    pub calibration: Option<PathBuf>,

    #[command(flatten)]
    pub grid: GridArgs,

    #[command(flatten)]
    pub cosmology: CosmologyArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct OptimalMassArgs {
    #[arg(long, value_enum, default_value = "200")]
    pub so: Overdensity,

    #[arg(short = 'z', long = "redshift", required = true, allow_negative_numbers = true)]
    pub redshifts: Vec<f64>,

    #[arg(long, value_name = "JSON")]
    pub calibration: Option<PathBuf>,

    #[command(flatten)]
    pub grid: GridArgs,
}

#[derive(Debug, Args, Clone)]
pub struct LimitsArgs {
    #[arg(long, value_enum, default_value = "200")]
    pub so: Overdensity,

    #[arg(short = 'z', long = "redshift", required = true, allow_negative_numbers = true)]
    pub redshifts: Vec<f64>,

    /// Halo mass(es) in M_sun; repeat for several.
    #[arg(long = "mass", required = true, allow_negative_numbers = true)]
    pub masses: Vec<f64>,

    #[arg(long, value_name = "JSON")]
    pub calibration: Option<PathBuf>,
}

/// Options for plotting a saved curve.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Curve JSON file produced by `--export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_power_law_with_repeated_redshifts() {
        let cli = Cli::try_parse_from([
            "spk", "power-law", "-z", "0.125", "-z", "1", "--fb-a", "8.44e-5", "--fb-pow", "0.275",
            "--k-max", "10",
        ])
        .unwrap();
        let Command::PowerLaw(args) = cli.command else {
            panic!("expected power-law");
        };
        assert_eq!(args.so, Overdensity::So200c);
        assert_eq!(args.redshifts, vec![0.125, 1.0]);
        assert_eq!(args.fb_a, vec![8.44e-5]);
        assert_eq!(args.grid.k_max, 10.0);
        assert_eq!(args.cosmology.omega_m, PLANCK18_OMEGA_M);
    }

    #[test]
    fn parses_negative_exponents_and_so() {
        let cli = Cli::try_parse_from([
            "spk", "redshift-power-law", "-z", "0.3", "--alpha", "4.189", "--beta", "1.273",
            "--gamma", "-0.1",
        ])
        .unwrap();
        let Command::RedshiftPowerLaw(args) = cli.command else {
            panic!("expected redshift-power-law");
        };
        assert_eq!(args.so, Overdensity::So500c);
        assert_eq!(args.gamma, -0.1);
    }

    #[test]
    fn rejects_unknown_overdensity() {
        assert!(Cli::try_parse_from(["spk", "limits", "--so", "300", "-z", "0.5", "--mass", "1e14"]).is_err());
    }
}

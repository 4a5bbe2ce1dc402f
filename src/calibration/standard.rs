//! Standard calibration constants.
//!
//! These values are illustrative. They reproduce the structure of the
//! published simulation fit (quadratic redshift dependence, the optimal-mass
//! and fitting-function shapes, fitting limits on the simulation redshift
//! outputs) with rounded, hand-set numbers, and give suppression curves of
//! the right size. They are not the fitted coefficients. For physical
//! results, load the published table with `--calibration <JSON>` or
//! [`CalibrationTable::from_json_reader`].
//!
//! Coefficients are `[c0, c1, c2]` of `c0 + c1 (1+z) + c2 (1+z)^2`. The
//! fitting limits are tabulated on the redshift outputs of the simulation
//! suite. Masses are in M_sun, wavenumbers in h/Mpc.

use super::{
    CalibrationTable, FitCoefficients, FittingLimits, OverdensityCalibration, Quadratic,
    WavenumberSupport,
};
use crate::domain::Overdensity;

pub const K_NATIVE_MIN: f64 = 0.01;
pub const K_TRUSTED: f64 = 8.0;
pub const K_CEILING: f64 = 12.0;
pub const N_NATIVE: usize = 256;
pub const Z_MIN_TRUSTED: f64 = 0.125;
pub const Z_MAX: f64 = 3.0;

pub const ANCHOR_MASS_200C: f64 = 1.0e14;
pub const ANCHOR_MASS_500C: f64 = 7.0e13;

const LIMIT_Z_NODES: [f64; 9] = [0.125, 0.25, 0.375, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0];

const MAX_X0: [f64; 9] = [0.0205, 0.021, 0.0215, 0.022, 0.023, 0.024, 0.026, 0.028, 0.032];

// λ, μ and the ν width/centre are shared between overdensities; the optimal
// mass scale and the ν amplitude are not.
const LAMBDA_A: Quadratic = Quadratic([0.008, 0.004, -0.0005]);
const LAMBDA_B: Quadratic = Quadratic([1.40, 0.10, -0.01]);
const MU_A: Quadratic = Quadratic([0.55, 0.06, -0.008]);
const MU_B: Quadratic = Quadratic([3.10, -0.25, 0.03]);
const MU_C: Quadratic = Quadratic([-0.55, 0.12, -0.01]);
const NU_B: Quadratic = Quadratic([0.75, 0.05, -0.01]);
const NU_C: Quadratic = Quadratic([0.95, -0.06, 0.008]);
const GAMMA: Quadratic = Quadratic([0.30, 0.015, -0.002]);

fn fit_200c() -> FitCoefficients {
    FitCoefficients {
        alpha: Quadratic([15.05, -0.38, 0.021]),
        beta: Quadratic([13.62, -0.33, 0.018]),
        gamma: GAMMA,
        lambda_a: LAMBDA_A,
        lambda_b: LAMBDA_B,
        mu_a: MU_A,
        mu_b: MU_B,
        mu_c: MU_C,
        nu_a: Quadratic([3.40, -0.55, 0.06]),
        nu_b: NU_B,
        nu_c: NU_C,
    }
}

fn fit_500c() -> FitCoefficients {
    FitCoefficients {
        alpha: Quadratic([14.85, -0.38, 0.021]),
        beta: Quadratic([13.42, -0.33, 0.018]),
        gamma: GAMMA,
        lambda_a: LAMBDA_A,
        lambda_b: LAMBDA_B,
        mu_a: MU_A,
        mu_b: MU_B,
        mu_c: MU_C,
        nu_a: Quadratic([3.10, -0.50, 0.055]),
        nu_b: NU_B,
        nu_c: NU_C,
    }
}

fn limits_200c() -> FittingLimits {
    FittingLimits {
        z: LIMIT_Z_NODES.to_vec(),
        min_x0: vec![
            -10.056406, -10.063125, -10.070156, -10.0775, -10.093125, -10.11, -10.1475, -10.19,
            -10.29,
        ],
        min_x1: vec![1.0; 9],
        min_x2: vec![-0.025; 9],
        max_x0: MAX_X0.to_vec(),
        max_x1: vec![0.0; 9],
        max_x2: vec![0.0; 9],
    }
}

fn limits_500c() -> FittingLimits {
    FittingLimits {
        z: LIMIT_Z_NODES.to_vec(),
        min_x0: vec![
            -9.902007, -9.908726, -9.915757, -9.923101, -9.938726, -9.955601, -9.993101,
            -10.035601, -10.135601,
        ],
        min_x1: vec![0.99225; 9],
        min_x2: vec![-0.025; 9],
        max_x0: MAX_X0.to_vec(),
        max_x1: vec![0.0; 9],
        max_x2: vec![0.0; 9],
    }
}

pub fn support() -> WavenumberSupport {
    WavenumberSupport {
        k_min: K_NATIVE_MIN,
        k_trusted: K_TRUSTED,
        k_ceiling: K_CEILING,
        n_native: N_NATIVE,
        z_min_trusted: Z_MIN_TRUSTED,
        z_max: Z_MAX,
    }
}

/// The standard table (both overdensities).
pub fn table() -> CalibrationTable {
    CalibrationTable {
        blocks: vec![
            OverdensityCalibration {
                overdensity: Overdensity::So200c,
                anchor_mass: ANCHOR_MASS_200C,
                fit: fit_200c(),
                limits: limits_200c(),
            },
            OverdensityCalibration {
                overdensity: Overdensity::So500c,
                anchor_mass: ANCHOR_MASS_500C,
                fit: fit_500c(),
                limits: limits_500c(),
            },
        ],
        support: support(),
    }
}

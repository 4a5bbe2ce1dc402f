//! Tabulated relation interpolated in `(log10 M, log10 f)`.

use tracing::debug;

use super::FractionSample;
use crate::domain::{BinnedInterpolation, Extrapolation, Overdensity};
use crate::error::{SpkError, SpkResult};
use crate::math::interp::{End, Interpolant, Scheme};

#[derive(Debug, Clone, PartialEq)]
pub struct BinnedParams {
    /// Halo masses (M_sun), strictly ascending.
    pub m_halo: Vec<f64>,
    /// Normalized baryon fractions at `m_halo`.
    pub fb: Vec<f64>,
    pub interpolation: BinnedInterpolation,
    pub extrapolation: Extrapolation,
}

impl BinnedParams {
    /// Log-linear interpolation with boundary-slope extrapolation.
    pub fn new(m_halo: Vec<f64>, fb: Vec<f64>) -> Self {
        Self {
            m_halo,
            fb,
            interpolation: BinnedInterpolation::default(),
            extrapolation: Extrapolation::default(),
        }
    }

    pub fn with_interpolation(mut self, interpolation: BinnedInterpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinnedRelation {
    overdensity: Overdensity,
    extrapolation: Extrapolation,
    curve: Interpolant,
    baryon_to_matter: f64,
}

impl BinnedRelation {
    pub fn resolve(
        params: &BinnedParams,
        overdensity: Overdensity,
        baryon_to_matter: f64,
    ) -> SpkResult<Self> {
        validate(params)?;

        let log_m: Vec<f64> = params.m_halo.iter().map(|m| m.log10()).collect();
        let log_f: Vec<f64> = params.fb.iter().map(|f| f.log10()).collect();
        let scheme = match params.interpolation {
            BinnedInterpolation::LogLinear => Scheme::Linear,
            BinnedInterpolation::Akima => Scheme::Akima,
        };
        let curve = Interpolant::new(scheme, &log_m, &log_f)?;

        debug!(
            n_bins = params.m_halo.len(),
            interpolation = ?params.interpolation,
            extrapolation = ?params.extrapolation,
            "using binned fb - M_halo relation"
        );

        Ok(Self {
            overdensity,
            extrapolation: params.extrapolation,
            curve,
            baryon_to_matter,
        })
    }

    pub fn overdensity(&self) -> Overdensity {
        self.overdensity
    }

    pub fn baryon_to_matter_ratio(&self) -> f64 {
        self.baryon_to_matter
    }

    /// Tabulated mass range (M_sun).
    pub fn mass_range(&self) -> (f64, f64) {
        (10f64.powf(self.curve.x_min()), 10f64.powf(self.curve.x_max()))
    }

    /// `mass` must be finite and positive.
    pub(crate) fn evaluate(&self, mass: f64) -> FractionSample {
        let x = mass.log10();
        if self.curve.contains(x) {
            return FractionSample {
                value: 10f64.powf(self.curve.eval(x)),
                extrapolated: false,
            };
        }

        let end = if x < self.curve.x_min() {
            End::Lower
        } else {
            End::Upper
        };
        let edge = match end {
            End::Lower => self.curve.x_min(),
            End::Upper => self.curve.x_max(),
        };
        let boundary = self.curve.boundary_value(end);
        let log_f = match self.extrapolation {
            Extrapolation::Flat => boundary,
            Extrapolation::BoundarySlope => boundary + self.curve.boundary_slope(end) * (x - edge),
        };
        FractionSample {
            value: 10f64.powf(log_f),
            extrapolated: true,
        }
    }
}

fn validate(params: &BinnedParams) -> SpkResult<()> {
    let (m, f) = (&params.m_halo, &params.fb);
    if m.len() != f.len() {
        return Err(SpkError::configuration(format!(
            "Binned relation has {} mass bins but {} fraction values.",
            m.len(),
            f.len()
        )));
    }
    if m.len() < 2 {
        return Err(SpkError::configuration(
            "Binned relation requires at least 2 mass bins.",
        ));
    }
    if let Some(bad) = m.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(SpkError::configuration(format!(
            "Mass bins must be finite and > 0 (got {bad})."
        )));
    }
    if !m.windows(2).all(|w| w[1] > w[0]) {
        return Err(SpkError::configuration(
            "Mass bins must be strictly ascending.",
        ));
    }
    if let Some(bad) = f.iter().find(|v| !v.is_finite()) {
        return Err(SpkError::configuration(format!(
            "Baryon fractions must be finite (got {bad})."
        )));
    }
    if let Some(bad) = f.iter().find(|v| **v <= 0.0 || **v > 1.0) {
        return Err(SpkError::domain(format!(
            "Binned baryon fractions must lie in (0, 1] of the universal fraction (got {bad})."
        )));
    }
    Ok(())
}

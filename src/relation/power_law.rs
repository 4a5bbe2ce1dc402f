//! Power-law relation `f = a (M / pivot)^b`.

use tracing::debug;

use super::{PerRedshift, redshift_index};
use crate::domain::Overdensity;
use crate::error::{SpkError, SpkResult};

/// Default pivot mass (M_sun).
pub const DEFAULT_PIVOT_MASS: f64 = 1.0;

/// Power-law inputs (`fb_a`, `fb_pow`, `fb_pivot`).
///
/// `fb_a` and `fb_pow` are optional so that a caller forgetting one of them gets
/// a configuration error rather than a silently different model.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerLawParams {
    pub fb_a: Option<PerRedshift>,
    pub fb_pow: Option<PerRedshift>,
    pub fb_pivot: f64,
}

impl PowerLawParams {
    /// Uniform power law with the default pivot of 1 M_sun.
    pub fn new(fb_a: f64, fb_pow: f64) -> Self {
        Self {
            fb_a: Some(PerRedshift::Scalar(fb_a)),
            fb_pow: Some(PerRedshift::Scalar(fb_pow)),
            fb_pivot: DEFAULT_PIVOT_MASS,
        }
    }

    pub fn with_pivot(mut self, pivot: f64) -> Self {
        self.fb_pivot = pivot;
        self
    }
}

/// Normalization and slope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLawTerm {
    pub a: f64,
    pub b: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PowerLawTerms {
    /// Same parameters at every redshift.
    Uniform(PowerLawTerm),
    /// One term per resolved redshift (same order as `redshifts`).
    PerRedshift {
        redshifts: Vec<f64>,
        terms: Vec<PowerLawTerm>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PowerLawRelation {
    overdensity: Overdensity,
    pivot: f64,
    terms: PowerLawTerms,
    baryon_to_matter: f64,
}

impl PowerLawRelation {
    pub fn resolve(
        params: &PowerLawParams,
        overdensity: Overdensity,
        redshifts: &[f64],
        baryon_to_matter: f64,
    ) -> SpkResult<Self> {
        let (fb_a, fb_pow) = match (&params.fb_a, &params.fb_pow) {
            (Some(a), Some(b)) => (a, b),
            (Some(_), None) | (None, Some(_)) => {
                return Err(SpkError::configuration(
                    "When using a power-law, both parameters should be given: fb_a and fb_pow.",
                ));
            }
            (None, None) => {
                return Err(SpkError::configuration(
                    "Power-law mode requires fb_a and fb_pow.",
                ));
            }
        };
        if !(params.fb_pivot.is_finite() && params.fb_pivot > 0.0) {
            return Err(SpkError::configuration(format!(
                "fb_pivot must be finite and > 0 (got {}).",
                params.fb_pivot
            )));
        }

        let terms = match (fb_a, fb_pow) {
            (PerRedshift::Scalar(a), PerRedshift::Scalar(b)) => {
                PowerLawTerms::Uniform(validate_term(*a, *b)?)
            }
            _ => {
                let n = redshifts.len();
                let a_values = fb_a.broadcast("fb_a", n)?;
                let b_values = fb_pow.broadcast("fb_pow", n)?;
                let terms = a_values
                    .into_iter()
                    .zip(b_values)
                    .map(|(a, b)| validate_term(a, b))
                    .collect::<SpkResult<Vec<_>>>()?;
                PowerLawTerms::PerRedshift {
                    redshifts: redshifts.to_vec(),
                    terms,
                }
            }
        };

        debug!(pivot = params.fb_pivot, "using power-law fit for fb - M_halo");

        Ok(Self {
            overdensity,
            pivot: params.fb_pivot,
            terms,
            baryon_to_matter,
        })
    }

    pub fn overdensity(&self) -> Overdensity {
        self.overdensity
    }

    pub fn pivot(&self) -> f64 {
        self.pivot
    }

    pub fn terms(&self) -> &PowerLawTerms {
        &self.terms
    }

    pub fn baryon_to_matter_ratio(&self) -> f64 {
        self.baryon_to_matter
    }

    /// Parameters in force at `z`.
    pub fn term_at(&self, z: f64) -> SpkResult<PowerLawTerm> {
        match &self.terms {
            PowerLawTerms::Uniform(term) => Ok(*term),
            PowerLawTerms::PerRedshift { redshifts, terms } => {
                Ok(terms[redshift_index(redshifts, z)?])
            }
        }
    }

    pub(crate) fn evaluate(&self, mass: f64, z: f64) -> SpkResult<f64> {
        let term = self.term_at(z)?;
        Ok(term.a * (mass / self.pivot).powf(term.b))
    }
}

fn validate_term(a: f64, b: f64) -> SpkResult<PowerLawTerm> {
    if !(a.is_finite() && b.is_finite()) {
        return Err(SpkError::configuration(format!(
            "Power-law parameters must be finite (fb_a={a}, fb_pow={b})."
        )));
    }
    if a < 0.0 {
        return Err(SpkError::domain(format!(
            "fb_a must be >= 0 (got {a}); negative baryon fractions are unphysical."
        )));
    }
    Ok(PowerLawTerm { a, b })
}

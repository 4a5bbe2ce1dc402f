//! Error types.
//!
//! Two layers:
//!
//! - [`SpkError`]: typed library errors raised by the resolver, the model and the
//!   assembler. Callers can match on the failure kind.
//! - [`AppError`]: what the `spk` binary reports. It carries a process exit code
//!   and a human-readable message; every [`SpkError`] converts into it.

use thiserror::Error;

use crate::cosmology::CosmologyError;

/// Result alias for library operations.
pub type SpkResult<T> = Result<T, SpkError>;

/// Errors raised while resolving a relation, evaluating the model or assembling
/// the output grid.
///
/// Extrapolation beyond the calibrated region is never an error; it is reported
/// through flags on the returned curves.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpkError {
    /// Missing or incompatible parameters for the selected mode.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Input values outside physical validity.
    #[error("domain error: {0}")]
    Domain(String),
    /// Failure reported by the cosmology collaborator.
    #[error(transparent)]
    Cosmology(#[from] CosmologyError),
    /// Requested range exceeds the calibrated support without an override.
    #[error("range error: {0}")]
    Range(String),
}

impl SpkError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::Range(message.into())
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<SpkError> for AppError {
    fn from(err: SpkError) -> Self {
        let exit_code = match err {
            SpkError::Configuration(_) | SpkError::Range(_) => 2,
            SpkError::Domain(_) | SpkError::Cosmology(_) => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spk_error_maps_to_exit_codes() {
        let config: AppError = SpkError::configuration("missing fb_pow").into();
        assert_eq!(config.exit_code(), 2);
        assert!(config.to_string().contains("missing fb_pow"));

        let range: AppError = SpkError::range("k_max too large").into();
        assert_eq!(range.exit_code(), 2);

        let domain: AppError = SpkError::domain("negative mass").into();
        assert_eq!(domain.exit_code(), 3);

        let cosmo: AppError = SpkError::from(CosmologyError::InvalidRedshift { z: -2.0 }).into();
        assert_eq!(cosmo.exit_code(), 3);
    }

    #[test]
    fn cosmology_error_is_transparent() {
        let err = SpkError::from(CosmologyError::InvalidRedshift { z: -1.5 });
        assert_eq!(
            err.to_string(),
            CosmologyError::InvalidRedshift { z: -1.5 }.to_string()
        );
    }
}

//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration enums (`Overdensity`, `Spacing`, `CurveInterpolation`,
//!   `BinnedInterpolation`, `Extrapolation`)
//! - the CLI run configuration (`RunConfig`)
//! - the portable curve file schema (`CurveFile`)

pub mod types;

pub use types::*;

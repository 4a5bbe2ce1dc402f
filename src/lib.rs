//! `baryon-spk` library crate.
//!
//! Computes the suppression `S(k) = P_hydro(k) / P_DMO(k)` of the matter power
//! spectrum caused by baryonic feedback, from a baryon fraction - halo mass
//! relation and a calibrated fitting function.
//!
//! The binary (`spk`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the model can be embedded in other pipelines
//!
//! Most callers want [`pipeline::compute_suppression`].

pub mod app;
pub mod assemble;
pub mod calibration;
pub mod cli;
pub mod cosmology;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod model;
pub mod pipeline;
pub mod plot;
pub mod relation;
pub mod report;

//! Input/output helpers.
//!
//! - binned relation CSV ingest (`ingest`)
//! - statistical error table CSV ingest (`errors`)
//! - result exports (CSV) (`export`)
//! - curve JSON read/write (`curve`)

pub mod curve;
pub mod errors;
pub mod export;
pub mod ingest;

pub use curve::*;
pub use errors::*;
pub use export::*;
pub use ingest::*;

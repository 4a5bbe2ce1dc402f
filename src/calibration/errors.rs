//! Bootstrapped statistical errors of the fitting function.
//!
//! The table samples the 68% and 95% error bands on a rectilinear grid in
//! `(k, f_b / (Ω_b / Ω_m), z)` and is interpolated trilinearly. Points outside
//! the grid have no band. There is one table per overdensity definition; no
//! table ships with the crate.

use crate::domain::{ErrorBand, Overdensity};
use crate::error::{SpkError, SpkResult};

/// One tabulated grid node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorRow {
    pub k: f64,
    pub fb: f64,
    pub z: f64,
    pub band: ErrorBand,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatErrorTable {
    overdensity: Overdensity,
    k: Vec<f64>,
    fb: Vec<f64>,
    z: Vec<f64>,
    /// Row-major `[k][fb][z]`.
    bands: Vec<ErrorBand>,
}

impl StatErrorTable {
    /// Build a table from grid nodes given in any order.
    ///
    /// Every `(k, fb, z)` combination of the distinct axis values must appear
    /// exactly once, with at least two values per axis.
    pub fn new(overdensity: Overdensity, rows: &[ErrorRow]) -> SpkResult<Self> {
        if let Some(bad) = rows
            .iter()
            .find(|r| !(r.k.is_finite() && r.fb.is_finite() && r.z.is_finite() && r.band.is_finite()))
        {
            return Err(SpkError::configuration(format!(
                "Error table node (k={}, fb={}, z={}) has a non-finite value.",
                bad.k, bad.fb, bad.z
            )));
        }

        let k = axis(rows.iter().map(|r| r.k));
        let fb = axis(rows.iter().map(|r| r.fb));
        let z = axis(rows.iter().map(|r| r.z));
        if k.len() < 2 || fb.len() < 2 || z.len() < 2 {
            return Err(SpkError::configuration(
                "Error table needs at least two distinct values of k, fb and z.",
            ));
        }
        let n = k.len() * fb.len() * z.len();
        if rows.len() != n {
            return Err(SpkError::configuration(format!(
                "Error table is not a full grid: {} rows for {}x{}x{} nodes.",
                rows.len(),
                k.len(),
                fb.len(),
                z.len()
            )));
        }

        let mut slots: Vec<Option<ErrorBand>> = vec![None; n];
        for r in rows {
            let offset = (node(&k, r.k)? * fb.len() + node(&fb, r.fb)?) * z.len() + node(&z, r.z)?;
            if slots[offset].replace(r.band).is_some() {
                return Err(SpkError::configuration(format!(
                    "Error table lists node (k={}, fb={}, z={}) twice.",
                    r.k, r.fb, r.z
                )));
            }
        }
        let bands = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| SpkError::configuration("Error table has missing grid nodes."))?;

        Ok(Self {
            overdensity,
            k,
            fb,
            z,
            bands,
        })
    }

    pub fn overdensity(&self) -> Overdensity {
        self.overdensity
    }

    /// Interpolated band at `(k, fb, z)`, or `None` outside the grid.
    pub fn band(&self, k: f64, fb: f64, z: f64) -> Option<ErrorBand> {
        let (i, tk) = locate(&self.k, k)?;
        let (j, tf) = locate(&self.fb, fb)?;
        let (l, tz) = locate(&self.z, z)?;

        let mut out = ErrorBand::default();
        for (di, wk) in [(0, 1.0 - tk), (1, tk)] {
            for (dj, wf) in [(0, 1.0 - tf), (1, tf)] {
                for (dl, wz) in [(0, 1.0 - tz), (1, tz)] {
                    let w = wk * wf * wz;
                    let b = self.bands[((i + di) * self.fb.len() + j + dj) * self.z.len() + l + dl];
                    out.minus_68 += w * b.minus_68;
                    out.plus_68 += w * b.plus_68;
                    out.minus_95 += w * b.minus_95;
                    out.plus_95 += w * b.plus_95;
                }
            }
        }
        Some(out)
    }
}

fn axis(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

fn node(axis: &[f64], x: f64) -> SpkResult<usize> {
    axis.binary_search_by(|v| v.total_cmp(&x))
        .map_err(|_| SpkError::configuration(format!("Error table value {x} is not a grid node.")))
}

/// Lower node index and fractional position of `x`; `None` outside the axis.
fn locate(axis: &[f64], x: f64) -> Option<(usize, f64)> {
    let n = axis.len();
    if !(x >= axis[0] && x <= axis[n - 1]) {
        return None;
    }
    let i = axis.partition_point(|&v| v <= x).saturating_sub(1).min(n - 2);
    Some((i, (x - axis[i]) / (axis[i + 1] - axis[i])))
}

//! One-dimensional interpolants on strictly increasing abscissae.
//!
//! All schemes are piecewise cubic Hermite (linear being the degenerate case)
//! and differ only in how node derivatives are chosen:
//!
//! - `Linear`: piecewise linear
//! - `Akima`: Akima (1970) derivatives, robust to outliers, no overshoot near steps
//! - `MonotoneCubic`: Fritsch–Carlson (PCHIP) derivatives, preserves monotonicity
//!
//! Evaluation is only defined inside `[x_min, x_max]`; callers decide the
//! extrapolation policy and use [`Interpolant::boundary_slope`] if they need it.
//! Evaluating exactly at a node returns the node value bit-for-bit.

use crate::error::{SpkError, SpkResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Linear,
    Akima,
    MonotoneCubic,
}

/// Which end of the abscissa range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Lower,
    Upper,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interpolant {
    scheme: Scheme,
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Node derivatives (unused for `Linear`).
    ds: Vec<f64>,
}

impl Interpolant {
    /// Build an interpolant through `(xs[i], ys[i])`.
    ///
    /// Requires at least two nodes, equal lengths, finite values and strictly
    /// increasing `xs`.
    pub fn new(scheme: Scheme, xs: &[f64], ys: &[f64]) -> SpkResult<Self> {
        if xs.len() != ys.len() {
            return Err(SpkError::configuration(format!(
                "Interpolation nodes have mismatched lengths ({} vs {}).",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(SpkError::configuration("Interpolation requires at least 2 nodes."));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(SpkError::configuration("Interpolation nodes must be finite."));
        }
        if !xs.windows(2).all(|w| w[1] > w[0]) {
            return Err(SpkError::configuration(
                "Interpolation abscissae must be strictly increasing.",
            ));
        }

        let secants = secants(xs, ys);
        let ds = match scheme {
            Scheme::Linear => Vec::new(),
            Scheme::Akima => akima_derivatives(&secants),
            Scheme::MonotoneCubic => pchip_derivatives(xs, &secants),
        };

        Ok(Self {
            scheme,
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            ds,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn x_min(&self) -> f64 {
        self.xs[0]
    }

    pub fn x_max(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }

    /// Node value at the given end.
    pub fn boundary_value(&self, end: End) -> f64 {
        match end {
            End::Lower => self.ys[0],
            End::Upper => self.ys[self.ys.len() - 1],
        }
    }

    /// Secant slope of the outermost interval at the given end.
    pub fn boundary_slope(&self, end: End) -> f64 {
        let n = self.xs.len();
        match end {
            End::Lower => (self.ys[1] - self.ys[0]) / (self.xs[1] - self.xs[0]),
            End::Upper => (self.ys[n - 1] - self.ys[n - 2]) / (self.xs[n - 1] - self.xs[n - 2]),
        }
    }

    /// Index `i` of the interval `[xs[i], xs[i+1]]` holding `x` (clamped).
    pub fn interval(&self, x: f64) -> usize {
        let n = self.xs.len();
        let upper = self.xs.partition_point(|&v| v <= x);
        upper.saturating_sub(1).min(n - 2)
    }

    /// Evaluate at `x`, which must lie inside `[x_min, x_max]`.
    pub fn eval(&self, x: f64) -> f64 {
        debug_assert!(self.contains(x), "interpolant evaluated outside its range");
        let i = self.interval(x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        if x == x1 {
            return y1;
        }
        let h = x1 - x0;
        let t = (x - x0) / h;

        match self.scheme {
            Scheme::Linear => y0 + (y1 - y0) * t,
            Scheme::Akima | Scheme::MonotoneCubic => {
                let (d0, d1) = (self.ds[i], self.ds[i + 1]);
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                let h10 = t3 - 2.0 * t2 + t;
                let h01 = -2.0 * t3 + 3.0 * t2;
                let h11 = t3 - t2;
                h00 * y0 + h10 * h * d0 + h01 * y1 + h11 * h * d1
            }
        }
    }
}

fn secants(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| (y[1] - y[0]) / (x[1] - x[0]))
        .collect()
}

fn akima_derivatives(m: &[f64]) -> Vec<f64> {
    let n_seg = m.len();
    if n_seg == 1 {
        return vec![m[0], m[0]];
    }

    // Extend the secants by two on each side with linear extrapolation.
    let mut ext = Vec::with_capacity(n_seg + 4);
    let lo1 = 2.0 * m[0] - m[1];
    let lo2 = 2.0 * lo1 - m[0];
    let hi1 = 2.0 * m[n_seg - 1] - m[n_seg - 2];
    let hi2 = 2.0 * hi1 - m[n_seg - 1];
    ext.push(lo2);
    ext.push(lo1);
    ext.extend_from_slice(m);
    ext.push(hi1);
    ext.push(hi2);

    let n_nodes = n_seg + 1;
    let weights: Vec<(f64, f64)> = (0..n_nodes)
        .map(|i| {
            // ext[i + 2] is the secant to the right of node i.
            let w1 = (ext[i + 3] - ext[i + 2]).abs();
            let w2 = (ext[i + 1] - ext[i]).abs();
            (w1, w2)
        })
        .collect();
    let scale = weights
        .iter()
        .map(|(w1, w2)| w1 + w2)
        .fold(0.0_f64, f64::max);

    (0..n_nodes)
        .map(|i| {
            let (w1, w2) = weights[i];
            let left = ext[i + 1];
            let right = ext[i + 2];
            if w1 + w2 > 1e-9 * scale {
                (w1 * left + w2 * right) / (w1 + w2)
            } else {
                0.5 * (left + right)
            }
        })
        .collect()
}

fn pchip_derivatives(xs: &[f64], m: &[f64]) -> Vec<f64> {
    let n_seg = m.len();
    if n_seg == 1 {
        return vec![m[0], m[0]];
    }

    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let mut d = vec![0.0; n_seg + 1];

    for i in 1..n_seg {
        let (m0, m1) = (m[i - 1], m[i]);
        if m0 * m1 <= 0.0 {
            d[i] = 0.0;
        } else {
            let w1 = 2.0 * h[i] + h[i - 1];
            let w2 = h[i] + 2.0 * h[i - 1];
            d[i] = (w1 + w2) / (w1 / m0 + w2 / m1);
        }
    }

    d[0] = pchip_edge(h[0], h[1], m[0], m[1]);
    d[n_seg] = pchip_edge(h[n_seg - 1], h[n_seg - 2], m[n_seg - 1], m[n_seg - 2]);
    d
}

/// One-sided three-point derivative, limited to keep the end interval monotone.
fn pchip_edge(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XS: [f64; 5] = [0.0, 1.0, 2.0, 3.0, 4.0];

    #[test]
    fn all_schemes_hit_nodes_exactly() {
        let ys = [1.0, 3.0, 2.0, 5.0, 4.0];
        for scheme in [Scheme::Linear, Scheme::Akima, Scheme::MonotoneCubic] {
            let f = Interpolant::new(scheme, &XS, &ys).unwrap();
            for (x, y) in XS.iter().zip(ys.iter()) {
                assert_eq!(f.eval(*x), *y, "{scheme:?} at x={x}");
            }
        }
    }

    #[test]
    fn schemes_reproduce_straight_lines() {
        let ys: Vec<f64> = XS.iter().map(|x| 2.0 * x - 1.0).collect();
        for scheme in [Scheme::Linear, Scheme::Akima, Scheme::MonotoneCubic] {
            let f = Interpolant::new(scheme, &XS, &ys).unwrap();
            for x in [0.25, 1.5, 2.75, 3.9] {
                assert!((f.eval(x) - (2.0 * x - 1.0)).abs() < 1e-12, "{scheme:?} at x={x}");
            }
        }
    }

    #[test]
    fn monotone_cubic_does_not_overshoot_a_step() {
        let ys = [0.0, 0.0, 1.0, 1.0, 1.0];
        let f = Interpolant::new(Scheme::MonotoneCubic, &XS, &ys).unwrap();
        let mut prev = f.eval(0.0);
        let mut x = 0.0;
        while x <= 4.0 {
            let y = f.eval(x);
            assert!((0.0..=1.0).contains(&y));
            assert!(y >= prev - 1e-15);
            prev = y;
            x += 0.01;
        }
    }

    #[test]
    fn two_nodes_degenerate_to_linear() {
        for scheme in [Scheme::Linear, Scheme::Akima, Scheme::MonotoneCubic] {
            let f = Interpolant::new(scheme, &[1.0, 3.0], &[2.0, 6.0]).unwrap();
            assert!((f.eval(2.0) - 4.0).abs() < 1e-12);
        }
    }

    #[test]
    fn boundary_slopes_use_outer_intervals() {
        let f = Interpolant::new(Scheme::Linear, &[0.0, 1.0, 3.0], &[0.0, 2.0, 3.0]).unwrap();
        assert_eq!(f.boundary_slope(End::Lower), 2.0);
        assert_eq!(f.boundary_slope(End::Upper), 0.5);
        assert_eq!(f.boundary_value(End::Upper), 3.0);
    }

    #[test]
    fn rejects_invalid_nodes() {
        assert!(Interpolant::new(Scheme::Linear, &[0.0], &[1.0]).is_err());
        assert!(Interpolant::new(Scheme::Linear, &[0.0, 0.0], &[1.0, 2.0]).is_err());
        assert!(Interpolant::new(Scheme::Akima, &[0.0, 1.0], &[1.0, f64::NAN]).is_err());
        assert!(Interpolant::new(Scheme::Akima, &[0.0, 1.0, 2.0], &[1.0, 2.0]).is_err());
    }
}

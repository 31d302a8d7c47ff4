//! Optimality Gaps
//!
//! ```text
//! abs = |inner - outer|
//! rel = abs / |inner|
//! ```
//!
//! Both are `inf` until a finite inner and outer bound are known.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Gaps {
    pub abs: f64,
    pub rel: f64,
}

impl Gaps {
    pub const UNKNOWN: Gaps = Gaps {
        abs: f64::INFINITY,
        rel: f64::INFINITY,
    };

    pub fn compute(inner: Option<f64>, outer: Option<f64>) -> Self {
        let (Some(inner), Some(outer)) = (inner, outer) else {
            return Self::UNKNOWN;
        };
        if !inner.is_finite() || !outer.is_finite() {
            return Self::UNKNOWN;
        }

        let abs = (inner - outer).abs();
        let rel = if abs == 0.0 {
            0.0
        } else if inner == 0.0 {
            f64::INFINITY
        } else {
            abs / inner.abs()
        };
        Self { abs, rel }
    }

    /// Converged if either gap is within its tolerance.
    pub fn within(&self, abs_tol: f64, rel_tol: f64) -> bool {
        self.abs <= abs_tol || self.rel <= rel_tol
    }
}

use crate::basis::{metalog_term_derivative, metalog_term_value};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Iteration cap for the quantile inversion in [`Metalog::cdf`].
const MAX_CDF_ITERATIONS: usize = 100;

/// Default step tolerance for [`Metalog::cdf_default`].
pub const DEFAULT_CDF_TOLERANCE: f64 = 1e-12;

/// Largest term count with closed-form moments.
pub const MOMENT_TERMS: usize = 4;

/// Outcome of checking that a coefficient vector describes a proper
/// distribution (non-decreasing quantile function).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetalogValidation {
    Valid,
    NotEnoughCoefficients,
    NegativeDensity,
}

/// A metalog distribution given by its quantile-function coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metalog {
    coefficients: Array1<f64>,
}

impl Metalog {
    pub fn new(coefficients: Array1<f64>) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn num_terms(&self) -> usize {
        self.coefficients.len()
    }

    /// Quantile function `Q(p)`; `p` must lie in (0, 1).
    pub fn quantile(&self, p: f64) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .map(|(j, &a)| a * metalog_term_value(j + 1, p))
            .sum()
    }

    /// Quantile density `Q'(p)`.
    pub fn quantile_density(&self, p: f64) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .map(|(j, &a)| a * metalog_term_derivative(j + 1, p))
            .sum()
    }

    fn leading_coefficients(&self) -> Option<[f64; MOMENT_TERMS]> {
        if self.coefficients.is_empty() || self.coefficients.len() > MOMENT_TERMS {
            return None;
        }
        let mut a = [0.0; MOMENT_TERMS];
        for (dst, &src) in a.iter_mut().zip(self.coefficients.iter()) {
            *dst = src;
        }
        Some(a)
    }

    /// Mean `a_1 + a_3 / 2`, available for at most four terms.
    pub fn mean(&self) -> Option<f64> {
        self.leading_coefficients().map(|a| a[0] + a[2] / 2.0)
    }

    /// Variance, available for at most four terms.
    pub fn variance(&self) -> Option<f64> {
        self.leading_coefficients().map(|a| {
            let pi2 = PI * PI;
            pi2 * a[1] * a[1] / 3.0
                + a[1] * a[3]
                + a[2] * a[2] * (1.0 / 12.0 + pi2 / 36.0)
                + a[3] * a[3] / 12.0
        })
    }

    /// Invert the quantile function at `x`.
    ///
    /// Newton steps are taken inside a shrinking bracket on (0, 1); a step
    /// that leaves the bracket is replaced by bisection. The search stops
    /// when a step is no larger than `tolerance`, when the bracket can no
    /// longer be split, or after a fixed number of iterations.
    pub fn cdf(&self, x: f64, tolerance: f64) -> f64 {
        let mut lo = 0.0_f64;
        let mut hi = 1.0_f64;
        let mut p = 0.5_f64;
        for _ in 0..MAX_CDF_ITERATIONS {
            let residual = self.quantile(p) - x;
            if residual > 0.0 {
                hi = p;
            } else if residual < 0.0 {
                lo = p;
            } else {
                return p;
            }

            let mut next = p - residual / self.quantile_density(p);
            if !(next > lo && next < hi) {
                next = 0.5 * (lo + hi);
                if next <= lo || next >= hi {
                    return self.closer_endpoint(x, lo, hi);
                }
            }
            let step = (next - p).abs();
            p = next;
            if step <= tolerance {
                return p;
            }
        }
        p
    }

    pub fn cdf_default(&self, x: f64) -> f64 {
        self.cdf(x, DEFAULT_CDF_TOLERANCE)
    }

    fn closer_endpoint(&self, x: f64, lo: f64, hi: f64) -> f64 {
        if (self.quantile(hi) - x).abs() < (self.quantile(lo) - x).abs() {
            hi
        } else {
            lo
        }
    }

    /// Density at `x`, clamped at zero where the fit is not monotone.
    pub fn pdf(&self, x: f64) -> f64 {
        let p = self.cdf_default(x);
        (1.0 / self.quantile_density(p)).max(0.0)
    }

    /// Check that the quantile density is non-negative.
    ///
    /// Two coefficients admit an exact answer (`a_2 > 0`); otherwise the
    /// density is scanned at the midpoints of 99 equal probability bins.
    pub fn validate(&self) -> MetalogValidation {
        match self.coefficients.len() {
            0 | 1 => MetalogValidation::NotEnoughCoefficients,
            2 => {
                if self.coefficients[1] > 0.0 {
                    MetalogValidation::Valid
                } else {
                    MetalogValidation::NegativeDensity
                }
            }
            _ => {
                let negative = (0..99)
                    .map(|i| i as f64 / 100.0 + 1.0 / 200.0)
                    .any(|p| self.quantile_density(p) < 0.0);
                if negative {
                    MetalogValidation::NegativeDensity
                } else {
                    MetalogValidation::Valid
                }
            }
        }
    }
}

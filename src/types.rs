use serde::{Deserialize, Serialize};

/// Coarse classification shared by every error type in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// An input lies outside the mathematical domain of the metalog basis.
    Domain,
    /// A size, count, step, or tolerance is unusable.
    Config,
    /// The linear program could not be solved.
    Solver,
    /// Reading fixtures or writing diagnostic tables failed.
    Io,
}

pub fn default_diff_error() -> f64 {
    0.001
}

pub fn default_diff_step() -> f64 {
    0.001
}

pub fn default_max_iterations() -> usize {
    5000
}

pub fn default_tolerance() -> f64 {
    1.0e-5
}

/// Tuning knobs for a single LP metalog fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpFitConfig {
    /// Lower bound enforced on the quantile density at every grid point.
    #[serde(default = "default_diff_error")]
    pub diff_error: f64,
    /// Spacing of the probability grid carrying the density constraints.
    #[serde(default = "default_diff_step")]
    pub diff_step: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for LpFitConfig {
    fn default() -> Self {
        Self {
            diff_error: default_diff_error(),
            diff_step: default_diff_step(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

impl LpFitConfig {
    pub fn with_grid(diff_error: f64, diff_step: f64) -> Self {
        Self {
            diff_error,
            diff_step,
            ..Self::default()
        }
    }
}

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Zip};
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use thiserror::Error;

use crate::types::ErrorKind;

#[cfg(test)]
use approx::assert_abs_diff_eq;

/// Smallest number of metalog terms that yields a proper distribution.
pub const MIN_TERMS: usize = 2;

/// Row count above which basis rows are filled on the rayon pool.
const PARALLEL_ROW_THRESHOLD: usize = 256;

/// Relative slack used when deciding whether the last grid point has reached 1.
const GRID_EDGE_TOLERANCE: f64 = 1e-9;

/// Largest derivative grid accepted by [`derivative_grid`].
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Grids above this size are accepted with a warning.
const LARGE_GRID_POINTS: usize = 100_000;

/// Errors raised while building metalog basis matrices.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BasisError {
    #[error(
        "Probability at index {index} is {value}, but metalog terms require values strictly inside (0, 1) so that logit(p) is finite."
    )]
    ProbabilityOutOfDomain { index: usize, value: f64 },

    #[error("A metalog fit needs at least {minimum} terms, but {terms} were requested.")]
    InvalidTermCount { terms: usize, minimum: usize },

    #[error(
        "Derivative grid step must be finite and lie in (0, 1) so that at least one grid point exists, but was {0}."
    )]
    InvalidGridStep(f64),

    #[error(
        "Derivative grid step {step:e} would produce more than {limit} grid points; use a coarser step."
    )]
    GridTooFine { step: f64, limit: usize },
}

impl BasisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BasisError::ProbabilityOutOfDomain { .. } => ErrorKind::Domain,
            BasisError::InvalidTermCount { .. }
            | BasisError::InvalidGridStep(_)
            | BasisError::GridTooFine { .. } => ErrorKind::Config,
        }
    }
}

#[inline]
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

pub(crate) fn check_term_count(terms: usize) -> Result<(), BasisError> {
    if terms < MIN_TERMS {
        return Err(BasisError::InvalidTermCount {
            terms,
            minimum: MIN_TERMS,
        });
    }
    Ok(())
}

fn check_probabilities(probabilities: ArrayView1<'_, f64>) -> Result<(), BasisError> {
    for (index, &value) in probabilities.iter().enumerate() {
        if !(value.is_finite() && value > 0.0 && value < 1.0) {
            return Err(BasisError::ProbabilityOutOfDomain { index, value });
        }
    }
    Ok(())
}

/// Fill every row of `matrix` from the matching entry of `points`.
fn fill_rows<F>(matrix: &mut Array2<f64>, points: ArrayView1<'_, f64>, fill: F)
where
    F: Fn(ArrayViewMut1<'_, f64>, f64) + Sync + Send,
{
    if points.len() >= PARALLEL_ROW_THRESHOLD {
        matrix
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, row)| fill(row, points[i]));
    } else {
        for (row, &p) in matrix.rows_mut().into_iter().zip(points.iter()) {
            fill(row, p);
        }
    }
}

// ============================================================================
// Quantile (CDF) basis
// ============================================================================

/// Value of the 1-indexed metalog term `term` at probability `p`.
///
/// Term layout: 1 → constant, 2 → logit(p), 3 → (p - 0.5)·logit(p),
/// 4 → (p - 0.5); beyond that odd terms are pure powers of (p - 0.5) and even
/// terms multiply the preceding odd power by logit(p). Term 0 does not exist
/// and evaluates to 0.
pub fn metalog_term_value(term: usize, p: f64) -> f64 {
    let f = p - 0.5;
    match term {
        0 => 0.0,
        1 => 1.0,
        2 => logit(p),
        3 => f * logit(p),
        4 => f,
        t if t % 2 == 1 => f.powi((t / 2) as i32),
        t => logit(p) * f.powi(((t - 1) / 2) as i32),
    }
}

fn fill_basis_row(mut row: ArrayViewMut1<'_, f64>, p: f64) {
    let terms = row.len();
    row[0] = 1.0;
    row[1] = logit(p);
    if terms > 2 {
        row[2] = (p - 0.5) * row[1];
    }
    if terms > 3 {
        row[3] = p - 0.5;
    }
    for term in 5..=terms {
        let col = term - 1;
        row[col] = if term % 2 == 1 {
            row[3].powi((term / 2) as i32)
        } else {
            row[1] * row[col - 1]
        };
    }
}

/// Build the `n × terms` metalog basis matrix for the quantile positions
/// `probabilities`. Column `j` holds term `j + 1`.
pub fn build_metalog_basis(
    probabilities: ArrayView1<'_, f64>,
    terms: usize,
) -> Result<Array2<f64>, BasisError> {
    check_term_count(terms)?;
    check_probabilities(probabilities)?;

    let mut basis = Array2::<f64>::zeros((probabilities.len(), terms));
    fill_rows(&mut basis, probabilities, fill_basis_row);
    log::debug!(
        "built metalog basis with {} rows and {} terms",
        basis.nrows(),
        basis.ncols()
    );
    Ok(basis)
}

// ============================================================================
// Derivative (quantile density) basis
// ============================================================================

/// Derivative of the 1-indexed metalog term `term` with respect to `p`.
pub fn metalog_term_derivative(term: usize, p: f64) -> f64 {
    let d = p * (1.0 - p);
    let f = p - 0.5;
    match term {
        0 | 1 => 0.0,
        2 => 1.0 / d,
        3 => f / d + logit(p),
        4 => 1.0,
        t if t % 2 == 1 => {
            let q = (t / 2) as i32;
            f64::from(q) * f.powi(q - 1)
        }
        t => {
            let q = ((t - 1) / 2) as i32;
            f.powi(q) / d + f64::from(q) * f.powi(q - 1) * logit(p)
        }
    }
}

fn fill_derivative_row(mut row: ArrayViewMut1<'_, f64>, p: f64) {
    let terms = row.len();
    let d = p * (1.0 - p);
    let f = p - 0.5;
    let l = logit(p);

    row[0] = 0.0;
    row[1] = 1.0 / d;
    if terms > 2 {
        row[2] = f / d + l;
    }
    if terms > 3 {
        row[3] = 1.0;
    }

    // Odd and even terms advance their own exponents.
    let mut odd = 1_i32;
    let mut even = 1_i32;
    for term in 5..=terms {
        let col = term - 1;
        if term % 2 == 1 {
            row[col] = f64::from(odd + 1) * f.powi(odd);
            odd += 1;
        } else {
            row[col] = f.powi(even + 1) / d + f64::from(even + 1) * f.powi(even) * l;
            even += 1;
        }
    }
}

/// `step` must already be bounded below by `1 / (MAX_GRID_POINTS + 1)`.
fn derivative_grid_len(step: f64) -> usize {
    let cutoff = 1.0 - step * GRID_EDGE_TOLERANCE;
    let mut len = (1.0 / step).ceil() as usize;
    while len > 0 && (len as f64) * step >= cutoff {
        len -= 1;
    }
    while ((len + 1) as f64) * step < cutoff {
        len += 1;
    }
    len
}

/// Uniform probability grid `step, 2·step, …` stopping strictly below 1.
pub fn derivative_grid(step: f64) -> Result<Array1<f64>, BasisError> {
    if !(step.is_finite() && step > 0.0 && step < 1.0) {
        return Err(BasisError::InvalidGridStep(step));
    }
    if 1.0 / step > (MAX_GRID_POINTS + 1) as f64 {
        return Err(BasisError::GridTooFine {
            step,
            limit: MAX_GRID_POINTS,
        });
    }
    let len = derivative_grid_len(step);
    if len == 0 {
        return Err(BasisError::InvalidGridStep(step));
    }
    if len > LARGE_GRID_POINTS {
        log::warn!(
            "derivative grid step {step:e} produces {len} grid points; constraint assembly will be memory heavy"
        );
    }
    Ok(Array1::from_shape_fn(len, |i| (i + 1) as f64 * step))
}

/// Quantile-density basis evaluated over the derivative grid.
#[derive(Clone, Debug)]
pub struct DerivativeBasis {
    /// Grid probabilities, one per matrix row.
    pub grid: Array1<f64>,
    /// `grid.len() × terms` matrix; column `j` is the derivative of term `j + 1`.
    pub matrix: Array2<f64>,
}

impl DerivativeBasis {
    pub fn num_points(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn num_terms(&self) -> usize {
        self.matrix.ncols()
    }

    /// Twin-column form used as inequality coefficients.
    pub fn signed(&self) -> Array2<f64> {
        signed_expansion(self.matrix.view())
    }
}

/// Build the derivative basis for `terms` metalog terms over the grid with
/// spacing `step`.
pub fn build_derivative_basis(terms: usize, step: f64) -> Result<DerivativeBasis, BasisError> {
    check_term_count(terms)?;
    let grid = derivative_grid(step)?;

    let mut matrix = Array2::<f64>::zeros((grid.len(), terms));
    fill_rows(&mut matrix, grid.view(), fill_derivative_row);
    log::debug!(
        "built derivative basis over {} grid points (step {step}) for {terms} terms",
        grid.len()
    );
    Ok(DerivativeBasis { grid, matrix })
}

// ============================================================================
// Signed (twin) expansion
// ============================================================================

/// Interleave every column of `matrix` with its negation: output column `2j`
/// is `matrix[:, j]` and column `2j + 1` is `-matrix[:, j]`.
pub fn signed_expansion(matrix: ArrayView2<'_, f64>) -> Array2<f64> {
    let (rows, cols) = matrix.dim();
    let mut out = Array2::<f64>::zeros((rows, 2 * cols));
    for (j, column) in matrix.columns().into_iter().enumerate() {
        out.column_mut(2 * j).assign(&column);
        Zip::from(out.column_mut(2 * j + 1))
            .and(column)
            .for_each(|dst, &v| *dst = if v == 0.0 { 0.0 } else { -v });
    }
    out
}

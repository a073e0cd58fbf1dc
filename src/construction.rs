use crate::basis::{
    BasisError, build_derivative_basis, build_metalog_basis, check_term_count, signed_expansion,
};
use crate::types::{ErrorKind, LpFitConfig};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use std::ops::Range;
use thiserror::Error;

/// Errors raised while assembling the absolute-value LP.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("Basis construction failed: {0}")]
    Basis(#[from] BasisError),

    #[error(
        "Probability/quantile positions and data values must have the same length, but got {probabilities} positions and {data} values."
    )]
    DimensionMismatch { probabilities: usize, data: usize },

    #[error("At least one data point is required to assemble a metalog LP.")]
    EmptyInput,

    #[error("Data value at index {index} is not finite ({value}).")]
    NonFiniteData { index: usize, value: f64 },

    #[error("{requested} terms were requested but the basis matrix only has {available} columns.")]
    TermsExceedBasis { requested: usize, available: usize },

    #[error(
        "The density lower bound diff_error must be finite and strictly positive, but was {0}."
    )]
    InvalidErrorTolerance(f64),
}

impl ConstructionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConstructionError::Basis(inner) => inner.kind(),
            ConstructionError::NonFiniteData { .. } => ErrorKind::Domain,
            _ => ErrorKind::Config,
        }
    }
}

/// Absolute-value LP for a metalog fit, in the form
/// `min cᵀx  s.t.  A_eq·x = b_eq,  A_ub·x ≤ b_ub,  x ≥ 0`.
///
/// Columns `0..2n` are the per-point error slacks `(e⁺_j, e⁻_j)`; columns
/// `2n..2n+2k` are the twin coefficient variables `(a⁺_j, a⁻_j)`.
#[derive(Clone, Debug)]
pub struct LpProblem {
    pub objective: Array1<f64>,
    pub a_eq: Array2<f64>,
    pub b_eq: Array1<f64>,
    pub a_ub: Array2<f64>,
    pub b_ub: Array1<f64>,
    pub num_points: usize,
    pub num_terms: usize,
}

impl LpProblem {
    pub fn num_variables(&self) -> usize {
        2 * self.num_points + 2 * self.num_terms
    }

    pub fn num_grid_points(&self) -> usize {
        self.a_ub.nrows()
    }

    pub fn error_columns(&self) -> Range<usize> {
        0..2 * self.num_points
    }

    pub fn coefficient_columns(&self) -> Range<usize> {
        2 * self.num_points..self.num_variables()
    }

    /// The stacked constraint matrix with the density rows in their
    /// original `≥` orientation: equality rows first, then grid rows.
    pub fn constraint_matrix(&self) -> Array2<f64> {
        let n = self.a_eq.nrows();
        let mut lp_mat = Array2::<f64>::zeros((n + self.a_ub.nrows(), self.num_variables()));
        lp_mat.slice_mut(s![..n, ..]).assign(&self.a_eq);
        lp_mat
            .slice_mut(s![n.., ..])
            .assign(&self.a_ub.mapv(negate_keeping_zero));
        lp_mat
    }
}

#[inline]
fn negate_keeping_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { -v }
}

/// `n × 2n` matrix whose row `j` carries `+1` for `e⁺_j` and `-1` for `e⁻_j`.
pub fn build_error_matrix(num_points: usize) -> Array2<f64> {
    let mut error_mat = Array2::<f64>::zeros((num_points, 2 * num_points));
    for j in 0..num_points {
        error_mat[[j, 2 * j]] = 1.0;
        error_mat[[j, 2 * j + 1]] = -1.0;
    }
    error_mat
}

fn check_data(data: ArrayView1<'_, f64>) -> Result<(), ConstructionError> {
    if data.is_empty() {
        return Err(ConstructionError::EmptyInput);
    }
    for (index, &value) in data.iter().enumerate() {
        if !value.is_finite() {
            return Err(ConstructionError::NonFiniteData { index, value });
        }
    }
    Ok(())
}

fn check_error_tolerance(diff_error: f64) -> Result<(), ConstructionError> {
    if !(diff_error.is_finite() && diff_error > 0.0) {
        return Err(ConstructionError::InvalidErrorTolerance(diff_error));
    }
    Ok(())
}

/// Assemble the LP from a prebuilt basis matrix.
///
/// Only the first `terms` columns of `basis` are used, so a basis built for a
/// larger term limit can be reused across several term counts.
pub fn assemble_lp_problem(
    basis: ArrayView2<'_, f64>,
    data: ArrayView1<'_, f64>,
    terms: usize,
    config: &LpFitConfig,
) -> Result<LpProblem, ConstructionError> {
    if basis.nrows() != data.len() {
        return Err(ConstructionError::DimensionMismatch {
            probabilities: basis.nrows(),
            data: data.len(),
        });
    }
    check_data(data)?;
    check_term_count(terms)?;
    if terms > basis.ncols() {
        return Err(ConstructionError::TermsExceedBasis {
            requested: terms,
            available: basis.ncols(),
        });
    }
    check_error_tolerance(config.diff_error)?;

    let n = data.len();
    let error_cols = 2 * n;
    let total_cols = error_cols + 2 * terms;

    let derivative = build_derivative_basis(terms, config.diff_step)?;
    let m = derivative.num_points();

    let mut lp_mat = Array2::<f64>::zeros((n + m, total_cols));
    lp_mat
        .slice_mut(s![..n, ..error_cols])
        .assign(&build_error_matrix(n));
    lp_mat
        .slice_mut(s![..n, error_cols..])
        .assign(&signed_expansion(basis.slice(s![.., ..terms])));
    // Grid rows keep a zero block under the error columns.
    lp_mat
        .slice_mut(s![n.., error_cols..])
        .assign(&derivative.signed());

    let objective = Array1::from_shape_fn(total_cols, |j| if j < error_cols { 1.0 } else { 0.0 });
    let a_eq = lp_mat.slice(s![..n, ..]).to_owned();
    let a_ub = lp_mat.slice(s![n.., ..]).mapv(negate_keeping_zero);
    let b_eq = data.to_owned();
    let b_ub = Array1::from_elem(m, -config.diff_error);

    log::debug!(
        "assembled metalog LP: {n} points, {terms} terms, {m} grid rows, {total_cols} variables"
    );

    Ok(LpProblem {
        objective,
        a_eq,
        b_eq,
        a_ub,
        b_ub,
        num_points: n,
        num_terms: terms,
    })
}

/// Build the basis for `probabilities` and assemble the LP against `data`.
pub fn assemble_metalog_lp(
    probabilities: ArrayView1<'_, f64>,
    data: ArrayView1<'_, f64>,
    terms: usize,
    config: &LpFitConfig,
) -> Result<LpProblem, ConstructionError> {
    if probabilities.len() != data.len() {
        return Err(ConstructionError::DimensionMismatch {
            probabilities: probabilities.len(),
            data: data.len(),
        });
    }
    check_error_tolerance(config.diff_error)?;
    let basis = build_metalog_basis(probabilities, terms)?;
    assemble_lp_problem(basis.view(), data, terms, config)
}

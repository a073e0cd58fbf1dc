//! # Metalog estimation via linear programming
//!
//! A metalog quantile function `Q(p) = Σ a_j·b_j(p)` is fitted to empirical
//! CDF points `(p_i, z_i)` by minimizing `Σ |Q(p_i) − z_i|` subject to
//! `Q'(p) ≥ diff_error` on a uniform probability grid. Both the absolute
//! values and the free-sign coefficients are linearized with twin
//! non-negative variables, so the whole fit is one LP:
//!
//! 1.  `basis` evaluates the quantile basis at the data and the density basis
//!     on the grid.
//! 2.  `construction` stacks them into `(c, A_eq, b_eq, A_ub, b_ub)`.
//! 3.  An [`LpSolver`] finds the optimal twin variables.
//! 4.  [`recover_coefficients`] folds every twin pair back into `a_j`.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::basis::{BasisError, MIN_TERMS, build_metalog_basis};
use crate::construction::{
    ConstructionError, LpProblem, assemble_lp_problem, assemble_metalog_lp,
};
use crate::distribution::Metalog;
use crate::simplex::{LpSolver, SolverError, SolverOptions};
use crate::types::{ErrorKind, LpFitConfig};
use ndarray::{Array1, ArrayView1, s};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Underlying basis construction failed: {0}")]
    Basis(#[from] BasisError),

    #[error("LP assembly failed: {0}")]
    Construction(#[from] ConstructionError),

    #[error("LP solve failed: {0}")]
    Solver(#[from] SolverError),
}

impl FitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FitError::Basis(e) => e.kind(),
            FitError::Construction(e) => e.kind(),
            FitError::Solver(e) => e.kind(),
        }
    }
}

/// Result of one LP metalog fit.
#[derive(Clone, Debug)]
pub struct MetalogLpFit {
    pub terms: usize,
    /// Recovered metalog coefficients `a_1..a_k`.
    pub coefficients: Array1<f64>,
    /// Optimal objective: the summed absolute fitting error over all points.
    pub total_abs_error: f64,
    /// Simplex pivots (or the external solver's equivalent).
    pub iterations: usize,
}

impl MetalogLpFit {
    pub fn metalog(&self) -> Metalog {
        Metalog::new(self.coefficients.clone())
    }
}

/// Fold an LP solution back into metalog coefficients:
/// `a_j = x[2n + 2j] − x[2n + 2j + 1]`.
pub fn recover_coefficients(
    solution: ArrayView1<'_, f64>,
    num_points: usize,
    num_terms: usize,
) -> Result<Array1<f64>, SolverError> {
    let expected = 2 * num_points + 2 * num_terms;
    if solution.len() != expected {
        return Err(SolverError::InvalidProblem(format!(
            "solution has {} entries but {num_points} points and {num_terms} terms need {expected}",
            solution.len()
        )));
    }
    let twins = solution.slice(s![2 * num_points..]);
    Ok(Array1::from_shape_fn(num_terms, |j| {
        twins[2 * j] - twins[2 * j + 1]
    }))
}

/// Solve an assembled problem and recover its coefficients.
pub fn fit_lp_problem<S>(
    problem: &LpProblem,
    config: &LpFitConfig,
    solver: &S,
) -> Result<MetalogLpFit, FitError>
where
    S: LpSolver + ?Sized,
{
    let options = SolverOptions::from(config);
    let solution = solver.solve(problem, &options)?;
    let coefficients =
        recover_coefficients(solution.x.view(), problem.num_points, problem.num_terms)?;
    let total_abs_error = solution
        .x
        .slice(s![problem.error_columns()])
        .sum();
    log::debug!(
        "metalog LP with {} terms solved in {} iterations; total absolute error {:.6e}",
        problem.num_terms,
        solution.iterations,
        total_abs_error
    );
    Ok(MetalogLpFit {
        terms: problem.num_terms,
        coefficients,
        total_abs_error,
        iterations: solution.iterations,
    })
}

/// Fit a `terms`-term metalog to the points `(probabilities[i], data[i])`.
pub fn fit_metalog_lp<S>(
    probabilities: ArrayView1<'_, f64>,
    data: ArrayView1<'_, f64>,
    terms: usize,
    config: &LpFitConfig,
    solver: &S,
) -> Result<MetalogLpFit, FitError>
where
    S: LpSolver + ?Sized,
{
    let problem = assemble_metalog_lp(probabilities, data, terms, config)?;
    fit_lp_problem(&problem, config, solver)
}

/// Fit every term count in `term_counts` against one shared basis, in
/// parallel. Results keep the order of `term_counts`.
pub fn fit_metalog_lp_terms<S>(
    probabilities: ArrayView1<'_, f64>,
    data: ArrayView1<'_, f64>,
    term_counts: &[usize],
    config: &LpFitConfig,
    solver: &S,
) -> Vec<(usize, Result<MetalogLpFit, FitError>)>
where
    S: LpSolver + Sync + ?Sized,
{
    let widest = term_counts.iter().copied().max().unwrap_or(0).max(MIN_TERMS);
    let basis = match build_metalog_basis(probabilities, widest) {
        Ok(basis) => basis,
        Err(err) => {
            return term_counts
                .iter()
                .map(|&t| (t, Err(FitError::from(err.clone()))))
                .collect();
        }
    };

    term_counts
        .par_iter()
        .map(|&terms| {
            let result = assemble_lp_problem(basis.view(), data, terms, config)
                .map_err(FitError::from)
                .and_then(|problem| fit_lp_problem(&problem, config, solver));
            if let Err(err) = &result {
                log::warn!("metalog LP fit with {terms} terms failed: {err}");
            }
            (terms, result)
        })
        .collect()
}

//! Linear-program solving for the assembled metalog LP.
//!
//! Callers can plug in any solver through [`LpSolver`]. [`DenseSimplex`] is a
//! dependency-free two-phase tableau simplex. A metalog LP has one row per
//! data point and grid point but only `2n + 2k` columns, so programs with more
//! rows than columns are solved through their dual, whose tableau has one row
//! per primal variable.

use crate::construction::LpProblem;
use crate::types::{ErrorKind, LpFitConfig};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use thiserror::Error;

/// Pivot elements smaller than this are treated as zero.
const PIVOT_EPS: f64 = 1e-10;

/// Consecutive degenerate pivots tolerated before switching to Bland's rule.
const BLAND_SWITCH_STREAK: usize = 50;

/// Pricing tolerance on the dual route. Dual reduced costs are primal
/// constraint residuals.
const DUAL_PRICING_EPS: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("The linear program is infeasible (phase-one residual {residual:.3e}).")]
    Infeasible { residual: f64 },

    #[error("The linear program is unbounded below.")]
    Unbounded,

    #[error("The simplex method did not converge within {max_iterations} pivots.")]
    IterationLimit { max_iterations: usize },

    #[error("Invalid linear program: {0}")]
    InvalidProblem(String),
}

impl SolverError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Solver
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverOptions {
    pub max_iterations: usize,
    /// Optimality and feasibility tolerance.
    pub tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self::from(&LpFitConfig::default())
    }
}

impl From<&LpFitConfig> for SolverOptions {
    fn from(config: &LpFitConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LpSolution {
    /// Optimal point, one entry per LP variable.
    pub x: Array1<f64>,
    /// `cᵀx` at the optimum.
    pub objective: f64,
    /// Number of simplex pivots performed.
    pub iterations: usize,
}

/// Minimizes `cᵀx` subject to `A_eq·x = b_eq`, `A_ub·x ≤ b_ub`, `x ≥ 0`.
pub trait LpSolver {
    fn solve(&self, problem: &LpProblem, options: &SolverOptions)
    -> Result<LpSolution, SolverError>;
}

/// Dense two-phase tableau simplex. Tall programs go through
/// [`solve_via_dual`], everything else through [`solve_standard_form`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DenseSimplex;

impl LpSolver for DenseSimplex {
    fn solve(
        &self,
        problem: &LpProblem,
        options: &SolverOptions,
    ) -> Result<LpSolution, SolverError> {
        let c = problem.objective.view();
        let (a_eq, b_eq) = (problem.a_eq.view(), problem.b_eq.view());
        let (a_ub, b_ub) = (problem.a_ub.view(), problem.b_ub.view());
        if a_eq.nrows() + a_ub.nrows() > c.len() {
            solve_via_dual(c, a_eq, b_eq, a_ub, b_ub, options)
        } else {
            solve_standard_form(c, a_eq, b_eq, a_ub, b_ub, options)
        }
    }
}

struct Tableau {
    /// Constraint rows; the last column is the right-hand side.
    table: Array2<f64>,
    /// Basic column of every row.
    basis: Vec<usize>,
}

impl Tableau {
    fn rhs_col(&self) -> usize {
        self.table.ncols() - 1
    }

    fn rhs(&self, row: usize) -> f64 {
        self.table[[row, self.rhs_col()]]
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let p = self.table[[row, col]];
        self.table.row_mut(row).mapv_inplace(|v| v / p);
        let pivot_row = self.table.row(row).to_owned();
        for i in 0..self.table.nrows() {
            if i == row {
                continue;
            }
            let factor = self.table[[i, col]];
            if factor != 0.0 {
                self.table.row_mut(i).scaled_add(-factor, &pivot_row);
            }
        }
        self.basis[row] = col;
    }

    /// `c_j - c_Bᵀ B⁻¹ A_j` for the first `eligible` columns.
    fn reduced_costs(&self, cost: &Array1<f64>, eligible: usize) -> Array1<f64> {
        let cb = Array1::from_iter(self.basis.iter().map(|&b| cost[b]));
        let priced = self.table.slice(s![.., ..eligible]).t().dot(&cb);
        &cost.slice(s![..eligible]) - &priced
    }

    fn choose_leaving(&self, col: usize) -> Option<usize> {
        let rhs_col = self.rhs_col();
        let mut best: Option<(usize, f64)> = None;
        for i in 0..self.table.nrows() {
            let a = self.table[[i, col]];
            if a <= PIVOT_EPS {
                continue;
            }
            let ratio = self.table[[i, rhs_col]].max(0.0) / a;
            best = match best {
                None => Some((i, ratio)),
                Some((bi, br)) => {
                    if ratio < br - 1e-12 || (ratio <= br + 1e-12 && self.basis[i] < self.basis[bi])
                    {
                        Some((i, ratio))
                    } else {
                        Some((bi, br))
                    }
                }
            };
        }
        best.map(|(i, _)| i)
    }

    /// Run simplex pivots until no eligible column improves `cost`.
    ///
    /// Entering columns follow Dantzig's rule until a long run of degenerate
    /// pivots; from then on Bland's rule stays in force for the rest of the
    /// phase.
    fn optimize(
        &mut self,
        cost: &Array1<f64>,
        eligible: usize,
        options: &SolverOptions,
        iterations: &mut usize,
    ) -> Result<(), SolverError> {
        let mut degenerate_streak = 0usize;
        let mut bland = false;
        loop {
            let reduced = self.reduced_costs(cost, eligible);
            if !bland && degenerate_streak > BLAND_SWITCH_STREAK {
                log::debug!(
                    "switching to Bland's rule after {degenerate_streak} degenerate pivots"
                );
                bland = true;
            }
            let mut entering: Option<(usize, f64)> = None;
            for (j, &r) in reduced.iter().enumerate() {
                if r >= -options.tolerance {
                    continue;
                }
                if bland {
                    entering = Some((j, r));
                    break;
                }
                if entering.is_none_or(|(_, best)| r < best) {
                    entering = Some((j, r));
                }
            }
            let Some((col, _)) = entering else {
                return Ok(());
            };
            let Some(row) = self.choose_leaving(col) else {
                return Err(SolverError::Unbounded);
            };
            if *iterations >= options.max_iterations {
                log::warn!(
                    "simplex stopped after {} pivots without reaching optimality",
                    options.max_iterations
                );
                return Err(SolverError::IterationLimit {
                    max_iterations: options.max_iterations,
                });
            }
            if self.rhs(row).abs() <= PIVOT_EPS {
                degenerate_streak += 1;
            } else {
                degenerate_streak = 0;
            }
            self.pivot(row, col);
            *iterations += 1;
        }
    }
}

fn check_problem(
    c: ArrayView1<'_, f64>,
    a_eq: ArrayView2<'_, f64>,
    b_eq: ArrayView1<'_, f64>,
    a_ub: ArrayView2<'_, f64>,
    b_ub: ArrayView1<'_, f64>,
    options: &SolverOptions,
) -> Result<(), SolverError> {
    let n = c.len();
    if a_eq.ncols() != n || a_ub.ncols() != n {
        return Err(SolverError::InvalidProblem(format!(
            "objective has {n} entries but constraint matrices have {} and {} columns",
            a_eq.ncols(),
            a_ub.ncols()
        )));
    }
    if a_eq.nrows() != b_eq.len() || a_ub.nrows() != b_ub.len() {
        return Err(SolverError::InvalidProblem(format!(
            "constraint rows ({}, {}) do not match right-hand sides ({}, {})",
            a_eq.nrows(),
            a_ub.nrows(),
            b_eq.len(),
            b_ub.len()
        )));
    }
    let all_finite = c.iter().all(|v| v.is_finite())
        && a_eq.iter().all(|v| v.is_finite())
        && b_eq.iter().all(|v| v.is_finite())
        && a_ub.iter().all(|v| v.is_finite())
        && b_ub.iter().all(|v| v.is_finite());
    if !all_finite {
        return Err(SolverError::InvalidProblem(
            "linear program contains non-finite coefficients".to_string(),
        ));
    }
    if !(options.tolerance.is_finite() && options.tolerance > 0.0) {
        return Err(SolverError::InvalidProblem(format!(
            "solver tolerance must be positive, got {}",
            options.tolerance
        )));
    }
    Ok(())
}

/// Tableau at the end of phase two.
struct TwoPhase {
    tableau: Tableau,
    phase_two_cost: Array1<f64>,
    /// First artificial column; structural and slack columns come before it.
    art_start: usize,
    iterations: usize,
}

fn run_two_phase(
    c: ArrayView1<'_, f64>,
    a_eq: ArrayView2<'_, f64>,
    b_eq: ArrayView1<'_, f64>,
    a_ub: ArrayView2<'_, f64>,
    b_ub: ArrayView1<'_, f64>,
    options: &SolverOptions,
) -> Result<TwoPhase, SolverError> {
    let n_vars = c.len();
    let m_eq = a_eq.nrows();
    let m_ub = a_ub.nrows();
    let rows = m_eq + m_ub;
    let art_start = n_vars + m_ub;
    let n_art = m_eq + b_ub.iter().filter(|&&b| b < 0.0).count();
    let n_cols = art_start + n_art;

    // Every row is scaled so its right-hand side is non-negative. Rows that
    // cannot start from a slack get an artificial column.
    let mut table = Array2::<f64>::zeros((rows, n_cols + 1));
    let mut basis = vec![0usize; rows];
    let mut next_art = art_start;
    for i in 0..m_eq {
        let sign = if b_eq[i] < 0.0 { -1.0 } else { 1.0 };
        table
            .slice_mut(s![i, ..n_vars])
            .assign(&a_eq.row(i).mapv(|v| sign * v));
        table[[i, n_cols]] = sign * b_eq[i];
        table[[i, next_art]] = 1.0;
        basis[i] = next_art;
        next_art += 1;
    }
    for r in 0..m_ub {
        let i = m_eq + r;
        let slack = n_vars + r;
        if b_ub[r] < 0.0 {
            table
                .slice_mut(s![i, ..n_vars])
                .assign(&a_ub.row(r).mapv(|v| -v));
            table[[i, slack]] = -1.0;
            table[[i, n_cols]] = -b_ub[r];
            table[[i, next_art]] = 1.0;
            basis[i] = next_art;
            next_art += 1;
        } else {
            table.slice_mut(s![i, ..n_vars]).assign(&a_ub.row(r));
            table[[i, slack]] = 1.0;
            table[[i, n_cols]] = b_ub[r];
            basis[i] = slack;
        }
    }

    let mut tableau = Tableau { table, basis };
    let mut iterations = 0usize;

    if n_art > 0 {
        let phase_one_cost =
            Array1::from_shape_fn(n_cols, |j| if j >= art_start { 1.0 } else { 0.0 });
        tableau.optimize(&phase_one_cost, n_cols, options, &mut iterations)?;

        let residual: f64 = (0..rows)
            .filter(|&i| tableau.basis[i] >= art_start)
            .map(|i| tableau.rhs(i).max(0.0))
            .sum();
        let scale = 1.0
            + b_eq
                .iter()
                .chain(b_ub.iter())
                .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if residual > options.tolerance * scale {
            return Err(SolverError::Infeasible { residual });
        }

        // Pivot zero-level artificials out of the basis where possible; rows
        // with no usable column are redundant and keep their artificial.
        for i in 0..rows {
            if tableau.basis[i] < art_start {
                continue;
            }
            let replacement =
                (0..art_start).find(|&j| tableau.table[[i, j]].abs() > PIVOT_EPS);
            if let Some(j) = replacement {
                tableau.pivot(i, j);
            }
        }
        log::debug!("simplex phase one finished after {iterations} pivots");
    }

    let phase_two_cost = Array1::from_shape_fn(n_cols, |j| if j < n_vars { c[j] } else { 0.0 });
    tableau.optimize(&phase_two_cost, art_start, options, &mut iterations)?;

    Ok(TwoPhase {
        tableau,
        phase_two_cost,
        art_start,
        iterations,
    })
}

fn finish(c: ArrayView1<'_, f64>, x: Array1<f64>, iterations: usize) -> LpSolution {
    let objective = c.dot(&x);
    log::debug!("simplex finished after {iterations} pivots with objective {objective:.6e}");
    LpSolution {
        x,
        objective,
        iterations,
    }
}

/// Solve `min cᵀx` s.t. `a_eq·x = b_eq`, `a_ub·x ≤ b_ub`, `x ≥ 0`.
pub fn solve_standard_form(
    c: ArrayView1<'_, f64>,
    a_eq: ArrayView2<'_, f64>,
    b_eq: ArrayView1<'_, f64>,
    a_ub: ArrayView2<'_, f64>,
    b_ub: ArrayView1<'_, f64>,
    options: &SolverOptions,
) -> Result<LpSolution, SolverError> {
    check_problem(c, a_eq, b_eq, a_ub, b_ub, options)?;

    let n_vars = c.len();
    let run = run_two_phase(c, a_eq, b_eq, a_ub, b_ub, options)?;
    let mut x = Array1::<f64>::zeros(n_vars);
    for (i, &b) in run.tableau.basis.iter().enumerate() {
        if b < n_vars {
            x[b] = run.tableau.rhs(i).max(0.0);
        }
    }
    Ok(finish(c, x, run.iterations))
}

/// Solve the same program as [`solve_standard_form`] through its dual:
///
/// `min −b_eqᵀu⁺ + b_eqᵀu⁻ + b_ubᵀv`  s.t.  `A_eqᵀ(u⁺ − u⁻) − A_ubᵀv ≤ c`,
///
/// which has one row per primal variable. The primal optimum is the vector of
/// reduced costs of the dual slack columns. When the dual is infeasible or
/// unbounded the primal is solved directly, so failures are reported exactly
/// as [`solve_standard_form`] reports them.
pub fn solve_via_dual(
    c: ArrayView1<'_, f64>,
    a_eq: ArrayView2<'_, f64>,
    b_eq: ArrayView1<'_, f64>,
    a_ub: ArrayView2<'_, f64>,
    b_ub: ArrayView1<'_, f64>,
    options: &SolverOptions,
) -> Result<LpSolution, SolverError> {
    check_problem(c, a_eq, b_eq, a_ub, b_ub, options)?;

    let n_vars = c.len();
    let m_eq = a_eq.nrows();
    let dual_vars = 2 * m_eq + a_ub.nrows();

    let mut dual_a = Array2::<f64>::zeros((n_vars, dual_vars));
    dual_a.slice_mut(s![.., ..m_eq]).assign(&a_eq.t());
    dual_a
        .slice_mut(s![.., m_eq..2 * m_eq])
        .assign(&a_eq.t().mapv(|v| -v));
    dual_a
        .slice_mut(s![.., 2 * m_eq..])
        .assign(&a_ub.t().mapv(|v| -v));

    let mut dual_c = Array1::<f64>::zeros(dual_vars);
    dual_c.slice_mut(s![..m_eq]).assign(&b_eq.mapv(|v| -v));
    dual_c.slice_mut(s![m_eq..2 * m_eq]).assign(&b_eq);
    dual_c.slice_mut(s![2 * m_eq..]).assign(&b_ub);

    let no_eq = Array2::<f64>::zeros((0, dual_vars));
    let no_rhs = Array1::<f64>::zeros(0);
    let pricing = SolverOptions {
        tolerance: options.tolerance.min(DUAL_PRICING_EPS),
        ..*options
    };
    log::debug!(
        "solving {} x {n_vars} program through its {n_vars}-row dual",
        m_eq + a_ub.nrows()
    );

    let run = match run_two_phase(
        dual_c.view(),
        no_eq.view(),
        no_rhs.view(),
        dual_a.view(),
        c,
        &pricing,
    ) {
        Ok(run) => run,
        Err(err @ (SolverError::Infeasible { .. } | SolverError::Unbounded)) => {
            log::debug!("dual program failed ({err}); classifying through the primal");
            return solve_standard_form(c, a_eq, b_eq, a_ub, b_ub, options);
        }
        Err(err) => return Err(err),
    };

    let reduced = run
        .tableau
        .reduced_costs(&run.phase_two_cost, run.art_start);
    let x = Array1::from_shape_fn(n_vars, |j| reduced[dual_vars + j].max(0.0));
    Ok(finish(c, x, run.iterations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn no_rows(cols: usize) -> (Array2<f64>, Array1<f64>) {
        (Array2::zeros((0, cols)), Array1::zeros(0))
    }

    #[test]
    fn solves_textbook_maximization() {
        // max x + y  s.t.  x + 2y <= 4,  3x + y <= 6
        let c = array![-1.0, -1.0];
        let (a_eq, b_eq) = no_rows(2);
        let a_ub = array![[1.0, 2.0], [3.0, 1.0]];
        let b_ub = array![4.0, 6.0];
        let sol = solve_standard_form(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &SolverOptions::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(sol.x[0], 1.6, epsilon = 1e-9);
        assert_abs_diff_eq!(sol.x[1], 1.2, epsilon = 1e-9);
        assert_abs_diff_eq!(sol.objective, -2.8, epsilon = 1e-9);
        assert!(sol.iterations >= 2);
    }

    #[test]
    fn handles_equalities_and_greater_equal_rows() {
        // min 2x + 3y  s.t.  x + y = 4,  x >= 1 (as -x <= -1),  x <= 3
        let c = array![2.0, 3.0];
        let a_eq = array![[1.0, 1.0]];
        let b_eq = array![4.0];
        let a_ub = array![[-1.0, 0.0], [1.0, 0.0]];
        let b_ub = array![-1.0, 3.0];
        let sol = solve_standard_form(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &SolverOptions::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(sol.x[0], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sol.x[1], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sol.objective, 9.0, epsilon = 1e-9);
    }

    #[test]
    fn negative_equality_rhs_is_normalized() {
        // x - y = -2 with min y forces y = 2, x = 0.
        let c = array![0.0, 1.0];
        let a_eq = array![[1.0, -1.0]];
        let b_eq = array![-2.0];
        let (a_ub, b_ub) = no_rows(2);
        let sol = solve_standard_form(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &SolverOptions::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(sol.x[1] - sol.x[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sol.objective, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn reports_infeasible_programs() {
        let c = array![1.0];
        let a_eq = array![[1.0]];
        let b_eq = array![-1.0];
        let (a_ub, b_ub) = no_rows(1);
        let err = solve_standard_form(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &SolverOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::Infeasible { .. }));
        assert_eq!(err.kind(), ErrorKind::Solver);
    }

    #[test]
    fn reports_unbounded_programs() {
        // min -x  s.t.  x - y <= 1
        let c = array![-1.0, 0.0];
        let (a_eq, b_eq) = no_rows(2);
        let a_ub = array![[1.0, -1.0]];
        let b_ub = array![1.0];
        let err = solve_standard_form(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &SolverOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, SolverError::Unbounded);
    }

    #[test]
    fn respects_iteration_cap() {
        let c = array![-1.0, -1.0];
        let (a_eq, b_eq) = no_rows(2);
        let a_ub = array![[1.0, 2.0], [3.0, 1.0]];
        let b_ub = array![4.0, 6.0];
        let options = SolverOptions {
            max_iterations: 1,
            tolerance: 1e-9,
        };
        let err = solve_standard_form(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &options,
        )
        .unwrap_err();
        assert_eq!(err, SolverError::IterationLimit { max_iterations: 1 });
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let c = array![1.0, 1.0, 1.0];
        let (a_eq, b_eq) = no_rows(2);
        let a_ub = array![[1.0, 2.0]];
        let b_ub = array![4.0];
        let err = solve_standard_form(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &SolverOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::InvalidProblem(_)));
    }

    fn solve_both(
        c: &Array1<f64>,
        a_eq: &Array2<f64>,
        b_eq: &Array1<f64>,
        a_ub: &Array2<f64>,
        b_ub: &Array1<f64>,
    ) -> (LpSolution, LpSolution) {
        let options = SolverOptions::default();
        let primal = solve_standard_form(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &options,
        )
        .unwrap();
        let dual = solve_via_dual(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &options,
        )
        .unwrap();
        (primal, dual)
    }

    #[test]
    fn beale_cycling_example_terminates() {
        // Cycles under Dantzig's rule with naive tie breaking.
        let c = array![-0.75, 20.0, -0.5, 6.0];
        let (a_eq, b_eq) = no_rows(4);
        let a_ub = array![
            [0.25, -8.0, -1.0, 9.0],
            [0.5, -12.0, -0.5, 3.0],
            [0.0, 0.0, 1.0, 0.0]
        ];
        let b_ub = array![0.0, 0.0, 1.0];
        let (primal, dual) = solve_both(&c, &a_eq, &b_eq, &a_ub, &b_ub);
        for sol in [&primal, &dual] {
            assert_abs_diff_eq!(sol.objective, -1.25, epsilon = 1e-7);
            let slack = &b_ub - &a_ub.dot(&sol.x);
            assert!(slack.iter().all(|&v| v > -1e-8), "infeasible point {}", sol.x);
        }
    }

    #[test]
    fn dual_route_matches_primal_optimum() {
        let c = array![2.0, 3.0];
        let a_eq = array![[1.0, 1.0]];
        let b_eq = array![4.0];
        let a_ub = array![[-1.0, 0.0], [1.0, 0.0]];
        let b_ub = array![-1.0, 3.0];
        let (primal, dual) = solve_both(&c, &a_eq, &b_eq, &a_ub, &b_ub);
        assert_abs_diff_eq!(dual.x[0], 3.0, epsilon = 1e-8);
        assert_abs_diff_eq!(dual.x[1], 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(dual.objective, primal.objective, epsilon = 1e-8);

        let c = array![-1.0, -1.0];
        let (a_eq, b_eq) = no_rows(2);
        let a_ub = array![[1.0, 2.0], [3.0, 1.0]];
        let b_ub = array![4.0, 6.0];
        let (_, dual) = solve_both(&c, &a_eq, &b_eq, &a_ub, &b_ub);
        assert_abs_diff_eq!(dual.x[0], 1.6, epsilon = 1e-8);
        assert_abs_diff_eq!(dual.x[1], 1.2, epsilon = 1e-8);

        let c = array![0.0, 1.0];
        let a_eq = array![[1.0, -1.0]];
        let b_eq = array![-2.0];
        let (a_ub, b_ub) = no_rows(2);
        let (_, dual) = solve_both(&c, &a_eq, &b_eq, &a_ub, &b_ub);
        assert_abs_diff_eq!(dual.x[1] - dual.x[0], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(dual.objective, 2.0, epsilon = 1e-8);
    }

    #[test]
    fn dual_route_reports_primal_failures() {
        let c = array![1.0];
        let a_eq = array![[1.0]];
        let b_eq = array![-1.0];
        let (a_ub, b_ub) = no_rows(1);
        let err = solve_via_dual(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &SolverOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::Infeasible { .. }));

        let c = array![-1.0, 0.0];
        let (a_eq, b_eq) = no_rows(2);
        let a_ub = array![[1.0, -1.0]];
        let b_ub = array![1.0];
        let err = solve_via_dual(
            c.view(),
            a_eq.view(),
            b_eq.view(),
            a_ub.view(),
            b_ub.view(),
            &SolverOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, SolverError::Unbounded);
    }

    #[test]
    fn options_follow_fit_config() {
        let cfg = LpFitConfig {
            max_iterations: 42,
            tolerance: 1e-7,
            ..LpFitConfig::default()
        };
        let options = SolverOptions::from(&cfg);
        assert_eq!(options.max_iterations, 42);
        assert_eq!(options.tolerance, 1e-7);
    }
}

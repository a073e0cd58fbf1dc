#![deny(dead_code)]
#![deny(unused_imports)]

pub mod basis;
pub mod construction;
pub mod diagnostics;
pub mod distribution;
pub mod estimate;
pub mod fixture;
pub mod simplex;
pub mod types;

pub use basis::{
    BasisError, DerivativeBasis, MAX_GRID_POINTS, MIN_TERMS, build_derivative_basis,
    build_metalog_basis, derivative_grid, logit, metalog_term_derivative, metalog_term_value,
    signed_expansion,
};
pub use construction::{
    ConstructionError, LpProblem, assemble_lp_problem, assemble_metalog_lp, build_error_matrix,
};
pub use diagnostics::{
    DiagnosticsError, TermTables, write_constraint_tables, write_matrix_table,
    write_term_sweep_tables,
};
pub use distribution::{Metalog, MetalogValidation};
pub use estimate::{
    FitError, MetalogLpFit, fit_lp_problem, fit_metalog_lp, fit_metalog_lp_terms,
    recover_coefficients,
};
pub use fixture::{CdfFixture, FixtureError, load_fixtures, parse_fixtures};
pub use simplex::{
    DenseSimplex, LpSolution, LpSolver, SolverError, SolverOptions, solve_standard_form,
    solve_via_dual,
};
pub use types::{ErrorKind, LpFitConfig};

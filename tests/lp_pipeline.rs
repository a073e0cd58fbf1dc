use metalog_lp::{
    DenseSimplex, ErrorKind, LpFitConfig, LpSolver, SolverOptions, assemble_metalog_lp,
    build_metalog_basis, derivative_grid, fit_lp_problem, fit_metalog_lp, fit_metalog_lp_terms,
    recover_coefficients,
};
use ndarray::{Array1, array};

fn scenario_config() -> LpFitConfig {
    LpFitConfig::with_grid(0.001, 0.01)
}

#[test]
fn worked_scenario_assembles_expected_shapes() {
    let y = array![0.1, 0.3, 0.5, 0.7, 0.9];
    let z = array![1.0, 2.0, 3.0, 4.0, 5.0];
    let lp = assemble_metalog_lp(y.view(), z.view(), 4, &scenario_config())
        .expect("worked scenario should assemble");
    assert_eq!(lp.a_eq.dim(), (5, 18));
    assert_eq!(lp.a_ub.dim(), (99, 18));
    assert_eq!(lp.objective.sum(), 10.0);
    assert_eq!(lp.num_variables(), 18);
    assert_eq!(lp.num_grid_points(), 99);
}

#[test]
fn solved_scenario_satisfies_every_constraint() {
    let y = array![0.1, 0.3, 0.5, 0.7, 0.9];
    let z = array![1.0, 2.0, 3.0, 4.0, 5.0];
    let cfg = scenario_config();
    let lp = assemble_metalog_lp(y.view(), z.view(), 4, &cfg).unwrap();
    let sol = DenseSimplex
        .solve(&lp, &SolverOptions::from(&cfg))
        .expect("scenario LP should be solvable");

    assert!(sol.x.iter().all(|&v| v >= 0.0));
    let eq_resid = &lp.a_eq.dot(&sol.x) - &lp.b_eq;
    assert!(eq_resid.iter().all(|r| r.abs() < 1e-7), "equality residual {eq_resid}");
    let ub_slack = &lp.b_ub - &lp.a_ub.dot(&sol.x);
    assert!(ub_slack.iter().all(|&s| s > -1e-7));

    let a = recover_coefficients(sol.x.view(), 5, 4).unwrap();
    assert!(a[0] > 0.0, "intercept should be positive, got {a}");
    assert!(a[3] > 0.0, "linear term should be positive, got {a}");
}

#[test]
fn default_grid_fits_every_term_count() {
    let y = array![0.1, 0.3, 0.5, 0.7, 0.9];
    let z = array![1.0, 2.0, 3.0, 4.0, 5.0];
    let cfg = LpFitConfig::default();
    for terms in 2..=8 {
        let fit = fit_metalog_lp(y.view(), z.view(), terms, &cfg, &DenseSimplex)
            .unwrap_or_else(|e| panic!("{terms}-term fit failed: {e}"));
        assert_eq!(fit.coefficients.len(), terms);
        assert!(fit.iterations <= cfg.max_iterations);
        if terms >= 4 {
            assert!(
                fit.total_abs_error < 1e-6,
                "{terms}-term fit left error {}",
                fit.total_abs_error
            );
        }
    }
}

#[test]
fn skewed_data_keeps_density_bound_on_default_grid() {
    let y = array![0.05, 0.1, 0.2, 0.35, 0.5, 0.65, 0.8, 0.9, 0.95];
    let z = array![0.3, 0.5, 0.8, 1.2, 1.6, 2.1, 3.0, 4.2, 5.5];
    let cfg = LpFitConfig::default();
    let grid = derivative_grid(cfg.diff_step).unwrap();
    let results = fit_metalog_lp_terms(y.view(), z.view(), &[5, 7, 8], &cfg, &DenseSimplex);
    for (terms, result) in results {
        let fit = result.unwrap_or_else(|e| panic!("{terms}-term fit failed: {e}"));
        let m = fit.metalog();
        for &p in grid.iter() {
            let density = m.quantile_density(p);
            assert!(
                density >= cfg.diff_error - 1e-6,
                "{terms}-term fit has density {density} at p={p}"
            );
        }
    }
}

#[test]
fn non_monotone_data_is_fitted_with_positive_density() {
    let y = array![0.1, 0.3, 0.5, 0.7, 0.9];
    let z = array![5.0, 4.0, 3.0, 2.0, 1.0];
    let cfg = LpFitConfig::with_grid(0.01, 0.02);
    let fit = fit_metalog_lp(y.view(), z.view(), 4, &cfg, &DenseSimplex).unwrap();
    assert!(fit.total_abs_error > 1.0);

    let m = fit.metalog();
    for i in 1..50 {
        let p = i as f64 * 0.02;
        assert!(m.quantile_density(p) >= 0.01 - 1e-6, "density below bound at p={p}");
    }
}

#[test]
fn objective_equals_absolute_residuals() {
    let y = array![0.05, 0.2, 0.4, 0.5, 0.65, 0.8, 0.95];
    let z = array![-3.0, -0.8, 0.4, 0.1, 1.5, 2.0, 6.5];
    let cfg = LpFitConfig::with_grid(0.001, 0.02);
    let lp = assemble_metalog_lp(y.view(), z.view(), 3, &cfg).unwrap();
    let fit = fit_lp_problem(&lp, &cfg, &DenseSimplex).unwrap();

    let basis = build_metalog_basis(y.view(), 3).unwrap();
    let fitted: Array1<f64> = basis.dot(&fit.coefficients);
    let abs_error: f64 = (&fitted - &z).iter().map(|r| r.abs()).sum();
    assert!((abs_error - fit.total_abs_error).abs() < 1e-6);
}

#[test]
fn error_taxonomy_is_exposed_through_fit_errors() {
    let z = array![1.0, 2.0, 3.0];
    let cfg = scenario_config();

    let edge = array![0.0, 0.5, 0.9];
    let err = fit_metalog_lp(edge.view(), z.view(), 3, &cfg, &DenseSimplex).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Domain);

    let y = array![0.1, 0.5, 0.9];
    let err = fit_metalog_lp(y.view(), z.view(), 1, &cfg, &DenseSimplex).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);

    let coarse = LpFitConfig::with_grid(0.001, 1.0);
    let err = fit_metalog_lp(y.view(), z.view(), 3, &coarse, &DenseSimplex).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);

    let starved = LpFitConfig {
        max_iterations: 1,
        ..scenario_config()
    };
    let err = fit_metalog_lp(y.view(), z.view(), 3, &starved, &DenseSimplex).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Solver);
}

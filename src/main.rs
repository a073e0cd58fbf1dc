use clap::{Args, Parser, Subcommand};
use metalog_lp::{
    CdfFixture, DenseSimplex, LpFitConfig, assemble_metalog_lp, fit_metalog_lp_terms,
    load_fixtures, write_constraint_tables, write_term_sweep_tables,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "metalog-lp")]
#[command(
    about = "Fit metalog distributions to empirical CDF points by linear programming",
    long_about = None
)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble, solve, and report coefficients for each term count.
    Fit(FitArgs),
    /// Assemble the LP and write A_eq / A_ub without solving.
    Assemble(AssembleArgs),
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Lower bound on the quantile density at every grid point.
    #[arg(long = "diff-error", default_value_t = 0.001)]
    diff_error: f64,
    /// Spacing of the density-constraint probability grid.
    #[arg(long = "diff-step", default_value_t = 0.001)]
    diff_step: f64,
}

#[derive(Args, Debug)]
struct FitArgs {
    fixture: PathBuf,
    #[arg(long = "fixture-index", default_value_t = 0)]
    fixture_index: usize,
    /// Comma-separated term counts; defaults to the fixture's list.
    #[arg(long = "terms", value_delimiter = ',')]
    terms: Option<Vec<usize>>,
    #[command(flatten)]
    grid: GridArgs,
    #[arg(long = "max-iterations", default_value_t = 5000)]
    max_iterations: usize,
    #[arg(long = "tolerance", default_value_t = 1.0e-5)]
    tolerance: f64,
    /// Also write the constraint tables for every term count here.
    #[arg(long = "dump-dir")]
    dump_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AssembleArgs {
    fixture: PathBuf,
    #[arg(long = "fixture-index", default_value_t = 0)]
    fixture_index: usize,
    /// Term count; defaults to the first entry of the fixture's list.
    #[arg(long = "terms")]
    terms: Option<usize>,
    #[command(flatten)]
    grid: GridArgs,
    #[arg(long = "out-dir", default_value = ".")]
    out_dir: PathBuf,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    match cli.command {
        Command::Fit(args) => run_fit(args),
        Command::Assemble(args) => run_assemble(args),
    }
}

fn select_fixture(path: &Path, index: usize) -> Result<CdfFixture, String> {
    let mut fixtures = load_fixtures(path).map_err(|e| e.to_string())?;
    if index >= fixtures.len() {
        return Err(format!(
            "fixture index {index} is out of range; '{}' holds {} fixtures",
            path.display(),
            fixtures.len()
        ));
    }
    Ok(fixtures.swap_remove(index))
}

fn run_fit(args: FitArgs) -> Result<(), String> {
    let fixture = select_fixture(&args.fixture, args.fixture_index)?;
    let term_counts = args.terms.unwrap_or_else(|| fixture.terms.clone());
    let config = LpFitConfig {
        diff_error: args.grid.diff_error,
        diff_step: args.grid.diff_step,
        max_iterations: args.max_iterations,
        tolerance: args.tolerance,
    };
    let y = fixture.probabilities();
    let z = fixture.data();

    if let Some(dir) = &args.dump_dir {
        let written = write_term_sweep_tables(dir, y.view(), z.view(), &term_counts, &config)
            .map_err(|e| e.to_string())?;
        for (terms, tables) in written {
            if let Err(e) = tables {
                eprintln!("terms={terms}: constraint tables not written ({e})");
            }
        }
    }

    let results = fit_metalog_lp_terms(y.view(), z.view(), &term_counts, &config, &DenseSimplex);
    let mut successes = 0usize;
    for (terms, result) in results {
        match result {
            Ok(fit) => {
                successes += 1;
                let coefficients = fit
                    .coefficients
                    .iter()
                    .map(|a| format!("{a:.10}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "terms={terms} total_abs_error={:.6e} iterations={} validation={:?}",
                    fit.total_abs_error,
                    fit.iterations,
                    fit.metalog().validate()
                );
                println!("  a = [{coefficients}]");
            }
            Err(e) => println!("terms={terms} failed ({:?}): {e}", e.kind()),
        }
    }
    if successes == 0 {
        return Err("no term count produced a metalog fit".to_string());
    }
    Ok(())
}

fn run_assemble(args: AssembleArgs) -> Result<(), String> {
    let fixture = select_fixture(&args.fixture, args.fixture_index)?;
    let terms = match args.terms.or_else(|| fixture.terms.first().copied()) {
        Some(t) => t,
        None => return Err("fixture lists no term counts; pass --terms".to_string()),
    };
    let config = LpFitConfig::with_grid(args.grid.diff_error, args.grid.diff_step);
    let problem = assemble_metalog_lp(
        fixture.probabilities().view(),
        fixture.data().view(),
        terms,
        &config,
    )
    .map_err(|e| e.to_string())?;
    let (eq_path, ub_path) =
        write_constraint_tables(&args.out_dir, &problem).map_err(|e| e.to_string())?;
    println!(
        "A_eq {}x{} -> {}",
        problem.a_eq.nrows(),
        problem.a_eq.ncols(),
        eq_path.display()
    );
    println!(
        "A_ub {}x{} -> {}",
        problem.a_ub.nrows(),
        problem.a_ub.ncols(),
        ub_path.display()
    );
    Ok(())
}

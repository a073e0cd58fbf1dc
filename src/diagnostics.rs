use crate::construction::{ConstructionError, LpProblem, assemble_metalog_lp};
use crate::types::{ErrorKind, LpFitConfig};
use csv::WriterBuilder;
use ndarray::{ArrayView1, ArrayView2};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const A_EQ_FILE: &str = "A_eq.csv";
pub const A_UB_FILE: &str = "A_ub.csv";

#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("failed to prepare output directory '{path}': {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write table '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to flush table '{path}': {source}")]
    Flush {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DiagnosticsError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Io
    }
}

/// Write `matrix` as a header-less comma-delimited table, one row per line.
pub fn write_matrix_table(
    path: &Path,
    matrix: ArrayView2<'_, f64>,
) -> Result<(), DiagnosticsError> {
    let display = path.display().to_string();
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|source| DiagnosticsError::Write {
            path: display.clone(),
            source,
        })?;
    for row in matrix.rows() {
        let record = row.iter().map(|v| format!("{v:.12e}")).collect::<Vec<_>>();
        wtr.write_record(&record)
            .map_err(|source| DiagnosticsError::Write {
                path: display.clone(),
                source,
            })?;
    }
    wtr.flush().map_err(|source| DiagnosticsError::Flush {
        path: display,
        source,
    })?;
    Ok(())
}

/// Persist `A_eq` and `A_ub` of `problem` under `dir`, creating it if needed.
pub fn write_constraint_tables(
    dir: &Path,
    problem: &LpProblem,
) -> Result<(PathBuf, PathBuf), DiagnosticsError> {
    fs::create_dir_all(dir).map_err(|source| DiagnosticsError::Directory {
        path: dir.display().to_string(),
        source,
    })?;
    let eq_path = dir.join(A_EQ_FILE);
    let ub_path = dir.join(A_UB_FILE);
    write_matrix_table(&eq_path, problem.a_eq.view())?;
    write_matrix_table(&ub_path, problem.a_ub.view())?;
    log::debug!(
        "wrote constraint tables {} and {}",
        eq_path.display(),
        ub_path.display()
    );
    Ok((eq_path, ub_path))
}

/// Table paths written for one term count, or the reason it was skipped.
pub type TermTables = (usize, Result<(PathBuf, PathBuf), ConstructionError>);

/// Assemble every entry of `term_counts` and write its tables under
/// `dir/terms_<k>/`. A count that fails to assemble is reported in its slot
/// and the others are still written; only I/O failures stop the sweep.
pub fn write_term_sweep_tables(
    dir: &Path,
    probabilities: ArrayView1<'_, f64>,
    data: ArrayView1<'_, f64>,
    term_counts: &[usize],
    config: &LpFitConfig,
) -> Result<Vec<TermTables>, DiagnosticsError> {
    let mut written = Vec::with_capacity(term_counts.len());
    for &terms in term_counts {
        match assemble_metalog_lp(probabilities, data, terms, config) {
            Ok(problem) => {
                let target = dir.join(format!("terms_{terms}"));
                written.push((terms, Ok(write_constraint_tables(&target, &problem)?)));
            }
            Err(err) => {
                log::warn!("skipping constraint tables for {terms} terms: {err}");
                written.push((terms, Err(err)));
            }
        }
    }
    Ok(written)
}

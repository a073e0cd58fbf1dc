use crate::types::ErrorKind;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("failed to read fixture file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("fixture {index} is invalid: {reason}")]
    Invalid { index: usize, reason: String },
}

impl FixtureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FixtureError::Read { .. } | FixtureError::Parse(_) => ErrorKind::Io,
            FixtureError::Invalid { .. } => ErrorKind::Config,
        }
    }
}

/// One empirical CDF to fit, with the term counts to try.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdfFixture {
    /// Cumulative probabilities, each in (0, 1).
    pub cdf_y: Vec<f64>,
    /// Empirical values at `cdf_y`.
    pub cdf_x: Vec<f64>,
    pub terms: Vec<usize>,
}

impl CdfFixture {
    pub fn probabilities(&self) -> Array1<f64> {
        Array1::from_vec(self.cdf_y.clone())
    }

    pub fn data(&self) -> Array1<f64> {
        Array1::from_vec(self.cdf_x.clone())
    }

    /// Structural checks only; value-domain checks happen during assembly.
    pub fn validate(&self, index: usize) -> Result<(), FixtureError> {
        if self.cdf_y.len() != self.cdf_x.len() {
            return Err(FixtureError::Invalid {
                index,
                reason: format!(
                    "cdf_y has {} entries but cdf_x has {}",
                    self.cdf_y.len(),
                    self.cdf_x.len()
                ),
            });
        }
        if self.cdf_y.is_empty() {
            return Err(FixtureError::Invalid {
                index,
                reason: "no CDF points".to_string(),
            });
        }
        if self.terms.is_empty() {
            return Err(FixtureError::Invalid {
                index,
                reason: "no term counts to fit".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse a JSON array of fixtures and validate each record.
pub fn parse_fixtures(payload: &str) -> Result<Vec<CdfFixture>, FixtureError> {
    let fixtures: Vec<CdfFixture> = serde_json::from_str(payload)?;
    for (index, fixture) in fixtures.iter().enumerate() {
        fixture.validate(index)?;
    }
    Ok(fixtures)
}

pub fn load_fixtures(path: &Path) -> Result<Vec<CdfFixture>, FixtureError> {
    let payload = fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let fixtures = parse_fixtures(&payload)?;
    log::debug!("loaded {} fixtures from {}", fixtures.len(), path.display());
    Ok(fixtures)
}

//! Errors for ensemble combination (prediction-table validation, key-set
//! agreement, and draw alignment).
//!
//! Key-set disagreement between candidate tables is a data-integrity error:
//! the combine aborts rather than silently dropping unmatched keys, because a
//! partial join would bias every downstream summary. All variants implement
//! `Display`/`Error` and — behind the `python-bindings` feature — convert to
//! `PyErr`.

use crate::ensemble::keys::PredictionKey;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, PyErr};

/// Crate-wide result alias for ensemble operations.
pub type EnsembleResult<T> = Result<T, EnsembleError>;

/// Unified error type for the ensemble layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EnsembleError {
    // ---- Table construction ----
    /// A prediction table has no rows.
    EmptyPredictions,

    /// Keys and values have different lengths.
    LengthMismatch { keys: usize, values: usize },

    /// The same (time, spatial-unit) key occurs twice.
    DuplicateKey { position: usize, key: PredictionKey },

    /// A predicted value is NaN or ±∞.
    NonFiniteValue { position: usize, value: f64 },

    // ---- Combination ----
    /// No candidate tables were supplied.
    EmptyCandidateSet,

    /// Weight vector length disagrees with the candidate count.
    WeightLengthMismatch { expected: usize, actual: usize },

    /// Candidate metadata and prediction tables disagree in count.
    CandidateCountMismatch { expected: usize, actual: usize },

    /// A candidate table covers a different number of keys.
    KeyCountMismatch { candidate_index: usize, expected: usize, actual: usize },

    /// Candidate tables disagree on the key at some position.
    KeyMismatch {
        candidate_index: usize,
        position: usize,
        expected: PredictionKey,
        found: PredictionKey,
    },

    /// A candidate carries a different number of simulation draws.
    DrawCountMismatch { candidate_index: usize, expected: usize, actual: usize },

    // ---- Draw subsampling ----
    /// More draws were requested than are available.
    DrawSampleTooLarge { requested: usize, available: usize },

    /// Zero draws requested.
    EmptyDrawSample,

    // ---- Overlap ----
    /// A surface used as a density has negative mass at some key.
    NegativeDensity { position: usize, value: f64 },

    /// A surface used as a density has no positive mass to normalize.
    ZeroMassDensity,
}

impl std::error::Error for EnsembleError {}

impl std::fmt::Display for EnsembleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnsembleError::EmptyPredictions => {
                write!(f, "Prediction table has no rows")
            }
            EnsembleError::LengthMismatch { keys, values } => {
                write!(f, "Prediction table has {keys} keys but {values} values")
            }
            EnsembleError::DuplicateKey { position, key } => {
                write!(f, "Duplicate prediction key {key} at position {position}")
            }
            EnsembleError::NonFiniteValue { position, value } => {
                write!(f, "Non-finite predicted value at position {position}: {value}")
            }
            EnsembleError::EmptyCandidateSet => {
                write!(f, "Ensemble combination requires at least one candidate table")
            }
            EnsembleError::WeightLengthMismatch { expected, actual } => {
                write!(f, "Weight vector covers {actual} candidates, expected {expected}")
            }
            EnsembleError::CandidateCountMismatch { expected, actual } => {
                write!(
                    f,
                    "Candidate metadata covers {actual} candidates, expected {expected}"
                )
            }
            EnsembleError::KeyCountMismatch { candidate_index, expected, actual } => {
                write!(
                    f,
                    "Candidate {candidate_index} covers {actual} keys, expected {expected}; \
                     candidate tables must share an identical key set"
                )
            }
            EnsembleError::KeyMismatch { candidate_index, position, expected, found } => {
                write!(
                    f,
                    "Candidate {candidate_index} has key {found} at position {position}, \
                     expected {expected}; candidate tables must share an identical key set"
                )
            }
            EnsembleError::DrawCountMismatch { candidate_index, expected, actual } => {
                write!(
                    f,
                    "Candidate {candidate_index} carries {actual} draws, expected {expected}"
                )
            }
            EnsembleError::DrawSampleTooLarge { requested, available } => {
                write!(f, "Requested {requested} draws but only {available} are available")
            }
            EnsembleError::EmptyDrawSample => {
                write!(f, "Requested zero draws")
            }
            EnsembleError::NegativeDensity { position, value } => {
                write!(f, "Negative density value at position {position}: {value}")
            }
            EnsembleError::ZeroMassDensity => {
                write!(f, "Surface has no positive mass to normalize")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<EnsembleError> for PyErr {
    fn from(err: EnsembleError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

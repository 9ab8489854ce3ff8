//! Errors for likelihood-weighted model stacking (matrix construction, fold
//! handling, weight invariants, and optimizer failures).
//!
//! This module defines the stacking error type, [`StackingError`], used across
//! the stacking core and — when the `python-bindings` feature is enabled —
//! converted to `PyErr` at the PyO3 boundary.
//!
//! ## Conventions
//! - **Indices are 0-based** (rows = observations, columns = candidates).
//! - Held-out log-likelihood cells may be any finite real or `−∞`
//!   (an underflowed likelihood); `NaN` and `+∞` are rejected at
//!   construction.
//! - Optimizer/backend failures are normalized to
//!   [`StackingError::OptimizationFailed`] with a human-readable status so
//!   callers can distinguish them and apply the uniform-weight fallback.

use crate::optimization::errors::OptError;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, PyErr};

/// Crate-wide result alias for stacking operations.
pub type StackingResult<T> = Result<T, StackingError>;

/// Unified error type for the stacking layer.
#[derive(Debug, Clone, PartialEq)]
pub enum StackingError {
    // ---- Matrix construction ----
    /// No candidate models were supplied.
    NoCandidates,

    /// A candidate's held-out vector is empty.
    EmptyHeldOut { candidate_index: usize },

    /// A candidate's held-out vector length disagrees with the first
    /// candidate's.
    ObservationCountMismatch { candidate_index: usize, expected: usize, actual: usize },

    /// A candidate's fold assignment disagrees with the first candidate's at
    /// some observation.
    FoldAlignmentMismatch { candidate_index: usize, row: usize, expected: u32, actual: u32 },

    /// Fold assignment length disagrees with the observation count.
    FoldLengthMismatch { expected: usize, actual: usize },

    /// A log-likelihood cell is NaN or +∞ (−∞ is legal and filtered later).
    InvalidLogLik { row: usize, candidate_index: usize, value: f64, reason: &'static str },

    // ---- Fold restriction ----
    /// A requested fold id does not occur in the matrix.
    UnknownFold { fold: u32 },

    /// Restricting to the requested folds left no observations.
    EmptyFoldSubset,

    // ---- Weights ----
    /// Weight vector length disagrees with the candidate count.
    WeightLengthMismatch { expected: usize, actual: usize },

    /// A weight falls outside [0, 1] or is non-finite.
    InvalidWeight { index: usize, value: f64, reason: &'static str },

    /// Weights do not sum to 1 within tolerance.
    WeightSumMismatch { sum: f64 },

    /// Cannot build weights for an empty candidate set.
    EmptyWeightVector,

    // ---- Options ----
    /// The exclusion warning threshold must lie in [0, 1].
    InvalidExclusionThreshold { value: f64 },

    // ---- Estimation ----
    /// Stacking optimization failed or did not converge; carries a
    /// human-readable status. Callers fall back to uniform weights.
    OptimizationFailed { status: String },

    /// Weights requested before `fit` succeeded.
    NotFitted,
}

impl std::error::Error for StackingError {}

impl std::fmt::Display for StackingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackingError::NoCandidates => {
                write!(f, "Stacking requires at least one candidate model")
            }
            StackingError::EmptyHeldOut { candidate_index } => {
                write!(f, "Candidate {candidate_index} has an empty held-out vector")
            }
            StackingError::ObservationCountMismatch { candidate_index, expected, actual } => {
                write!(
                    f,
                    "Candidate {candidate_index} has {actual} held-out observations, \
                     expected {expected}"
                )
            }
            StackingError::FoldAlignmentMismatch { candidate_index, row, expected, actual } => {
                write!(
                    f,
                    "Candidate {candidate_index} assigns observation {row} to fold {actual}, \
                     but the reference candidate assigns fold {expected}"
                )
            }
            StackingError::FoldLengthMismatch { expected, actual } => {
                write!(f, "Fold assignment length mismatch: expected {expected}, actual {actual}")
            }
            StackingError::InvalidLogLik { row, candidate_index, value, reason } => {
                write!(
                    f,
                    "Invalid log-likelihood at observation {row}, candidate {candidate_index}: \
                     {value}: {reason}"
                )
            }
            StackingError::UnknownFold { fold } => {
                write!(f, "Fold {fold} does not occur in the likelihood matrix")
            }
            StackingError::EmptyFoldSubset => {
                write!(f, "Fold restriction left no observations")
            }
            StackingError::WeightLengthMismatch { expected, actual } => {
                write!(f, "Weight vector length mismatch: expected {expected}, actual {actual}")
            }
            StackingError::InvalidWeight { index, value, reason } => {
                write!(f, "Invalid weight at index {index}: {value}: {reason}")
            }
            StackingError::WeightSumMismatch { sum } => {
                write!(f, "Weights must sum to 1, got {sum}")
            }
            StackingError::EmptyWeightVector => {
                write!(f, "Cannot build a weight vector for zero candidates")
            }
            StackingError::InvalidExclusionThreshold { value } => {
                write!(f, "Exclusion warning threshold must lie in [0, 1], got {value}")
            }
            StackingError::OptimizationFailed { status } => {
                write!(f, "Stacking failed: {status}")
            }
            StackingError::NotFitted => {
                write!(f, "Stacking weights requested before a successful fit")
            }
        }
    }
}

impl From<OptError> for StackingError {
    fn from(err: OptError) -> Self {
        StackingError::OptimizationFailed { status: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<StackingError> for PyErr {
    fn from(err: StackingError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

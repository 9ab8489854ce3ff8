//! Validated stacking weight vectors.
//!
//! Purpose
//! -------
//! Represent the convex combination produced by stacking: one non-negative
//! weight per candidate, summing to one. Invariants are enforced at
//! construction so the ensemble layer can blend without re-checking, and the
//! provenance of the weights (optimized vs uniform fallback) travels with the
//! vector so downstream reports can tell the two apart.
//!
//! Mapping conventions
//! -------------------
//! - Optimizer space stores unconstrained logits; `from_theta` applies the
//!   max-shift softmax so the simplex constraints hold for any finite input.
//! - `to_theta` returns clamped logs of the weights; the softmax's shift
//!   invariance makes any such preimage equivalent.

use crate::{
    optimization::numerical_stability::{
        safe_softmax, weights_to_logits, WEIGHT_SUM_TOL,
    },
    stacking::errors::{StackingError, StackingResult},
};
use ndarray::{Array1, ArrayView1};

/// How a weight vector was produced.
///
/// Variants:
/// - `Optimized`: solved by maximizing total held-out log-likelihood.
/// - `UniformFallback`: 1/K weights substituted after a failed optimization.
///   Downstream output must preserve this distinction — a fallback changes
///   ensemble results and must never masquerade as a fitted solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightSource {
    Optimized,
    UniformFallback,
}

/// Non-negative, unit-sum weights over a candidate set.
///
/// Invariants (validated at construction):
/// - length ≥ 1,
/// - each entry finite and in [0, 1],
/// - entries sum to 1 within [`WEIGHT_SUM_TOL`].
#[derive(Debug, Clone, PartialEq)]
pub struct StackingWeights {
    weights: Array1<f64>,
    source: WeightSource,
}

impl StackingWeights {
    /// Construct validated weights from raw values.
    ///
    /// # Errors
    /// - [`StackingError::EmptyWeightVector`] for a zero-length vector.
    /// - [`StackingError::InvalidWeight`] for a non-finite or out-of-range
    ///   entry.
    /// - [`StackingError::WeightSumMismatch`] when the sum strays from 1 by
    ///   more than [`WEIGHT_SUM_TOL`].
    pub fn new(weights: Array1<f64>, source: WeightSource) -> StackingResult<StackingWeights> {
        if weights.is_empty() {
            return Err(StackingError::EmptyWeightVector);
        }
        for (index, &value) in weights.iter().enumerate() {
            if !value.is_finite() {
                return Err(StackingError::InvalidWeight {
                    index,
                    value,
                    reason: "Weights must be finite.",
                });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(StackingError::InvalidWeight {
                    index,
                    value,
                    reason: "Weights must lie in [0, 1].",
                });
            }
        }
        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOL {
            return Err(StackingError::WeightSumMismatch { sum });
        }
        Ok(StackingWeights { weights, source })
    }

    /// Uniform 1/K weights, tagged [`WeightSource::UniformFallback`].
    ///
    /// # Errors
    /// - [`StackingError::EmptyWeightVector`] when `k == 0`.
    pub fn uniform(k: usize) -> StackingResult<StackingWeights> {
        if k == 0 {
            return Err(StackingError::EmptyWeightVector);
        }
        let weights = Array1::from_elem(k, 1.0 / k as f64);
        Ok(StackingWeights { weights, source: WeightSource::UniformFallback })
    }

    /// Map converged optimizer logits onto the simplex.
    ///
    /// The softmax output satisfies the simplex invariants for any finite
    /// input, so this goes through [`StackingWeights::new`] only as a final
    /// guard against non-finite logits slipping through.
    pub fn from_theta(theta: ArrayView1<f64>) -> StackingResult<StackingWeights> {
        StackingWeights::new(safe_softmax(theta), WeightSource::Optimized)
    }

    /// Clamped log-weights; a softmax preimage of this vector.
    pub fn to_theta(&self) -> Array1<f64> {
        weights_to_logits(self.weights.view())
    }

    /// Weight values in candidate (column) order.
    pub fn values(&self) -> ArrayView1<f64> {
        self.weights.view()
    }

    /// Number of candidates covered.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True when the vector covers zero candidates (never constructible).
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Provenance of the vector.
    pub fn source(&self) -> WeightSource {
        self.source
    }
}

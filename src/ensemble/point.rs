//! Point-estimate prediction tables and their weighted combination.
//!
//! Purpose
//! -------
//! Hold one candidate's per-(time, spatial-unit) point predictions in a
//! validated, key-sorted table, and blend K such tables into an ensemble
//! table using a stacking weight vector.
//!
//! Key behaviors
//! -------------
//! - [`PointPredictions::new`] sorts rows by key, rejects duplicate keys and
//!   non-finite values, so downstream code can compare tables positionally.
//! - [`combine_points`] forms the weighted arithmetic mean per key. All K
//!   tables must cover the identical key set; any disagreement aborts with a
//!   key-mismatch error rather than silently dropping rows.
//!
//! Conventions
//! -----------
//! - Weights are assumed validated by [`StackingWeights`] (unit sum), so the
//!   weighted sum *is* the weighted mean; no renormalization happens here.
//! - The uniform-weight fallback is represented upstream by a
//!   `UniformFallback`-tagged weight vector; the combiner treats it like any
//!   other weights.

use crate::{
    ensemble::{
        errors::{EnsembleError, EnsembleResult},
        keys::PredictionKey,
    },
    stacking::StackingWeights,
};
use ndarray::Array1;

/// A key-sorted table of point predictions for one candidate (or a blend).
#[derive(Debug, Clone, PartialEq)]
pub struct PointPredictions {
    keys: Vec<PredictionKey>,
    values: Array1<f64>,
    candidate: Option<String>,
}

impl PointPredictions {
    /// Construct a validated, key-sorted table.
    ///
    /// Rows are jointly sorted by key; the input order carries no meaning.
    ///
    /// # Errors
    /// - [`EnsembleError::EmptyPredictions`] for a table with no rows.
    /// - [`EnsembleError::LengthMismatch`] when keys and values disagree in
    ///   length.
    /// - [`EnsembleError::NonFiniteValue`] for the first NaN/±∞ value
    ///   (position refers to the input order).
    /// - [`EnsembleError::DuplicateKey`] when two rows share a key (position
    ///   refers to the sorted order).
    pub fn new(
        keys: Vec<PredictionKey>, values: Array1<f64>, candidate: Option<String>,
    ) -> EnsembleResult<PointPredictions> {
        if keys.is_empty() {
            return Err(EnsembleError::EmptyPredictions);
        }
        if keys.len() != values.len() {
            return Err(EnsembleError::LengthMismatch { keys: keys.len(), values: values.len() });
        }
        for (position, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(EnsembleError::NonFiniteValue { position, value });
            }
        }
        let mut rows: Vec<(PredictionKey, f64)> =
            keys.into_iter().zip(values.iter().cloned()).collect();
        rows.sort_by_key(|(key, _)| *key);
        for (position, pair) in rows.windows(2).enumerate() {
            if pair[0].0 == pair[1].0 {
                return Err(EnsembleError::DuplicateKey { position, key: pair[1].0 });
            }
        }
        let keys = rows.iter().map(|(key, _)| *key).collect();
        let values = Array1::from_iter(rows.into_iter().map(|(_, value)| value));
        Ok(PointPredictions { keys, values, candidate })
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> &[PredictionKey] {
        &self.keys
    }

    /// Values aligned with [`PointPredictions::keys`].
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Candidate label, if any (`None` for blended tables).
    pub fn candidate(&self) -> Option<&str> {
        self.candidate.as_deref()
    }

    /// Number of (time, spatial-unit) rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when the table has no rows (never constructible).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Check that every candidate table covers the reference key set exactly.
///
/// Tables are key-sorted at construction, so agreement is a positional
/// comparison. Any disagreement is a data error and aborts the combine.
pub(crate) fn verify_key_agreement<'a, I>(reference: &[PredictionKey], tables: I) -> EnsembleResult<()>
where
    I: Iterator<Item = (usize, &'a [PredictionKey])>,
{
    for (candidate_index, keys) in tables {
        if keys.len() != reference.len() {
            return Err(EnsembleError::KeyCountMismatch {
                candidate_index,
                expected: reference.len(),
                actual: keys.len(),
            });
        }
        for (position, (&expected, &found)) in reference.iter().zip(keys.iter()).enumerate() {
            if expected != found {
                return Err(EnsembleError::KeyMismatch {
                    candidate_index,
                    position,
                    expected,
                    found,
                });
            }
        }
    }
    Ok(())
}

/// Blend K point-prediction tables into one ensemble table.
///
/// For each key, the output is the weighted arithmetic mean of the K
/// candidate values under `weights` (unit-sum by construction, so no
/// renormalization). The accumulation is a single `scaled_add` pass per
/// candidate over the whole value vector.
///
/// # Errors
/// - [`EnsembleError::EmptyCandidateSet`] for zero tables.
/// - [`EnsembleError::WeightLengthMismatch`] when `weights.len() != K`.
/// - [`EnsembleError::KeyCountMismatch`] / [`EnsembleError::KeyMismatch`]
///   when the tables do not share an identical key set.
pub fn combine_points(
    candidates: &[PointPredictions], weights: &StackingWeights,
) -> EnsembleResult<PointPredictions> {
    let first = candidates.first().ok_or(EnsembleError::EmptyCandidateSet)?;
    if weights.len() != candidates.len() {
        return Err(EnsembleError::WeightLengthMismatch {
            expected: candidates.len(),
            actual: weights.len(),
        });
    }
    verify_key_agreement(
        first.keys(),
        candidates.iter().enumerate().skip(1).map(|(i, c)| (i, c.keys())),
    )?;

    let mut blended = Array1::<f64>::zeros(first.len());
    for (&weight, candidate) in weights.values().iter().zip(candidates.iter()) {
        blended.scaled_add(weight, &candidate.values);
    }
    Ok(PointPredictions { keys: first.keys.clone(), values: blended, candidate: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacking::{StackingWeights, WeightSource};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Table construction (sorting, duplicate and non-finite rejection).
    // - Weighted-mean arithmetic, the degenerate one-hot case, and the
    //   uniform fallback mean.
    // - Key-set disagreement aborting the combine.
    //
    // They intentionally DO NOT cover:
    // - Simulation-mode blending (draws module tests).
    // -------------------------------------------------------------------------

    fn keys(cells: &[u64]) -> Vec<PredictionKey> {
        cells.iter().map(|&c| PredictionKey::new(2020, c)).collect()
    }

    fn table(cells: &[u64], values: Array1<f64>, id: &str) -> PointPredictions {
        PointPredictions::new(keys(cells), values, Some(id.to_string())).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify that construction sorts rows by key and rejects duplicates and
    // non-finite values.
    fn construction_sorts_and_validates() {
        let out =
            PointPredictions::new(keys(&[3, 1, 2]), array![30.0, 10.0, 20.0], None).unwrap();
        assert_eq!(out.keys()[0].cell, 1);
        assert_eq!(out.values()[0], 10.0);
        assert_eq!(out.values()[2], 30.0);

        assert!(matches!(
            PointPredictions::new(keys(&[1, 1]), array![1.0, 2.0], None),
            Err(EnsembleError::DuplicateKey { .. })
        ));
        assert!(matches!(
            PointPredictions::new(keys(&[1, 2]), array![1.0, f64::NAN], None),
            Err(EnsembleError::NonFiniteValue { position: 1, .. })
        ));
        assert!(matches!(
            PointPredictions::new(Vec::new(), array![], None),
            Err(EnsembleError::EmptyPredictions)
        ));
        assert!(matches!(
            PointPredictions::new(keys(&[1]), array![1.0, 2.0], None),
            Err(EnsembleError::LengthMismatch { keys: 1, values: 2 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify the weighted mean against a hand computation.
    //
    // Given
    // -----
    // - Two aligned tables and weights (0.25, 0.75).
    //
    // Expect
    // ------
    // - Each blended value equals 0.25·a + 0.75·b within 1e-12.
    fn weighted_mean_matches_hand_computation() {
        // Arrange
        let a = table(&[1, 2], array![4.0, 8.0], "a");
        let b = table(&[1, 2], array![0.0, 4.0], "b");
        let weights =
            StackingWeights::new(array![0.25, 0.75], WeightSource::Optimized).unwrap();

        // Act
        let blended = combine_points(&[a, b], &weights).unwrap();

        // Assert
        assert!((blended.values()[0] - 1.0).abs() < 1e-12);
        assert!((blended.values()[1] - 5.0).abs() < 1e-12);
        assert!(blended.candidate().is_none());
    }

    #[test]
    // Purpose
    // -------
    // Verify that a degenerate all-weight-on-one-candidate vector reproduces
    // that candidate's table exactly.
    fn one_hot_weights_reproduce_single_candidate() {
        let a = table(&[1, 2, 3], array![1.5, 2.5, 3.5], "a");
        let b = table(&[1, 2, 3], array![9.0, 9.0, 9.0], "b");
        let weights = StackingWeights::new(array![1.0, 0.0], WeightSource::Optimized).unwrap();

        let blended = combine_points(&[a.clone(), b], &weights).unwrap();

        assert_eq!(blended.keys(), a.keys());
        assert_eq!(blended.values(), a.values());
    }

    #[test]
    // Purpose
    // -------
    // Verify the uniform fallback: four candidates with values 1..4 at a key
    // blend to 2.5 under 1/K weights.
    fn uniform_fallback_averages_candidates() {
        let tables: Vec<PointPredictions> = (0..4)
            .map(|i| table(&[1], array![(i + 1) as f64], &format!("m{i}")))
            .collect();
        let weights = StackingWeights::uniform(4).unwrap();

        let blended = combine_points(&tables, &weights).unwrap();

        assert!((blended.values()[0] - 2.5).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify that key-set disagreement aborts the combine with the offending
    // candidate, position, and keys reported — never a silent partial join.
    fn key_disagreement_aborts_combination() {
        let a = table(&[1, 2], array![1.0, 2.0], "a");
        let shifted = table(&[1, 3], array![1.0, 2.0], "b");
        let short = table(&[1], array![1.0], "c");
        let weights = StackingWeights::uniform(2).unwrap();

        assert!(matches!(
            combine_points(&[a.clone(), shifted], &weights),
            Err(EnsembleError::KeyMismatch { candidate_index: 1, position: 1, .. })
        ));
        assert!(matches!(
            combine_points(&[a, short], &weights),
            Err(EnsembleError::KeyCountMismatch { candidate_index: 1, expected: 2, actual: 1 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify the remaining combine guards: empty candidate set and a weight
    // vector of the wrong length.
    fn combine_guards_reject_degenerate_inputs() {
        let weights = StackingWeights::uniform(2).unwrap();
        assert!(matches!(
            combine_points(&[], &weights),
            Err(EnsembleError::EmptyCandidateSet)
        ));

        let a = table(&[1], array![1.0], "a");
        assert!(matches!(
            combine_points(&[a], &weights),
            Err(EnsembleError::WeightLengthMismatch { expected: 1, actual: 2 })
        ));
    }
}

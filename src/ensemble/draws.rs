//! Simulation-draw prediction tables and their weighted combination.
//!
//! Purpose
//! -------
//! Hold the N joint-precision simulation draws each candidate produces per
//! (time, spatial-unit) key, and blend K candidates' draw blocks into an
//! ensemble block under a stacking weight vector.
//!
//! Key behaviors
//! -------------
//! - [`DrawPredictions::new`] validates shape and finiteness and key-sorts
//!   rows, mirroring the point-mode table.
//! - [`combine_draws`] forms, for every key and draw index n, the
//!   weight-scaled sum of the K candidates' n-th draws. **Draw index n is
//!   combined as-is across candidates**: draw n of model A and draw n of
//!   model B are independent random samples treated as directly comparable.
//!   This is a deliberate simplifying assumption — draws are never re-paired
//!   or rank-matched — and changing it would change ensemble uncertainty.
//! - [`DrawPredictions::subsample_draws`] selects a reproducible subset of
//!   draw columns under an explicit seed.
//!
//! Performance
//! -----------
//! - Blending is the dominant compute cost of the whole pipeline
//!   (K × N × |keys| multiply-adds for key counts in the tens of thousands),
//!   so it runs as one `scaled_add` pass per candidate over the contiguous
//!   keys × draws block instead of per-draw scalar loops.

use crate::{
    ensemble::{
        errors::{EnsembleError, EnsembleResult},
        keys::PredictionKey,
        point::verify_key_agreement,
    },
    stacking::StackingWeights,
};
use ndarray::{Array2, ArrayView2, Axis};
use rand::{rngs::StdRng, SeedableRng};

/// A key-sorted block of simulation draws for one candidate (or a blend).
///
/// Shape: rows = (time, spatial-unit) keys, columns = draw indices 0..N.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPredictions {
    keys: Vec<PredictionKey>,
    draws: Array2<f64>,
    candidate: Option<String>,
}

impl DrawPredictions {
    /// Construct a validated, key-sorted draw block.
    ///
    /// # Errors
    /// - [`EnsembleError::EmptyPredictions`] for zero keys or zero draws.
    /// - [`EnsembleError::LengthMismatch`] when `keys.len() != draws.nrows()`.
    /// - [`EnsembleError::NonFiniteValue`] for the first non-finite cell
    ///   (position reports the row index).
    /// - [`EnsembleError::DuplicateKey`] when two rows share a key.
    pub fn new(
        keys: Vec<PredictionKey>, draws: Array2<f64>, candidate: Option<String>,
    ) -> EnsembleResult<DrawPredictions> {
        if keys.is_empty() || draws.ncols() == 0 {
            return Err(EnsembleError::EmptyPredictions);
        }
        if keys.len() != draws.nrows() {
            return Err(EnsembleError::LengthMismatch {
                keys: keys.len(),
                values: draws.nrows(),
            });
        }
        for (position, row) in draws.rows().into_iter().enumerate() {
            if let Some(&value) = row.iter().find(|v| !v.is_finite()) {
                return Err(EnsembleError::NonFiniteValue { position, value });
            }
        }
        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by_key(|&i| keys[i]);
        for pair in order.windows(2) {
            if keys[pair[0]] == keys[pair[1]] {
                return Err(EnsembleError::DuplicateKey {
                    position: pair[1],
                    key: keys[pair[1]],
                });
            }
        }
        let sorted_keys: Vec<PredictionKey> = order.iter().map(|&i| keys[i]).collect();
        let draws = draws.select(Axis(0), &order);
        Ok(DrawPredictions { keys: sorted_keys, draws, candidate })
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> &[PredictionKey] {
        &self.keys
    }

    /// The keys × draws block.
    pub fn draws(&self) -> ArrayView2<f64> {
        self.draws.view()
    }

    /// Candidate label, if any (`None` for blended blocks).
    pub fn candidate(&self) -> Option<&str> {
        self.candidate.as_deref()
    }

    /// Number of (time, spatial-unit) rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when the block has no rows (never constructible).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of simulation draws per key.
    pub fn n_draws(&self) -> usize {
        self.draws.ncols()
    }

    /// Select `n` draw columns at random, reproducibly under `seed`.
    ///
    /// Column indices are sampled without replacement and kept in ascending
    /// order, so the same seed always yields the same sub-block.
    ///
    /// # Errors
    /// - [`EnsembleError::EmptyDrawSample`] when `n == 0`.
    /// - [`EnsembleError::DrawSampleTooLarge`] when `n` exceeds the
    ///   available draw count.
    pub fn subsample_draws(&self, n: usize, seed: u64) -> EnsembleResult<DrawPredictions> {
        if n == 0 {
            return Err(EnsembleError::EmptyDrawSample);
        }
        if n > self.n_draws() {
            return Err(EnsembleError::DrawSampleTooLarge {
                requested: n,
                available: self.n_draws(),
            });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked = rand::seq::index::sample(&mut rng, self.n_draws(), n).into_vec();
        picked.sort_unstable();
        let draws = self.draws.select(Axis(1), &picked);
        Ok(DrawPredictions {
            keys: self.keys.clone(),
            draws,
            candidate: self.candidate.clone(),
        })
    }
}

/// Blend K draw blocks into one ensemble block.
///
/// Blended draw n at key (t, s) is `Σ_k w_k · draws_k[(t, s), n]`. Candidate
/// blocks must share an identical key set *and* draw count; any disagreement
/// aborts the combine.
///
/// # Errors
/// - [`EnsembleError::EmptyCandidateSet`] for zero blocks.
/// - [`EnsembleError::WeightLengthMismatch`] when `weights.len() != K`.
/// - [`EnsembleError::KeyCountMismatch`] / [`EnsembleError::KeyMismatch`]
///   for key-set disagreement.
/// - [`EnsembleError::DrawCountMismatch`] when a candidate carries a
///   different N.
pub fn combine_draws(
    candidates: &[DrawPredictions], weights: &StackingWeights,
) -> EnsembleResult<DrawPredictions> {
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
    for (candidate_index, candidate) in candidates.iter().enumerate().skip(1) {
        if candidate.n_draws() != first.n_draws() {
            return Err(EnsembleError::DrawCountMismatch {
                candidate_index,
                expected: first.n_draws(),
                actual: candidate.n_draws(),
            });
        }
    }

    let mut blended = Array2::<f64>::zeros(first.draws.raw_dim());
    for (&weight, candidate) in weights.values().iter().zip(candidates.iter()) {
        blended.scaled_add(weight, &candidate.draws);
    }
    Ok(DrawPredictions { keys: first.keys.clone(), draws: blended, candidate: None })
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
    // - Draw-block construction and validation.
    // - Per-draw-index blending arithmetic, including the reference
    //   [0.3, 0.7] example.
    // - Draw-count and key-set disagreement.
    // - Seeded draw subsampling.
    //
    // They intentionally DO NOT cover:
    // - Point-mode blending (point module tests).
    // -------------------------------------------------------------------------

    fn key_2020_a() -> Vec<PredictionKey> {
        vec![PredictionKey::new(2020, 1)]
    }

    #[test]
    // Purpose
    // -------
    // Verify the reference simulation-mode blend: K = 2, weights
    // (0.3, 0.7), N = 3 draws at one key.
    //
    // Given
    // -----
    // - Candidate 1 draws [1, 2, 3]; candidate 2 draws [10, 20, 30].
    //
    // Expect
    // ------
    // - Blended draws [7.3, 14.6, 21.9] within 1e-9.
    fn blend_matches_reference_example() {
        // Arrange
        let c1 = DrawPredictions::new(key_2020_a(), array![[1.0, 2.0, 3.0]], None).unwrap();
        let c2 = DrawPredictions::new(key_2020_a(), array![[10.0, 20.0, 30.0]], None).unwrap();
        let weights = StackingWeights::new(array![0.3, 0.7], WeightSource::Optimized).unwrap();

        // Act
        let blended = combine_draws(&[c1, c2], &weights).unwrap();

        // Assert
        let expected = [7.3, 14.6, 21.9];
        for (n, &want) in expected.iter().enumerate() {
            assert!(
                (blended.draws()[[0, n]] - want).abs() < 1e-9,
                "draw {n}: got {}, want {want}",
                blended.draws()[[0, n]]
            );
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify construction guards: empty blocks, shape mismatch, non-finite
    // cells, duplicate keys, and the key sort.
    fn construction_validates_and_sorts() {
        assert!(matches!(
            DrawPredictions::new(Vec::new(), Array2::zeros((0, 3)), None),
            Err(EnsembleError::EmptyPredictions)
        ));
        assert!(matches!(
            DrawPredictions::new(key_2020_a(), Array2::zeros((1, 0)), None),
            Err(EnsembleError::EmptyPredictions)
        ));
        assert!(matches!(
            DrawPredictions::new(key_2020_a(), Array2::zeros((2, 2)), None),
            Err(EnsembleError::LengthMismatch { keys: 1, values: 2 })
        ));
        assert!(matches!(
            DrawPredictions::new(key_2020_a(), array![[1.0, f64::INFINITY]], None),
            Err(EnsembleError::NonFiniteValue { position: 0, .. })
        ));

        let dup = vec![PredictionKey::new(2020, 1), PredictionKey::new(2020, 1)];
        assert!(matches!(
            DrawPredictions::new(dup, array![[1.0], [2.0]], None),
            Err(EnsembleError::DuplicateKey { .. })
        ));

        let unsorted = vec![PredictionKey::new(2020, 2), PredictionKey::new(2020, 1)];
        let block = DrawPredictions::new(unsorted, array![[2.0], [1.0]], None).unwrap();
        assert_eq!(block.keys()[0].cell, 1);
        assert_eq!(block.draws()[[0, 0]], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify that candidates disagreeing on draw count or key set abort the
    // combine.
    fn combine_rejects_misaligned_blocks() {
        let c1 = DrawPredictions::new(key_2020_a(), array![[1.0, 2.0]], None).unwrap();
        let wide = DrawPredictions::new(key_2020_a(), array![[1.0, 2.0, 3.0]], None).unwrap();
        let weights = StackingWeights::uniform(2).unwrap();
        assert!(matches!(
            combine_draws(&[c1.clone(), wide], &weights),
            Err(EnsembleError::DrawCountMismatch { candidate_index: 1, expected: 2, actual: 3 })
        ));

        let other_key =
            DrawPredictions::new(vec![PredictionKey::new(2021, 1)], array![[1.0, 2.0]], None)
                .unwrap();
        assert!(matches!(
            combine_draws(&[c1, other_key], &weights),
            Err(EnsembleError::KeyMismatch { candidate_index: 1, position: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify that draw subsampling is reproducible under a fixed seed,
    // keeps columns in ascending draw order, and validates its bounds.
    fn subsampling_is_seeded_and_bounded() {
        let keys = vec![PredictionKey::new(2020, 1), PredictionKey::new(2020, 2)];
        let block = DrawPredictions::new(
            keys,
            array![[0.0, 1.0, 2.0, 3.0, 4.0], [10.0, 11.0, 12.0, 13.0, 14.0]],
            Some("a".to_string()),
        )
        .unwrap();

        let once = block.subsample_draws(3, 99).unwrap();
        let again = block.subsample_draws(3, 99).unwrap();
        assert_eq!(once, again);
        assert_eq!(once.n_draws(), 3);
        // Ascending column order means row values stay ascending too.
        for row in once.draws().rows() {
            assert!(row[0] < row[1] && row[1] < row[2]);
        }

        assert!(matches!(
            block.subsample_draws(0, 1),
            Err(EnsembleError::EmptyDrawSample)
        ));
        assert!(matches!(
            block.subsample_draws(6, 1),
            Err(EnsembleError::DrawSampleTooLarge { requested: 6, available: 5 })
        ));
    }
}

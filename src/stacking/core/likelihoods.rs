//! Held-out log-likelihood containers for model stacking.
//!
//! Purpose
//! -------
//! Provide validated containers for the cross-validation output that drives
//! stacking: per-candidate held-out log-likelihood vectors and the aligned
//! observations × candidates matrix built from them. All alignment checks
//! happen here, so the optimizer can assume a rectangular, fold-consistent
//! matrix.
//!
//! Key behaviors
//! -------------
//! - [`HeldOutLogLik`] pairs one candidate's metadata with its per-observation
//!   held-out log-likelihoods and fold assignment, validating lengths and
//!   cell values at construction.
//! - [`LikelihoodMatrix`] stacks K candidates column-wise, enforcing an
//!   identical observation count and an identical fold assignment across
//!   candidates (same observation set, same ordering).
//! - [`LikelihoodMatrix::restrict_to_folds`] selects the rows belonging to a
//!   chosen subset of held-out folds, preserving candidate alignment.
//!
//! Invariants & assumptions
//! ------------------------
//! - Cells are finite reals or `−∞` (a likelihood that underflowed to zero);
//!   `NaN` and `+∞` are construction errors.
//! - Row i of every column refers to the same held-out observation; the fold
//!   assignment is the witness used to check this.
//! - The matrix is immutable after construction; fold restriction returns a
//!   new matrix.
//!
//! Testing notes
//! -------------
//! - Unit tests cover happy-path construction, each rejection path, and fold
//!   restriction (legal subset, unknown fold, empty result).

use crate::stacking::{
    core::candidates::CandidateMeta,
    errors::{StackingError, StackingResult},
};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// One candidate's cross-validation output: per-observation held-out
/// log-likelihoods plus the fold each observation was held out in.
#[derive(Debug, Clone, PartialEq)]
pub struct HeldOutLogLik {
    /// Candidate identity and fit status.
    pub meta: CandidateMeta,
    /// Held-out log-likelihood per observation (finite or −∞).
    pub loglik: Array1<f64>,
    /// Held-out fold id per observation; aligned with `loglik`.
    pub folds: Vec<u32>,
}

impl HeldOutLogLik {
    /// Construct a validated per-candidate held-out vector.
    ///
    /// # Errors
    /// - [`StackingError::FoldLengthMismatch`] if `folds.len() !=
    ///   loglik.len()`.
    /// - [`StackingError::InvalidLogLik`] for the first `NaN` or `+∞` cell
    ///   (candidate index is reported as 0 here; the matrix constructor
    ///   re-reports with the true column).
    pub fn new(
        meta: CandidateMeta, loglik: Array1<f64>, folds: Vec<u32>,
    ) -> StackingResult<HeldOutLogLik> {
        if folds.len() != loglik.len() {
            return Err(StackingError::FoldLengthMismatch {
                expected: loglik.len(),
                actual: folds.len(),
            });
        }
        validate_cells(&loglik, 0)?;
        Ok(HeldOutLogLik { meta, loglik, folds })
    }
}

/// Aligned observations × candidates matrix of held-out log-likelihoods.
///
/// Invariant: every column covers the same observation set in the same
/// order, witnessed by a shared fold assignment. Built once per
/// species/model-set after all candidates are fitted, then treated as an
/// immutable input snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LikelihoodMatrix {
    candidates: Vec<CandidateMeta>,
    loglik: Array2<f64>,
    folds: Vec<u32>,
}

impl LikelihoodMatrix {
    /// Assemble a matrix from per-candidate held-out vectors.
    ///
    /// The first candidate defines the observation count and fold
    /// assignment; every further candidate must match both exactly.
    ///
    /// # Errors
    /// - [`StackingError::NoCandidates`] for an empty input.
    /// - [`StackingError::EmptyHeldOut`] if a candidate has no observations.
    /// - [`StackingError::ObservationCountMismatch`] /
    ///   [`StackingError::FoldAlignmentMismatch`] for misaligned candidates.
    /// - [`StackingError::InvalidLogLik`] for `NaN`/`+∞` cells.
    pub fn from_candidates(candidates: Vec<HeldOutLogLik>) -> StackingResult<LikelihoodMatrix> {
        if candidates.is_empty() {
            return Err(StackingError::NoCandidates);
        }
        let n_obs = candidates[0].loglik.len();
        if n_obs == 0 {
            return Err(StackingError::EmptyHeldOut { candidate_index: 0 });
        }
        let folds = candidates[0].folds.clone();
        let k = candidates.len();

        let mut loglik = Array2::zeros((n_obs, k));
        let mut metas = Vec::with_capacity(k);
        for (j, cand) in candidates.into_iter().enumerate() {
            if cand.loglik.is_empty() {
                return Err(StackingError::EmptyHeldOut { candidate_index: j });
            }
            if cand.loglik.len() != n_obs {
                return Err(StackingError::ObservationCountMismatch {
                    candidate_index: j,
                    expected: n_obs,
                    actual: cand.loglik.len(),
                });
            }
            for (row, (&own, &reference)) in cand.folds.iter().zip(folds.iter()).enumerate() {
                if own != reference {
                    return Err(StackingError::FoldAlignmentMismatch {
                        candidate_index: j,
                        row,
                        expected: reference,
                        actual: own,
                    });
                }
            }
            validate_cells(&cand.loglik, j)?;
            loglik.column_mut(j).assign(&cand.loglik);
            metas.push(cand.meta);
        }
        Ok(LikelihoodMatrix { candidates: metas, loglik, folds })
    }

    /// Number of held-out observations (matrix rows).
    pub fn n_obs(&self) -> usize {
        self.loglik.nrows()
    }

    /// Number of candidate models (matrix columns).
    pub fn n_candidates(&self) -> usize {
        self.loglik.ncols()
    }

    /// Candidate metadata in column order.
    pub fn candidates(&self) -> &[CandidateMeta] {
        &self.candidates
    }

    /// View of the observations × candidates log-likelihood block.
    pub fn loglik(&self) -> ArrayView2<f64> {
        self.loglik.view()
    }

    /// Held-out fold id per observation.
    pub fn folds(&self) -> &[u32] {
        &self.folds
    }

    /// Restrict the matrix to observations held out in the given folds.
    ///
    /// Rows are kept in their original order; candidate columns are
    /// untouched, so alignment is preserved by construction.
    ///
    /// # Errors
    /// - [`StackingError::UnknownFold`] if a requested fold id never occurs.
    /// - [`StackingError::EmptyFoldSubset`] if no rows survive (only possible
    ///   with an empty `folds` argument).
    pub fn restrict_to_folds(&self, folds: &[u32]) -> StackingResult<LikelihoodMatrix> {
        for &fold in folds {
            if !self.folds.contains(&fold) {
                return Err(StackingError::UnknownFold { fold });
            }
        }
        let keep: Vec<usize> = self
            .folds
            .iter()
            .enumerate()
            .filter(|(_, f)| folds.contains(f))
            .map(|(i, _)| i)
            .collect();
        if keep.is_empty() {
            return Err(StackingError::EmptyFoldSubset);
        }
        let loglik = self.loglik.select(Axis(0), &keep);
        let folds = keep.iter().map(|&i| self.folds[i]).collect();
        Ok(LikelihoodMatrix { candidates: self.candidates.clone(), loglik, folds })
    }
}

/// Reject `NaN` and `+∞` cells; `−∞` (underflowed likelihood) is legal.
fn validate_cells(loglik: &Array1<f64>, candidate_index: usize) -> StackingResult<()> {
    for (row, &value) in loglik.iter().enumerate() {
        if value.is_nan() {
            return Err(StackingError::InvalidLogLik {
                row,
                candidate_index,
                value,
                reason: "Log-likelihoods must not be NaN.",
            });
        }
        if value == f64::INFINITY {
            return Err(StackingError::InvalidLogLik {
                row,
                candidate_index,
                value,
                reason: "Log-likelihoods must not be +infinity.",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacking::core::candidates::CandidateSpec;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction of per-candidate vectors and the aligned matrix.
    // - Each rejection path (NaN, +inf, length and fold misalignment).
    // - Fold restriction semantics.
    //
    // They intentionally DO NOT cover:
    // - The stacking objective over a matrix (model layer tests).
    // -------------------------------------------------------------------------

    fn meta(id: &str) -> CandidateMeta {
        CandidateMeta::new(id, CandidateSpec::default(), true)
    }

    fn two_candidate_matrix() -> LikelihoodMatrix {
        let a = HeldOutLogLik::new(meta("a"), array![-1.0, -2.0, -3.0, -4.0], vec![0, 0, 1, 1])
            .unwrap();
        let b = HeldOutLogLik::new(meta("b"), array![-1.5, -2.5, -3.5, -4.5], vec![0, 0, 1, 1])
            .unwrap();
        LikelihoodMatrix::from_candidates(vec![a, b]).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify that aligned candidates assemble into a matrix with the expected
    // shape, column order, and shared fold assignment.
    fn matrix_assembles_aligned_candidates() {
        let matrix = two_candidate_matrix();
        assert_eq!(matrix.n_obs(), 4);
        assert_eq!(matrix.n_candidates(), 2);
        assert_eq!(matrix.candidates()[0].id, "a");
        assert_eq!(matrix.candidates()[1].id, "b");
        assert_eq!(matrix.folds(), &[0, 0, 1, 1]);
        assert_eq!(matrix.loglik()[[2, 1]], -3.5);
    }

    #[test]
    // Purpose
    // -------
    // Verify that a NaN cell is rejected while −∞ (underflowed likelihood)
    // is accepted.
    fn cell_validation_distinguishes_nan_from_neg_infinity() {
        let nan = HeldOutLogLik::new(meta("a"), array![-1.0, f64::NAN], vec![0, 0]);
        assert!(matches!(nan, Err(StackingError::InvalidLogLik { row: 1, .. })));

        let underflow = HeldOutLogLik::new(meta("a"), array![-1.0, f64::NEG_INFINITY], vec![0, 0]);
        assert!(underflow.is_ok());

        let pos_inf = HeldOutLogLik::new(meta("a"), array![f64::INFINITY], vec![0]);
        assert!(matches!(pos_inf, Err(StackingError::InvalidLogLik { row: 0, .. })));
    }

    #[test]
    // Purpose
    // -------
    // Verify that candidates with differing observation counts or fold
    // assignments are rejected with the offending column reported.
    fn matrix_rejects_misaligned_candidates() {
        let a = HeldOutLogLik::new(meta("a"), array![-1.0, -2.0], vec![0, 1]).unwrap();
        let short = HeldOutLogLik::new(meta("b"), array![-1.0], vec![0]).unwrap();
        assert!(matches!(
            LikelihoodMatrix::from_candidates(vec![a.clone(), short]),
            Err(StackingError::ObservationCountMismatch { candidate_index: 1, .. })
        ));

        let refolded = HeldOutLogLik::new(meta("b"), array![-1.0, -2.0], vec![0, 2]).unwrap();
        assert!(matches!(
            LikelihoodMatrix::from_candidates(vec![a, refolded]),
            Err(StackingError::FoldAlignmentMismatch { candidate_index: 1, row: 1, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify that an empty candidate list is rejected.
    fn matrix_rejects_empty_candidate_list() {
        assert!(matches!(
            LikelihoodMatrix::from_candidates(Vec::new()),
            Err(StackingError::NoCandidates)
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify that fold restriction keeps exactly the requested rows in
    // order, preserves candidate alignment, and errors on unknown folds and
    // empty requests.
    fn fold_restriction_selects_rows_and_validates_ids() {
        let matrix = two_candidate_matrix();

        let restricted = matrix.restrict_to_folds(&[1]).expect("fold 1 exists");
        assert_eq!(restricted.n_obs(), 2);
        assert_eq!(restricted.folds(), &[1, 1]);
        assert_eq!(restricted.loglik()[[0, 0]], -3.0);
        assert_eq!(restricted.n_candidates(), 2);

        assert!(matches!(
            matrix.restrict_to_folds(&[7]),
            Err(StackingError::UnknownFold { fold: 7 })
        ));
        assert!(matches!(matrix.restrict_to_folds(&[]), Err(StackingError::EmptyFoldSubset)));
    }
}

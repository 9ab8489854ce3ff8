//! Numerical stability utilities.
//!
//! Provides safe implementations of the simplex transforms used to map
//! unconstrained stacking logits into mixture weights. The functions here
//! follow guarded strategies similar to those in major ML libraries
//! (max-shifted exponentials, explicit clamping before logs) to keep `f64`
//! arithmetic in a well-conditioned regime.
//!
//! # Provided items
//! - [`LOGIT_EPS`]: lower clamp applied to weights before taking logs in the
//!   inverse map, so degenerate (zero) weights stay representable in logit
//!   space.
//! - [`WEIGHT_SUM_TOL`]: tolerance on `|sum(weights) − 1|` used by weight
//!   validation throughout the crate.
//! - [`safe_softmax(logits)`]: max-shift softmax, ℝᴷ → unit simplex.
//! - [`safe_softmax_jvp(weights, grad)`]: Jacobian–vector product mapping a
//!   simplex-space gradient into logit space.
//! - [`weights_to_logits(weights)`]: inverse map with clamping, a right
//!   inverse of `safe_softmax` up to the softmax's shift invariance.

use ndarray::{Array1, ArrayView1};

/// Lower clamp for weights entering the inverse (log) map.
///
/// A stacking weight of exactly zero has no finite logit; clamping to this
/// floor keeps `weights_to_logits` total while leaving the recovered weight
/// numerically indistinguishable from zero after the forward map.
pub const LOGIT_EPS: f64 = 1e-12;

/// Tolerance on `|sum(weights) − 1|` for validated weight vectors.
pub const WEIGHT_SUM_TOL: f64 = 1e-9;

/// Numerically stable softmax onto the unit simplex.
///
/// Computes `w_k = exp(x_k − m) / Σ_j exp(x_j − m)` with `m = max(x)`, so no
/// exponential can overflow and at least one term equals 1, keeping the
/// normalizer well away from zero.
///
/// # Parameters
/// - `logits`: unconstrained real vector; entries are assumed finite
///   (upstream validation enforces this).
///
/// # Returns
/// - A freshly allocated weight vector with non-negative entries summing to
///   1 up to rounding.
pub fn safe_softmax(logits: ArrayView1<f64>) -> Array1<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut weights = logits.mapv(|x| (x - max).exp());
    let total = weights.sum();
    weights.mapv_inplace(|w| w / total);
    weights
}

/// Jacobian–vector product of the softmax at `weights`.
///
/// Given the gradient `g` of an objective with respect to the simplex
/// coordinates, returns the gradient with respect to the underlying logits:
///
/// ```text
/// (Jᵀ g)_j = w_j · (g_j − Σ_k w_k g_k)
/// ```
///
/// The result always sums to zero, matching the softmax's invariance to a
/// constant shift of the logits.
///
/// # Parameters
/// - `weights`: softmax output at the evaluation point (`w = softmax(θ)`).
/// - `grad`: simplex-space gradient `∂ℓ/∂w`; must have the same length.
///
/// # Returns
/// - Logit-space gradient `∂ℓ/∂θ` of the same length.
pub fn safe_softmax_jvp(weights: ArrayView1<f64>, grad: ArrayView1<f64>) -> Array1<f64> {
    let mean = weights.dot(&grad);
    let mut out = Array1::zeros(weights.len());
    for ((o, &w), &g) in out.iter_mut().zip(weights.iter()).zip(grad.iter()) {
        *o = w * (g - mean);
    }
    out
}

/// Map a weight vector on the simplex back to logit space.
///
/// Entries are clamped to [`LOGIT_EPS`] before the log so zero weights do not
/// produce `−∞`. Since the softmax is invariant to constant shifts, any log
/// of the (clamped) weights is a valid preimage; no baseline is subtracted.
///
/// # Parameters
/// - `weights`: non-negative vector summing to ~1 (validated upstream).
///
/// # Returns
/// - A logit vector `θ` with `safe_softmax(θ) ≈ weights` (exactly, where no
///   clamping fired).
pub fn weights_to_logits(weights: ArrayView1<f64>) -> Array1<f64> {
    weights.mapv(|w| w.max(LOGIT_EPS).ln())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Simplex membership of `safe_softmax` output, including extreme logits.
    // - Agreement of `safe_softmax_jvp` with a finite-difference probe.
    // - Round-trip behavior of `weights_to_logits` through the forward map.
    //
    // They intentionally DO NOT cover:
    // - Integration with the L-BFGS solver (covered in the optimizer layer).
    // - Validation of weight vectors (covered by `StackingWeights`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `safe_softmax` returns non-negative entries summing to 1,
    // even when logits are large enough to overflow a naive exp.
    //
    // Given
    // -----
    // - A logit vector with entries spanning [-800, 800].
    //
    // Expect
    // ------
    // - All outputs finite and in [0, 1]; the sum is 1 within 1e-12.
    fn safe_softmax_handles_extreme_logits() {
        // Arrange
        let logits = array![800.0, 0.0, -800.0, 799.0];

        // Act
        let weights = safe_softmax(logits.view());

        // Assert
        assert!(weights.iter().all(|w| w.is_finite() && (0.0..=1.0).contains(w)));
        assert!((weights.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify that the Jacobian–vector product matches a central
    // finite-difference derivative of a simple composite objective.
    //
    // Given
    // -----
    // - Objective f(θ) = Σ_k c_k · softmax(θ)_k for fixed coefficients c.
    // - An interior evaluation point θ.
    //
    // Expect
    // ------
    // - Each component of `safe_softmax_jvp` agrees with the numeric
    //   derivative within 1e-6.
    fn softmax_jvp_matches_finite_differences() {
        // Arrange
        let theta = array![0.3, -0.7, 1.1];
        let coeffs = array![2.0, -1.0, 0.5];
        let f = |t: &Array1<f64>| safe_softmax(t.view()).dot(&coeffs);
        let h = 1e-6;

        // Act
        let weights = safe_softmax(theta.view());
        let analytic = safe_softmax_jvp(weights.view(), coeffs.view());

        // Assert
        for j in 0..theta.len() {
            let mut up = theta.clone();
            let mut down = theta.clone();
            up[j] += h;
            down[j] -= h;
            let numeric = (f(&up) - f(&down)) / (2.0 * h);
            assert!(
                (analytic[j] - numeric).abs() < 1e-6,
                "component {j}: analytic {} vs numeric {}",
                analytic[j],
                numeric
            );
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that the logit gradient sums to zero, reflecting the softmax's
    // shift invariance.
    //
    // Given
    // -----
    // - An arbitrary weight vector on the simplex and an arbitrary
    //   simplex-space gradient.
    //
    // Expect
    // ------
    // - The components of the JVP sum to 0 within 1e-12.
    fn softmax_jvp_is_orthogonal_to_shifts() {
        // Arrange
        let weights = array![0.2, 0.5, 0.3];
        let grad = array![10.0, -3.0, 4.5];

        // Act
        let out = safe_softmax_jvp(weights.view(), grad.view());

        // Assert
        assert!(out.sum().abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify that `weights_to_logits` is a right inverse of `safe_softmax`
    // for strictly positive weights.
    //
    // Given
    // -----
    // - A strictly positive weight vector summing to 1.
    //
    // Expect
    // ------
    // - `safe_softmax(weights_to_logits(w))` reproduces `w` within 1e-12.
    fn logit_round_trip_recovers_positive_weights() {
        // Arrange
        let weights = array![0.1, 0.25, 0.65];

        // Act
        let logits = weights_to_logits(weights.view());
        let recovered = safe_softmax(logits.view());

        // Assert
        for (r, w) in recovered.iter().zip(weights.iter()) {
            assert!((r - w).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that a zero weight survives the clamped inverse map as a
    // numerically negligible (but finite) weight.
    //
    // Given
    // -----
    // - A degenerate one-hot weight vector.
    //
    // Expect
    // ------
    // - All logits are finite.
    // - The recovered vector puts weight ~1 on the hot coordinate.
    fn logit_map_tolerates_zero_weights() {
        // Arrange
        let weights = array![0.0, 1.0, 0.0];

        // Act
        let logits = weights_to_logits(weights.view());
        let recovered = safe_softmax(logits.view());

        // Assert
        assert!(logits.iter().all(|l| l.is_finite()));
        assert!((recovered[1] - 1.0).abs() < 1e-9);
    }
}

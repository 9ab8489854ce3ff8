//! Stacking model: held-out mixture log-likelihood and analytic gradient.
//!
//! This module wires the stacking objective to the `LogLikelihood` trait.
//! Candidate weights live in unconstrained logit space; each evaluation maps
//! `θ` onto the simplex via the max-shift softmax, scores the weighted
//! mixture of candidate likelihoods on every held-out observation, and sums
//! the log mixture likelihoods.
//!
//! Key ideas:
//! - Weights are `w = softmax(θ)`, so non-negativity and unit sum hold for
//!   every optimizer iterate without constrained optimization.
//! - Any observation whose mixture log-likelihood is non-finite (typically:
//!   every candidate's likelihood underflowed to zero) is **excluded from the
//!   objective sum**, not treated as an error. How many observations were
//!   masked is surfaced through [`ExclusionReport`] and a `tracing` warning
//!   above the configured threshold. Whether the masking is statistically
//!   sound is unverified; downstream results depend on this exact rule, so
//!   it must not be tightened into an error.
//! - The gradient uses the chain rule: per-observation simplex-space terms
//!   `L_k / mix` are accumulated, then mapped to logit space through the
//!   softmax Jacobian–vector product. Masked observations contribute zero.

use crate::{
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{maximize, Grad, LogLikelihood, OptimOutcome, Theta},
        numerical_stability::{safe_softmax, safe_softmax_jvp},
    },
    stacking::{
        core::{
            likelihoods::LikelihoodMatrix, options::StackingOptions, weights::StackingWeights,
        },
        errors::{StackingError, StackingResult},
    },
};
use ndarray::Array1;
use rand::{
    distributions::{Distribution, Uniform},
    rngs::StdRng,
    SeedableRng,
};

/// How many held-out observations the objective masked as non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionReport {
    /// Observations scored (after any fold restriction).
    pub n_obs: usize,
    /// Observations excluded for a non-finite mixture log-likelihood.
    pub n_excluded: usize,
}

impl ExclusionReport {
    /// Excluded share of the scored observations (0 for an empty matrix).
    pub fn fraction(&self) -> f64 {
        if self.n_obs == 0 { 0.0 } else { self.n_excluded as f64 / self.n_obs as f64 }
    }
}

/// Likelihood-weighted stacking of candidate models.
///
/// Encapsulates the run configuration (`options`) and, after fitting, caches
/// the optimizer outcome, the fitted weights, and the masking report.
///
/// # Notes
/// - Implements [`LogLikelihood`] so it plugs directly into the Argmin-based
///   optimizer; `Data` is the held-out [`LikelihoodMatrix`].
/// - The matrix is an immutable input snapshot; a fold restriction from
///   `options.folds` produces a new matrix for the fit and leaves the
///   caller's untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct StackingModel {
    /// Run configuration.
    pub options: StackingOptions,
    /// Optimizer outcome (populated after `fit`).
    pub results: Option<OptimOutcome>,
    /// Fitted weights (populated after `fit` or a fallback).
    pub fitted_weights: Option<StackingWeights>,
    /// Masking report at the fitted weights (populated after `fit`).
    pub exclusion: Option<ExclusionReport>,
}

impl StackingModel {
    /// Construct an unfitted stacking model.
    pub fn new(options: StackingOptions) -> StackingModel {
        StackingModel { options, results: None, fitted_weights: None, exclusion: None }
    }

    /// Random initial logits, reproducible under `options.seed`.
    ///
    /// Draws K values from U(−0.5, 0.5): close enough to the uniform-weight
    /// point that the first mixture evaluations are well conditioned, yet
    /// randomized so repeated runs with different seeds probe different
    /// starts.
    pub fn initial_logits(&self, k: usize) -> Theta {
        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let spread = Uniform::new(-0.5, 0.5);
        Array1::from_iter((0..k).map(|_| spread.sample(&mut rng)))
    }

    /// Fit stacking weights by maximizing total held-out log-likelihood.
    ///
    /// ## Steps
    /// 1. Restrict the matrix to `options.folds` when a subset is requested.
    /// 2. Draw random initial logits (seeded) and run L-BFGS via `maximize`.
    /// 3. Treat a solver error *or* a non-converged outcome as
    ///    [`StackingError::OptimizationFailed`] — the caller-visible
    ///    "stacking failed" signal.
    /// 4. Map `θ̂` onto the simplex, recompute the masking report at the
    ///    fitted weights, and cache outcome/weights/report.
    ///
    /// A warning is logged when the masked fraction exceeds
    /// `options.exclusion_warn_fraction`.
    ///
    /// ## Errors
    /// - Propagates fold-restriction errors (data integrity, not fallback
    ///   material).
    /// - [`StackingError::OptimizationFailed`] when the optimizer errors or
    ///   fails to converge. Callers wanting the documented uniform fallback
    ///   use [`StackingModel::fit_or_uniform`].
    pub fn fit(&mut self, data: &LikelihoodMatrix) -> StackingResult<()> {
        let restricted = match &self.options.folds {
            Some(folds) => Some(data.restrict_to_folds(folds)?),
            None => None,
        };
        let scored = restricted.as_ref().unwrap_or(data);

        let theta0 = self.initial_logits(scored.n_candidates());
        let outcome =
            maximize(self, theta0, scored, &self.options.mle_opts).map_err(StackingError::from)?;
        if !outcome.converged {
            return Err(StackingError::OptimizationFailed { status: outcome.status });
        }

        let weights = StackingWeights::from_theta(outcome.theta_hat.view())?;
        let (_, report) = mixture_heldout_score(&weights, scored);
        if report.fraction() > self.options.exclusion_warn_fraction {
            tracing::warn!(
                n_excluded = report.n_excluded,
                n_obs = report.n_obs,
                "stacking objective masked a large share of held-out observations"
            );
        } else if report.n_excluded > 0 {
            tracing::debug!(
                n_excluded = report.n_excluded,
                n_obs = report.n_obs,
                "stacking objective masked non-finite observations"
            );
        }

        self.results = Some(outcome);
        self.fitted_weights = Some(weights);
        self.exclusion = Some(report);
        Ok(())
    }

    /// Fit, falling back to uniform 1/K weights when stacking fails.
    ///
    /// This is the documented recovery path: an optimization failure is
    /// logged and replaced by uniform weights tagged
    /// `WeightSource::UniformFallback`, so downstream ensembles proceed
    /// while reports still show that no optimized solution exists. Data
    /// integrity errors (e.g., an unknown fold id) are *not* absorbed; they
    /// propagate to the caller.
    pub fn fit_or_uniform(&mut self, data: &LikelihoodMatrix) -> StackingResult<StackingWeights> {
        match self.fit(data) {
            Ok(()) => Ok(self
                .fitted_weights
                .clone()
                .ok_or(StackingError::NotFitted)?),
            Err(StackingError::OptimizationFailed { status }) => {
                tracing::warn!(%status, "stacking failed; falling back to uniform weights");
                let uniform = StackingWeights::uniform(data.n_candidates())?;
                self.results = None;
                self.exclusion = None;
                self.fitted_weights = Some(uniform.clone());
                Ok(uniform)
            }
            Err(other) => Err(other),
        }
    }

    /// Fitted weights, or [`StackingError::NotFitted`].
    pub fn weights(&self) -> StackingResult<&StackingWeights> {
        self.fitted_weights.as_ref().ok_or(StackingError::NotFitted)
    }
}

impl LogLikelihood for StackingModel {
    type Data = LikelihoodMatrix;

    /// Total held-out log-likelihood of the weighted mixture at `θ`.
    ///
    /// # Steps
    /// 1. Map `θ` onto the simplex via the max-shift softmax.
    /// 2. For each observation, form `mix = Σ_k w_k · exp(ll_k)` and add
    ///    `ln(mix)` when finite; otherwise mask the observation.
    ///
    /// # Errors
    /// - [`OptError::AllObservationsMasked`] when no observation yields a
    ///   finite mixture log-likelihood.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        let weights = safe_softmax(theta.view());
        let mut total = 0.0;
        let mut included = 0usize;
        for row in data.loglik().rows() {
            let mut mix = 0.0;
            for (&w, &ll) in weights.iter().zip(row.iter()) {
                mix += w * ll.exp();
            }
            let lm = mix.ln();
            if lm.is_finite() {
                total += lm;
                included += 1;
            }
        }
        if included == 0 {
            return Err(OptError::AllObservationsMasked { n_obs: data.n_obs() });
        }
        Ok(total)
    }

    /// Validate an unconstrained logit vector against the candidate count.
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        crate::optimization::loglik_optimizer::validation::validate_theta(
            theta,
            data.n_candidates(),
        )
    }

    /// Analytic gradient of the masked mixture objective w.r.t. `θ`.
    ///
    /// # Steps
    /// 1. Map `θ` to weights, accumulate `∂ℓ/∂w_k = Σ_obs L_k / mix` over the
    ///    observations whose mixture log-likelihood is finite (the same mask
    ///    as `value`).
    /// 2. Push the simplex-space gradient to logit space through the softmax
    ///    Jacobian–vector product.
    ///
    /// # Errors
    /// - [`OptError::AllObservationsMasked`] when every observation is
    ///   masked.
    fn grad(&self, theta: &Theta, data: &Self::Data) -> OptResult<Grad> {
        let weights = safe_softmax(theta.view());
        let k = weights.len();
        let mut grad_w = Array1::<f64>::zeros(k);
        let mut included = 0usize;
        for row in data.loglik().rows() {
            let mut mix = 0.0;
            for (&w, &ll) in weights.iter().zip(row.iter()) {
                mix += w * ll.exp();
            }
            if !mix.ln().is_finite() {
                continue;
            }
            included += 1;
            for (g, &ll) in grad_w.iter_mut().zip(row.iter()) {
                *g += ll.exp() / mix;
            }
        }
        if included == 0 {
            return Err(OptError::AllObservationsMasked { n_obs: data.n_obs() });
        }
        Ok(safe_softmax_jvp(weights.view(), grad_w.view()))
    }
}

/// Score a weight vector on a held-out matrix, with the masking report.
///
/// Returns the total log-likelihood over the observations whose mixture is
/// finite (0.0 when every observation is masked) together with the
/// [`ExclusionReport`]. Used after fitting to report masking at `θ̂`, and
/// available for diagnostics on any externally supplied weights.
pub fn mixture_heldout_score(
    weights: &StackingWeights, matrix: &LikelihoodMatrix,
) -> (f64, ExclusionReport) {
    let w = weights.values();
    let mut total = 0.0;
    let mut excluded = 0usize;
    for row in matrix.loglik().rows() {
        let mut mix = 0.0;
        for (&wk, &ll) in w.iter().zip(row.iter()) {
            mix += wk * ll.exp();
        }
        let lm = mix.ln();
        if lm.is_finite() {
            total += lm;
        } else {
            excluded += 1;
        }
    }
    (total, ExclusionReport { n_obs: matrix.n_obs(), n_excluded: excluded })
}

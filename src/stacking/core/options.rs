//! Stacking options — configuration for the weight-estimation workflow.
//!
//! Purpose
//! -------
//! Collect the configuration knobs for a stacking run in one place so call
//! sites pass explicit, validated options instead of ad-hoc flags: optimizer
//! settings, RNG seeding for the random initial logits, an optional fold
//! subset, and the masking warning threshold.
//!
//! Invariants & assumptions
//! ------------------------
//! - `mle_opts` is assumed validated by its own builder
//!   ([`MLEOptions::new`]); no cross-field checks are added here.
//! - `exclusion_warn_fraction` must lie in [0, 1]; it only controls when a
//!   warning is emitted, never whether masked observations are excluded
//!   (they always are).
//! - `folds = None` means "use every held-out fold"; fold ids are validated
//!   against the matrix at fit time, not here.
//!
//! Conventions
//! -----------
//! - Seeding is explicit (`seed: Option<u64>`): `Some(seed)` gives
//!   reproducible initial logits, `None` defers to system entropy. The
//!   default is `Some(42)` so tests and repeated runs are deterministic
//!   unless the caller opts out.

use crate::{
    optimization::loglik_optimizer::MLEOptions,
    stacking::errors::{StackingError, StackingResult},
};

/// Fraction of masked observations above which a warning is logged.
pub const DEFAULT_EXCLUSION_WARN_FRACTION: f64 = 0.1;

/// Configuration for one stacking fit.
#[derive(Debug, Clone, PartialEq)]
pub struct StackingOptions {
    /// Maximum-likelihood optimizer options (L-BFGS + line search).
    pub mle_opts: MLEOptions,
    /// RNG seed for the random initial logit vector.
    pub seed: Option<u64>,
    /// Optional subset of held-out folds to score on; `None` = all folds.
    pub folds: Option<Vec<u32>>,
    /// Warn when more than this fraction of observations is masked.
    pub exclusion_warn_fraction: f64,
}

impl StackingOptions {
    /// Construct validated stacking options.
    ///
    /// # Errors
    /// - [`StackingError::InvalidExclusionThreshold`] if
    ///   `exclusion_warn_fraction` is non-finite or outside [0, 1].
    pub fn new(
        mle_opts: MLEOptions, seed: Option<u64>, folds: Option<Vec<u32>>,
        exclusion_warn_fraction: f64,
    ) -> StackingResult<StackingOptions> {
        if !exclusion_warn_fraction.is_finite() || !(0.0..=1.0).contains(&exclusion_warn_fraction)
        {
            return Err(StackingError::InvalidExclusionThreshold {
                value: exclusion_warn_fraction,
            });
        }
        Ok(StackingOptions { mle_opts, seed, folds, exclusion_warn_fraction })
    }
}

impl Default for StackingOptions {
    fn default() -> Self {
        StackingOptions {
            mle_opts: MLEOptions::default(),
            seed: Some(42),
            folds: None,
            exclusion_warn_fraction: DEFAULT_EXCLUSION_WARN_FRACTION,
        }
    }
}

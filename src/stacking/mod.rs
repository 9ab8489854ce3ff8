//! stacking — likelihood-weighted model stacking.
//!
//! Purpose
//! -------
//! Turn cross-validation output from a set of fitted candidate models into a
//! convex weight vector maximizing total held-out log-likelihood. The
//! pipeline is: assemble a validated [`core::likelihoods::LikelihoodMatrix`]
//! from per-candidate held-out vectors, fit a [`model::StackingModel`] over
//! it (softmax-reparameterized L-BFGS), and hand the resulting
//! [`core::weights::StackingWeights`] to the ensemble layer.
//!
//! Key behaviors
//! -------------
//! - Construction-time validation of observation alignment and fold
//!   consistency across candidates; stacking never silently realigns data.
//! - Exact masking of observations with non-finite mixture log-likelihoods,
//!   with the masked count surfaced via
//!   [`model::ExclusionReport`] and a `tracing` warning above a configurable
//!   threshold.
//! - A distinguishable `OptimizationFailed` error on solver failure or
//!   non-convergence, with [`model::StackingModel::fit_or_uniform`] as the
//!   documented uniform-weight recovery path.
//!
//! Downstream usage
//! ----------------
//! - The ensemble layer consumes [`core::weights::StackingWeights`] to blend
//!   candidate projections; the weight provenance
//!   ([`core::weights::WeightSource`]) travels into weight reports.

pub mod core;
pub mod errors;
pub mod model;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::candidates::{CandidateMeta, CandidateSpec};
pub use self::core::likelihoods::{HeldOutLogLik, LikelihoodMatrix};
pub use self::core::options::{StackingOptions, DEFAULT_EXCLUSION_WARN_FRACTION};
pub use self::core::weights::{StackingWeights, WeightSource};
pub use self::errors::{StackingError, StackingResult};
pub use self::model::{mixture_heldout_score, ExclusionReport, StackingModel};

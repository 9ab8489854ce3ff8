//! Core containers for likelihood-weighted stacking.
//!
//! - [`candidates`]: candidate model identity and configuration flags.
//! - [`likelihoods`]: validated held-out log-likelihood vectors and the
//!   aligned observations × candidates matrix.
//! - [`weights`]: the simplex-constrained weight vector with provenance.
//! - [`options`]: run configuration (optimizer, seeding, folds, masking
//!   threshold).

pub mod candidates;
pub mod likelihoods;
pub mod options;
pub mod weights;

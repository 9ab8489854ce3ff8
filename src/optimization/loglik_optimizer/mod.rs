//! loglik_optimizer — MLE-friendly, argmin-powered log-likelihood optimizer.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed optimization layer for **maximizing
//! log-likelihoods** `ℓ(θ)`. Callers implement a single trait,
//! [`LogLikelihood`], and invoke [`maximize`] to run L-BFGS with a
//! configurable line search, tolerances, and finite-difference fallbacks.
//! In this crate the primary client is the stacking layer, whose objective
//! is the held-out log-likelihood of a weighted mixture of candidate models.
//!
//! Key behaviors
//! -------------
//! - Convert user-supplied log-likelihoods `ℓ(θ)` into Argmin-compatible
//!   cost functions `c(θ) = -ℓ(θ)` via [`adapter::ArgMinAdapter`].
//! - Expose a single, user-facing entrypoint [`maximize`] that:
//!   - validates the initial guess with [`LogLikelihood::check`],
//!   - selects an L-BFGS solver via [`builders`] based on
//!     [`traits::LineSearcher`],
//!   - executes the solver via [`run::run_lbfgs`], and
//!   - normalizes results into an [`OptimOutcome`].
//! - Fall back to robust finite differences (central, then forward, with
//!   error capture) when no analytic gradient is provided.
//! - Centralize optimizer configuration ([`Tolerances`], [`MLEOptions`]) and
//!   validation logic ([`validation`]) so downstream code can assume sane,
//!   finite inputs.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes** a log-likelihood `ℓ(θ)` by minimizing
//!   a cost `c(θ) = -ℓ(θ)`; user code must implement `ℓ(θ)` and `∇ℓ(θ)`
//!   (when available), **never** the cost directly.
//! - [`LogLikelihood::value`] and [`LogLikelihood::grad`] must treat invalid
//!   inputs as recoverable [`crate::optimization::errors::OptError`] values,
//!   not panics.
//! - Parameters live in an unconstrained optimizer space as [`Theta`]
//!   (`Array1<f64>`). Any mapping from constrained space (e.g., the weight
//!   simplex) to unconstrained space happens in the model layer.
//!
//! Downstream usage
//! ----------------
//! - Model code implements [`LogLikelihood`] for its types, then calls
//!   [`maximize`] with a model instance, an initial [`Theta`], a data
//!   payload, and an [`MLEOptions`] configuration.
//! - Higher-level front-ends are expected to interact only with the
//!   re-exported surface: [`maximize`], [`LogLikelihood`], [`MLEOptions`],
//!   [`Tolerances`], [`OptimOutcome`], plus numeric aliases from [`types`].
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign conventions and gradient handling
//!   in [`adapter`], solver construction and tolerance wiring in
//!   [`builders`], and configuration/outcome invariants in [`traits`] and
//!   [`validation`].
//! - Integration tests exercise [`maximize`] implicitly by fitting stacking
//!   weights on synthetic held-out likelihood matrices.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, FnEvalMap, Grad, Theta, DEFAULT_LBFGS_MEM};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use sdm_ensemble::optimization::loglik_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}

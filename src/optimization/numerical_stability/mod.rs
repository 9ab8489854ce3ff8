//! numerical_stability — numerically robust simplex transformations.
//!
//! Purpose
//! -------
//! Collect the numerically stable transforms used to move between
//! unconstrained stacking logits and mixture weights on the unit simplex.
//! Centralizing the transforms and their small tolerances here lets the
//! optimizer and stacking layers assume well-conditioned `f64` arithmetic.
//!
//! Key behaviors
//! -------------
//! - Provide a max-shift softmax (`safe_softmax`) mapping ℝᴷ onto the unit
//!   simplex without overflow.
//! - Provide the matching Jacobian–vector product (`safe_softmax_jvp`) for
//!   propagating simplex-space gradients back to logit space.
//! - Provide a clamped inverse map (`weights_to_logits`) so fitted or
//!   externally supplied weight vectors can re-enter optimizer space.
//! - Centralize the shared tolerances `LOGIT_EPS` and `WEIGHT_SUM_TOL`.
//!
//! Conventions
//! -----------
//! - All routines operate on `ndarray` types over `f64` and never log,
//!   perform I/O, or touch global state; they are pure helpers suitable for
//!   tight inner loops.
//! - Shape agreement between weights and gradients is the caller's
//!   responsibility; these helpers do not re-validate lengths.
//!
//! Testing notes
//! -------------
//! - Unit tests cover simplex membership under extreme logits, agreement of
//!   the JVP with finite differences, and round-trip behavior of the inverse
//!   map (including clamped zero weights).

pub mod transformations;

pub use transformations::{
    safe_softmax, safe_softmax_jvp, weights_to_logits, LOGIT_EPS, WEIGHT_SUM_TOL,
};

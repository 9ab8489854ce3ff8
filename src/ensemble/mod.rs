//! ensemble — weighted combination of candidate projections.
//!
//! Purpose
//! -------
//! Blend per-candidate projections into a single ensemble prediction using a
//! stacking weight vector, in either output mode: weighted-mean point
//! estimates ([`point::combine_points`]) or per-draw-index blends of
//! joint-precision simulation draws ([`draws::combine_draws`]). The same
//! weight vector is reused across climate scenarios; each scenario's output
//! is packaged as an [`report::EnsembleRun`].
//!
//! Key behaviors
//! -------------
//! - Candidate tables must cover the identical (time, spatial-unit) key set;
//!   any disagreement aborts the combine with a key-mismatch error — no
//!   partial joins.
//! - Draw index n is combined as-is across candidates (independent samples
//!   treated as directly comparable; see [`draws`] for why this matters).
//! - [`overlap::bhattacharyya`] quantifies the overlap of two prediction
//!   surfaces treated as spatial densities.
//!
//! Concurrency
//! -----------
//! - All inputs are immutable snapshots and every combine allocates its own
//!   output, so scenario runs can be executed independently; a sequential
//!   loop is sufficient for correctness.

pub mod draws;
pub mod errors;
pub mod keys;
pub mod overlap;
pub mod point;
pub mod report;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::draws::{combine_draws, DrawPredictions};
pub use self::errors::{EnsembleError, EnsembleResult};
pub use self::keys::PredictionKey;
pub use self::overlap::bhattacharyya;
pub use self::point::{combine_points, PointPredictions};
pub use self::report::{EnsemblePredictions, EnsembleRun, ScenarioLabel, WeightRow};

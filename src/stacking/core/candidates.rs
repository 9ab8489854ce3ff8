//! Candidate model descriptors.
//!
//! A candidate is one already-fitted species distribution model. The fitting
//! library owns its parameters; this crate only carries the metadata needed
//! to identify a candidate in reports and to track whether its own fit
//! converged. The held-out log-likelihoods live separately in
//! [`crate::stacking::core::likelihoods::HeldOutLogLik`].

/// Structural configuration of a candidate model.
///
/// Mirrors the model-selection axes of the fitting stage: whether the model
/// carries a spatial random effect, an environmental spline, and a depth
/// covariate. Purely descriptive here; the flags never influence stacking
/// arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CandidateSpec {
    /// Spatial random effect included.
    pub spatial: bool,
    /// Environmental covariate spline included.
    pub env_spline: bool,
    /// Depth covariate included.
    pub depth: bool,
}

impl CandidateSpec {
    /// Construct a spec from its three structural flags.
    pub fn new(spatial: bool, env_spline: bool, depth: bool) -> CandidateSpec {
        CandidateSpec { spatial, env_spline, depth }
    }
}

/// Identity and fit status of a candidate model.
///
/// Fields
/// ------
/// - `id`: stable identifier used in weight reports and ensemble output.
/// - `spec`: structural configuration flags.
/// - `converged`: whether the candidate's own fit converged. Non-converged
///   candidates are *not* removed here; the caller decides whether to include
///   them, and the flag is carried through to the weight report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMeta {
    pub id: String,
    pub spec: CandidateSpec,
    pub converged: bool,
}

impl CandidateMeta {
    /// Construct candidate metadata.
    pub fn new(id: impl Into<String>, spec: CandidateSpec, converged: bool) -> CandidateMeta {
        CandidateMeta { id: id.into(), spec, converged }
    }
}

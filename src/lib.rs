//! sdm_ensemble — likelihood-weighted stacking and ensemble projection for
//! species distribution models, with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the stacking workflow to Python via the `_sdm_ensemble` extension
//! module. The crate turns cross-validation output from a set of fitted SDM
//! candidates (per-observation held-out log-likelihoods) into convex
//! stacking weights, then blends per-candidate projections — point estimates
//! or joint-precision simulation draws — into ensemble predictions per
//! climate scenario.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules ([`stacking`], [`ensemble`], and
//!   [`optimization`]) as the public crate surface.
//! - Define the `#[pyclass]` wrapper and `#[pymodule]` initializer for the
//!   `_sdm_ensemble` Python extension when the `python-bindings` feature is
//!   enabled.
//!
//! Invariants & assumptions
//! ------------------------
//! - All heavy numerical work is implemented in the inner Rust modules; the
//!   PyO3 items perform only FFI glue, input validation, and error mapping.
//! - Candidate fitting itself (mesh construction, Laplace approximation,
//!   joint-precision simulation) belongs to the external modeling library;
//!   this crate consumes its outputs and never re-implements it.
//!
//! Conventions
//! -----------
//! - Weight vectors are non-negative and sum to one; a failed stacking
//!   optimization is replaced by a visibly tagged uniform fallback rather
//!   than an abort.
//! - Errors from core Rust code are propagated as rich error types
//!   internally and converted to `PyErr` values at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend directly on the inner modules and can
//!   ignore the PyO3 items guarded by the `python-bindings` feature.
//! - External users are expected to interact with either the safe Rust APIs
//!   or the Python wrapper class; the PyO3 plumbing is considered internal.
//!
//! Testing notes
//! -------------
//! - Core numerical behavior is covered by unit tests in the inner modules
//!   and by the integration suite under `tests/`.
//! - The PyO3 surface is expected to be smoke-tested from Python.

pub mod ensemble;
pub mod optimization;
pub mod stacking;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    stacking::{
        CandidateMeta, CandidateSpec, HeldOutLogLik, LikelihoodMatrix, StackingModel,
        WeightSource,
    },
    utils::{build_stacking_options, extract_f64_matrix, extract_fold_ids},
};

/// Stacking — Python-facing wrapper for likelihood-weighted model stacking.
///
/// Purpose
/// -------
/// Fit stacking weights over a held-out log-likelihood matrix from Python
/// and expose the fitted weights, fallback status, and masking diagnostics
/// as read-only properties. All computation is forwarded to
/// [`StackingModel`].
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `Stacking(seed=42, tol_grad=1e-6, tol_cost=None, max_iter=300,
/// line_searcher='MoreThuente', lbfgs_mem=None, folds=None,
/// exclusion_warn_fraction=0.1)`.
///
/// Notes
/// -----
/// - Native Rust callers should use [`StackingModel`] directly; this type
///   exists solely for the PyO3 binding surface.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "sdm_ensemble", unsendable)]
pub struct Stacking {
    /// Underlying Rust stacking model.
    pub inner: StackingModel,
    /// Candidate identifiers from the last fit.
    candidate_ids: Vec<String>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl Stacking {
    #[new]
    #[pyo3(
        signature = (
            seed = None,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            folds = None,
            exclusion_warn_fraction = None,
        ),
        text_signature = "(seed=42, /, tol_grad=1e-6, tol_cost=None, max_iter=300, \
                          line_searcher='MoreThuente', lbfgs_mem=None, folds=None, \
                          exclusion_warn_fraction=0.1)"
    )]
    pub fn new(
        seed: Option<u64>, tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
        line_searcher: Option<&str>, lbfgs_mem: Option<usize>, folds: Option<Vec<u32>>,
        exclusion_warn_fraction: Option<f64>,
    ) -> PyResult<Self> {
        let options = build_stacking_options(
            seed,
            tol_grad,
            tol_cost,
            max_iter,
            line_searcher,
            lbfgs_mem,
            folds,
            exclusion_warn_fraction,
        )?;
        Ok(Stacking { inner: StackingModel::new(options), candidate_ids: Vec::new() })
    }

    /// Fit stacking weights on an observations × candidates matrix of
    /// held-out log-likelihoods, falling back to uniform weights when the
    /// optimization fails.
    #[pyo3(
        signature = (loglik, folds = None, candidate_ids = None),
        text_signature = "(self, loglik, /, folds=None, candidate_ids=None)"
    )]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, loglik: &Bound<'py, PyAny>, folds: Option<&Bound<'py, PyAny>>,
        candidate_ids: Option<Vec<String>>,
    ) -> PyResult<()> {
        let matrix_ro = extract_f64_matrix(py, loglik)?;
        let matrix_view = matrix_ro.as_array();
        let n_obs = matrix_view.nrows();
        let k = matrix_view.ncols();

        let fold_ids = match folds {
            Some(raw) => extract_fold_ids(raw)?,
            None => vec![0u32; n_obs],
        };
        let ids: Vec<String> = match candidate_ids {
            Some(ids) => ids,
            None => (0..k).map(|j| format!("candidate_{j}")).collect(),
        };

        let mut candidates = Vec::with_capacity(k);
        for (j, id) in ids.iter().enumerate() {
            let column = Array1::from_iter(matrix_view.column(j).iter().cloned());
            let meta = CandidateMeta::new(id.clone(), CandidateSpec::default(), true);
            candidates.push(HeldOutLogLik::new(meta, column, fold_ids.clone())?);
        }
        let data = LikelihoodMatrix::from_candidates(candidates)?;
        self.inner.fit_or_uniform(&data)?;
        self.candidate_ids = ids;
        Ok(())
    }

    /// Fitted weights in candidate (column) order.
    #[getter]
    pub fn weights(&self) -> PyResult<Vec<f64>> {
        Ok(self.inner.weights()?.values().to_vec())
    }

    /// True when the weights are a uniform fallback after a failed
    /// optimization.
    #[getter]
    pub fn uniform_fallback(&self) -> PyResult<bool> {
        Ok(self.inner.weights()?.source() == WeightSource::UniformFallback)
    }

    /// Termination status string of the last successful optimization.
    #[getter]
    pub fn status(&self) -> Option<String> {
        self.inner.results.as_ref().map(|r| r.status.clone())
    }

    /// Fraction of held-out observations masked at the fitted weights.
    #[getter]
    pub fn excluded_fraction(&self) -> Option<f64> {
        self.inner.exclusion.map(|report| report.fraction())
    }

    /// Candidate identifiers from the last fit.
    #[getter]
    pub fn candidate_ids(&self) -> Vec<String> {
        self.candidate_ids.clone()
    }
}

/// _sdm_ensemble — PyO3 module initializer for the Python extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _sdm_ensemble<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<Stacking>()?;
    Ok(())
}

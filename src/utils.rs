//! PyO3 input helpers for the Python-facing API.
//!
//! Everything here is gated behind the `python-bindings` feature. These
//! helpers convert Python-friendly inputs (numpy arrays, pandas outputs,
//! plain sequences, option strings) into the validated Rust types the
//! stacking core consumes, and centralize the error mapping so the binding
//! classes in `lib.rs` stay thin.

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
    stacking::StackingOptions,
};

/// Extract a 2-D float64 matrix from a numpy array or nested sequence.
///
/// Accepts, in order of preference:
/// - a contiguous 2-D `numpy.ndarray` of float64,
/// - anything exposing `to_numpy()` (e.g., a pandas DataFrame),
/// - a nested sequence of float64 rows (rectangular).
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray2<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro);
    }

    if let Ok(obj) = raw_data.call_method0("to_numpy") {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro);
        }
    }

    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyValueError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or nested sequence of float64",
        )
    })?;
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, |r| r.len());
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(PyValueError::new_err("nested sequence rows must all have the same length"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let arr = ndarray::Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(arr.into_pyarray(py).readonly())
}

/// Extract a fold-assignment vector as `Vec<u32>`.
///
/// Accepts any Python sequence (or 1-D integer array) convertible to
/// unsigned 32-bit fold ids.
#[cfg(feature = "python-bindings")]
pub fn extract_fold_ids(raw_folds: &Bound<'_, PyAny>) -> PyResult<Vec<u32>> {
    raw_folds.extract().map_err(|_| {
        PyValueError::new_err("expected a 1-D sequence of non-negative integer fold ids")
    })
}

/// Assemble validated [`StackingOptions`] from Python-friendly arguments.
///
/// Defaults mirror the Rust layer: `tol_grad = 1e-6`, `max_iter = 300`,
/// More–Thuente line search, seed 42, 10% masking warning threshold.
#[cfg(feature = "python-bindings")]
pub fn build_stacking_options(
    seed: Option<u64>, tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, folds: Option<Vec<u32>>,
    exclusion_warn_fraction: Option<f64>,
) -> PyResult<StackingOptions> {
    let defaults = StackingOptions::default();
    let tols = Tolerances::new(
        tol_grad.or(Some(1e-6)),
        tol_cost,
        max_iter.or(Some(300)),
    )
    .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let searcher = match line_searcher {
        Some(name) => name
            .parse::<LineSearcher>()
            .map_err(|e| PyValueError::new_err(e.to_string()))?,
        None => LineSearcher::MoreThuente,
    };
    let mle_opts = MLEOptions::new(tols, searcher, lbfgs_mem)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let warn_fraction =
        exclusion_warn_fraction.unwrap_or(defaults.exclusion_warn_fraction);
    Ok(StackingOptions::new(mle_opts, seed.or(defaults.seed), folds, warn_fraction)?)
}

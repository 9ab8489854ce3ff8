//! Ensemble run output: weight table plus blended predictions.
//!
//! Purpose
//! -------
//! Assemble the single table emitted per ensemble run: one weight row per
//! candidate (identifier, weight, convergence flag) and the blended
//! predictions for one climate scenario — point estimates or an N-wide draw
//! block. The same fitted weight vector is reused across scenarios; callers
//! loop over their scenario set and build one [`EnsembleRun`] each (scenario
//! runs are independent, so a sequential loop is sufficient).
//!
//! Persistence of the table (e.g., to a columnar file) is the caller's
//! responsibility; this module only guarantees internal consistency.

use crate::{
    ensemble::{
        draws::{combine_draws, DrawPredictions},
        errors::{EnsembleError, EnsembleResult},
        point::{combine_points, PointPredictions},
    },
    stacking::{CandidateMeta, StackingWeights, WeightSource},
};

/// Identity of one projection scenario: climate model × time horizon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScenarioLabel {
    /// Climate model the projection covariates come from.
    pub climate_model: String,
    /// Time horizon label (e.g., "2040-2060").
    pub period: String,
}

impl ScenarioLabel {
    /// Construct a scenario label.
    pub fn new(climate_model: impl Into<String>, period: impl Into<String>) -> ScenarioLabel {
        ScenarioLabel { climate_model: climate_model.into(), period: period.into() }
    }
}

impl std::fmt::Display for ScenarioLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.climate_model, self.period)
    }
}

/// One row of the weight table.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightRow {
    /// Candidate identifier.
    pub candidate: String,
    /// Stacking weight assigned to the candidate.
    pub weight: f64,
    /// Whether the candidate's own fit converged.
    pub converged: bool,
}

/// Blended predictions in either output mode.
#[derive(Debug, Clone, PartialEq)]
pub enum EnsemblePredictions {
    /// Weighted-mean point estimates per key.
    Point(PointPredictions),
    /// N blended simulation draws per key.
    Draws(DrawPredictions),
}

/// The output table of one ensemble run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleRun {
    /// Scenario the predictions belong to.
    pub scenario: ScenarioLabel,
    /// One row per candidate, in weight order.
    pub weights: Vec<WeightRow>,
    /// Whether the weights were optimized or are a uniform fallback.
    pub weight_source: WeightSource,
    /// Blended predictions keyed by (time, spatial-unit).
    pub predictions: EnsemblePredictions,
}

impl EnsembleRun {
    /// Build a point-mode run: blend the candidate tables and attach the
    /// weight rows.
    ///
    /// # Errors
    /// - [`EnsembleError::CandidateCountMismatch`] when metadata and tables
    ///   disagree in count.
    /// - Everything [`combine_points`] reports (weight length, key sets).
    pub fn point(
        scenario: ScenarioLabel, metas: &[CandidateMeta], weights: &StackingWeights,
        tables: &[PointPredictions],
    ) -> EnsembleResult<EnsembleRun> {
        let blended = combine_points(tables, weights)?;
        let rows = weight_rows(metas, weights, tables.len())?;
        Ok(EnsembleRun {
            scenario,
            weights: rows,
            weight_source: weights.source(),
            predictions: EnsemblePredictions::Point(blended),
        })
    }

    /// Build a simulation-mode run: blend the candidate draw blocks and
    /// attach the weight rows.
    ///
    /// # Errors
    /// - [`EnsembleError::CandidateCountMismatch`] when metadata and blocks
    ///   disagree in count.
    /// - Everything [`combine_draws`] reports (weight length, key sets, draw
    ///   counts).
    pub fn draws(
        scenario: ScenarioLabel, metas: &[CandidateMeta], weights: &StackingWeights,
        blocks: &[DrawPredictions],
    ) -> EnsembleResult<EnsembleRun> {
        let blended = combine_draws(blocks, weights)?;
        let rows = weight_rows(metas, weights, blocks.len())?;
        Ok(EnsembleRun {
            scenario,
            weights: rows,
            weight_source: weights.source(),
            predictions: EnsemblePredictions::Draws(blended),
        })
    }
}

/// Pair candidate metadata with weights into report rows.
fn weight_rows(
    metas: &[CandidateMeta], weights: &StackingWeights, n_tables: usize,
) -> EnsembleResult<Vec<WeightRow>> {
    if metas.len() != n_tables {
        return Err(EnsembleError::CandidateCountMismatch {
            expected: n_tables,
            actual: metas.len(),
        });
    }
    Ok(metas
        .iter()
        .zip(weights.values().iter())
        .map(|(meta, &weight)| WeightRow {
            candidate: meta.id.clone(),
            weight,
            converged: meta.converged,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ensemble::keys::PredictionKey,
        stacking::{CandidateSpec, StackingWeights, WeightSource},
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Weight-row assembly, including the convergence flag and the weight
    //   provenance tag.
    // - The metadata/table count guard.
    //
    // They intentionally DO NOT cover:
    // - Blending arithmetic (point/draws module tests).
    // -------------------------------------------------------------------------

    fn metas() -> Vec<CandidateMeta> {
        vec![
            CandidateMeta::new("spatial", CandidateSpec::new(true, false, false), true),
            CandidateMeta::new("env", CandidateSpec::new(false, true, false), false),
        ]
    }

    fn tables() -> Vec<PointPredictions> {
        let keys = vec![PredictionKey::new(2020, 1), PredictionKey::new(2020, 2)];
        vec![
            PointPredictions::new(keys.clone(), array![1.0, 2.0], Some("spatial".into())).unwrap(),
            PointPredictions::new(keys, array![3.0, 4.0], Some("env".into())).unwrap(),
        ]
    }

    #[test]
    // Purpose
    // -------
    // Verify that a point-mode run carries one row per candidate with the
    // right weight and convergence flag, and records the weight provenance.
    fn point_run_assembles_weight_table() {
        let scenario = ScenarioLabel::new("gfdl", "2040-2060");
        let weights = StackingWeights::new(array![0.8, 0.2], WeightSource::Optimized).unwrap();

        let run = EnsembleRun::point(scenario.clone(), &metas(), &weights, &tables()).unwrap();

        assert_eq!(run.scenario, scenario);
        assert_eq!(run.weight_source, WeightSource::Optimized);
        assert_eq!(run.weights.len(), 2);
        assert_eq!(run.weights[0].candidate, "spatial");
        assert!((run.weights[0].weight - 0.8).abs() < 1e-15);
        assert!(run.weights[0].converged);
        assert!(!run.weights[1].converged);
        match run.predictions {
            EnsemblePredictions::Point(p) => {
                assert!((p.values()[0] - (0.8 + 0.2 * 3.0)).abs() < 1e-12);
            }
            EnsemblePredictions::Draws(_) => panic!("expected point predictions"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that a uniform-fallback weight vector is visibly tagged on the
    // run and that mismatched metadata counts are rejected.
    fn run_tags_fallback_and_guards_counts() {
        let scenario = ScenarioLabel::new("ipsl", "2080-2100");
        let weights = StackingWeights::uniform(2).unwrap();

        let run = EnsembleRun::point(scenario.clone(), &metas(), &weights, &tables()).unwrap();
        assert_eq!(run.weight_source, WeightSource::UniformFallback);

        let all_metas = metas();
        assert!(matches!(
            EnsembleRun::point(scenario, &all_metas[..1], &weights, &tables()),
            Err(EnsembleError::CandidateCountMismatch { expected: 2, actual: 1 })
        ));
    }
}

//! Bhattacharyya overlap between two prediction surfaces.
//!
//! Treats each surface as a discrete spatial density: values are normalized
//! to unit mass over the shared key set, then the coefficient
//! `BC = Σ_i √(p_i · q_i)` is accumulated. BC lies in [0, 1]: 1 for
//! identical distributions, 0 for disjoint support. Used to quantify how
//! much two species' (or two scenarios') predicted distributions overlap.

use crate::ensemble::{
    errors::{EnsembleError, EnsembleResult},
    point::{verify_key_agreement, PointPredictions},
};

/// Bhattacharyya coefficient between two surfaces over identical keys.
///
/// Both tables are normalized to unit mass internally; the raw value scales
/// (e.g., biomass vs density) therefore do not matter, only the shapes.
///
/// # Errors
/// - [`EnsembleError::KeyCountMismatch`] / [`EnsembleError::KeyMismatch`]
///   when the tables do not share an identical key set.
/// - [`EnsembleError::NegativeDensity`] if a value is negative.
/// - [`EnsembleError::ZeroMassDensity`] if a surface sums to zero.
pub fn bhattacharyya(a: &PointPredictions, b: &PointPredictions) -> EnsembleResult<f64> {
    verify_key_agreement(a.keys(), std::iter::once((1, b.keys())))?;
    let mass_a = density_mass(a)?;
    let mass_b = density_mass(b)?;

    let mut coefficient = 0.0;
    for (&va, &vb) in a.values().iter().zip(b.values().iter()) {
        coefficient += ((va / mass_a) * (vb / mass_b)).sqrt();
    }
    Ok(coefficient)
}

/// Total mass of a surface, validating non-negativity.
fn density_mass(surface: &PointPredictions) -> EnsembleResult<f64> {
    let mut mass = 0.0;
    for (position, &value) in surface.values().iter().enumerate() {
        if value < 0.0 {
            return Err(EnsembleError::NegativeDensity { position, value });
        }
        mass += value;
    }
    if mass <= 0.0 {
        return Err(EnsembleError::ZeroMassDensity);
    }
    Ok(mass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::keys::PredictionKey;
    use ndarray::array;

    fn surface(values: ndarray::Array1<f64>) -> PointPredictions {
        let keys = (0..values.len()).map(|c| PredictionKey::new(2020, c as u64)).collect();
        PointPredictions::new(keys, values, None).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify that a surface overlaps itself completely (BC = 1) regardless
    // of its raw scale.
    fn identical_surfaces_overlap_completely() {
        let a = surface(array![1.0, 3.0, 6.0]);
        let scaled = surface(array![10.0, 30.0, 60.0]);
        let bc = bhattacharyya(&a, &scaled).unwrap();
        assert!((bc - 1.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify that disjoint-support surfaces have zero overlap.
    fn disjoint_surfaces_do_not_overlap() {
        let a = surface(array![1.0, 1.0, 0.0, 0.0]);
        let b = surface(array![0.0, 0.0, 1.0, 1.0]);
        let bc = bhattacharyya(&a, &b).unwrap();
        assert!(bc.abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify the hand-checked value for two uniform halves sharing half
    // their support: BC = √(0.5·0.5) + √(0.5·0.5)·0 + ... = 0.5·√2 ≈ 0.707
    // for overlap on one of two cells each.
    fn partial_overlap_matches_hand_computation() {
        let a = surface(array![1.0, 1.0, 0.0]);
        let b = surface(array![0.0, 1.0, 1.0]);
        let bc = bhattacharyya(&a, &b).unwrap();
        assert!((bc - 0.5).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify the guards: mismatched keys, negative values, zero total mass.
    fn overlap_guards_reject_invalid_surfaces() {
        let a = surface(array![1.0, 1.0]);
        let other_keys = PointPredictions::new(
            vec![PredictionKey::new(2021, 0), PredictionKey::new(2021, 1)],
            array![1.0, 1.0],
            None,
        )
        .unwrap();
        assert!(matches!(
            bhattacharyya(&a, &other_keys),
            Err(EnsembleError::KeyMismatch { .. })
        ));

        let negative = surface(array![1.0, -0.5]);
        assert!(matches!(
            bhattacharyya(&a, &negative),
            Err(EnsembleError::NegativeDensity { position: 1, .. })
        ));

        let zero = surface(array![0.0, 0.0]);
        assert!(matches!(bhattacharyya(&a, &zero), Err(EnsembleError::ZeroMassDensity)));
    }
}

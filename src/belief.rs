// src/belief.rs
//
// Bayesian revision after an unsuccessful round.
//
// With priors p_i and round effectiveness e_i (0 for regions not searched):
//
//     denom = Σ p_i (1 - e_i)
//     p_i'  = p_i (1 - e_i) / denom
//
// Mass moves away from thoroughly searched regions toward untouched ones.

use crate::error::SearchError;

/// Revise `beliefs` in place. Fails without touching `beliefs` if the
/// denominator is zero or not finite.
pub fn revise(beliefs: &mut [f64], effectiveness: &[f64]) -> Result<(), SearchError> {
    debug_assert_eq!(beliefs.len(), effectiveness.len());

    let denom: f64 = beliefs
        .iter()
        .zip(effectiveness)
        .map(|(p, e)| p * (1.0 - e))
        .sum();

    if !denom.is_finite() || denom <= 0.0 {
        return Err(SearchError::DegenerateBelief { denominator: denom });
    }

    for (p, e) in beliefs.iter_mut().zip(effectiveness) {
        *p = *p * (1.0 - e) / denom;
    }
    Ok(())
}

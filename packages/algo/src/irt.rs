//! Three-Parameter Logistic (3PL) Model
//!
//! Response probability under IRT: `p = c + (1 - c) / (1 + exp(-D*a*(θ - b)))`
//! with the fixed scaling constant D = 1.702.

use crate::types::{Irt3pl, SCALING_D};

/// Exponent bound before calling `exp`. Probabilities saturate to ~c or ~1
/// well inside this range, so clamping never changes the result.
const MAX_EXPONENT: f64 = 500.0;

/// Probability of a correct response at ability `theta`.
/// Always within `[c, 1]`; strictly increasing in `theta` for `a > 0`.
pub fn probability(theta: f64, params: &Irt3pl) -> f64 {
    probability_with_discrimination(theta, params, params.a)
}

/// Same model with a caller-supplied discrimination. The rapid-guess penalty
/// uses this to neutralize single likelihood terms without touching the
/// shared item parameters.
pub fn probability_with_discrimination(theta: f64, params: &Irt3pl, a: f64) -> f64 {
    let exponent = (-SCALING_D * a * (theta - params.b)).clamp(-MAX_EXPONENT, MAX_EXPONENT);
    params.c + (1.0 - params.c) / (1.0 + exponent.exp())
}

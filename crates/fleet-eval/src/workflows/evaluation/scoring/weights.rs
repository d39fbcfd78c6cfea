use super::super::domain::CriterionId;

/// Total the active weights must add up to.
pub const WEIGHT_TOTAL: f64 = 100.0;

/// Allowed deviation from [`WEIGHT_TOTAL`], exclusive.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Raised when a candidate weight set does not add up to 100.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("criteria weights must total {expected:.2} (found {total:.3}, off by {delta:+.3})")]
pub struct WeightSumError {
    pub expected: f64,
    pub total: f64,
    pub delta: f64,
}

/// Sum the candidate weights and accept them only within the tolerance band.
pub fn check_weight_sum<'a, I>(weights: I) -> Result<f64, WeightSumError>
where
    I: IntoIterator<Item = (&'a CriterionId, f64)>,
{
    let total: f64 = weights.into_iter().map(|(_, weight)| weight).sum();
    let delta = total - WEIGHT_TOTAL;

    if delta.abs() < WEIGHT_TOLERANCE {
        Ok(total)
    } else {
        Err(WeightSumError {
            expected: WEIGHT_TOTAL,
            total,
            delta,
        })
    }
}

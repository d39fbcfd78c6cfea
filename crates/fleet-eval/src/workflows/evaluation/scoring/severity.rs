use super::super::domain::{Criterion, PenaltyTiers, Severity};

/// Points left from the 100-point baseline once the tier's penalty is deducted.
///
/// The result is not clamped; penalties are range-checked when a criterion is written.
pub fn score_for(criterion: &Criterion, severity: Severity) -> f64 {
    BASELINE - penalty_for(&criterion.penalties, severity)
}

pub(crate) fn penalty_for(penalties: &PenaltyTiers, severity: Severity) -> f64 {
    match severity {
        Severity::SemOcorrencia => 0.0,
        Severity::Leve => penalties.leve,
        Severity::Medio => penalties.medio,
        Severity::Grave => penalties.grave,
    }
}

pub(crate) const BASELINE: f64 = 100.0;

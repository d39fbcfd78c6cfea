use super::domain::{
    Criterion, CriterionAssessment, CriterionId, DriverId, EvaluationSubmission, PenaltyTiers,
    Transport, TransportId, TransportStatus,
};
use super::scoring::{check_weight_sum, WeightSumError};

/// Field-level problems with a criterion definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriterionViolation {
    #[error("criterion name must not be empty")]
    EmptyName,
    #[error("criterion weight must be greater than 0 and at most 100 (found {0})")]
    InvalidWeight(f64),
    #[error("{tier} must be between 0 and 100 (found {value})")]
    PenaltyOutOfRange { tier: &'static str, value: f64 },
    #[error("a criterion named '{0}' already exists")]
    DuplicateName(String),
    #[error("criterion {0} appears more than once in the update")]
    DuplicateEntry(CriterionId),
}

impl CriterionViolation {
    pub fn field(&self) -> &'static str {
        match self {
            CriterionViolation::EmptyName | CriterionViolation::DuplicateName(_) => "name",
            CriterionViolation::InvalidWeight(_) => "weight",
            CriterionViolation::PenaltyOutOfRange { tier, .. } => *tier,
            CriterionViolation::DuplicateEntry(_) => "items",
        }
    }
}

pub(crate) fn validate_name(name: &str) -> Result<String, CriterionViolation> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CriterionViolation::EmptyName);
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_weight(weight: f64) -> Result<f64, CriterionViolation> {
    if weight.is_finite() && weight > 0.0 && weight <= 100.0 {
        Ok(weight)
    } else {
        Err(CriterionViolation::InvalidWeight(weight))
    }
}

pub(crate) fn validate_penalties(penalties: PenaltyTiers) -> Result<PenaltyTiers, CriterionViolation> {
    for (tier, value) in [
        ("penalty_leve", penalties.leve),
        ("penalty_medio", penalties.medio),
        ("penalty_grave", penalties.grave),
    ] {
        if !(value.is_finite() && (0.0..=100.0).contains(&value)) {
            return Err(CriterionViolation::PenaltyOutOfRange { tier, value });
        }
    }
    Ok(penalties)
}

/// Reasons an evaluation is refused before anything is persisted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationViolation {
    #[error("an incident description is required when an incident is reported")]
    IncidentDescriptionRequired,
    #[error("a manual score may only replace the computed score when an incident is reported")]
    ManualScoreWithoutIncident,
    #[error("manual score must be between 0 and 100 (found {0})")]
    ManualScoreOutOfRange(f64),
    #[error("transport {transport} is {status} and cannot be evaluated yet")]
    TransportNotDelivered {
        transport: TransportId,
        status: &'static str,
    },
    #[error("transport {0} has already been evaluated")]
    AlreadyEvaluated(TransportId),
    #[error("driver {found} did not run transport {transport} (expected {expected})")]
    DriverMismatch {
        transport: TransportId,
        expected: DriverId,
        found: DriverId,
    },
    #[error(transparent)]
    UnbalancedWeights(#[from] WeightSumError),
}

impl EvaluationViolation {
    pub fn field(&self) -> &'static str {
        match self {
            EvaluationViolation::IncidentDescriptionRequired => "incident_description",
            EvaluationViolation::ManualScoreWithoutIncident
            | EvaluationViolation::ManualScoreOutOfRange(_) => "manual_score",
            EvaluationViolation::TransportNotDelivered { .. }
            | EvaluationViolation::AlreadyEvaluated(_) => "transport_id",
            EvaluationViolation::DriverMismatch { .. } => "driver_id",
            EvaluationViolation::UnbalancedWeights(_) => "criteria",
        }
    }

    /// Whether the violation concerns the transport's state rather than the payload.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EvaluationViolation::TransportNotDelivered { .. }
                | EvaluationViolation::AlreadyEvaluated(_)
        )
    }
}

/// Submission that passed every precondition and can be handed to the scoring engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub transport_id: TransportId,
    pub driver_id: DriverId,
    pub had_incident: bool,
    pub incident_description: Option<String>,
    pub manual_score: Option<f64>,
    pub assessments: Vec<CriterionAssessment>,
}

/// Guard enforcing evaluation preconditions ahead of the scoring engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvaluationGuard;

impl EvaluationGuard {
    pub fn new() -> Self {
        Self
    }

    /// Check the evaluator's payload against the transport it refers to.
    pub fn check_submission(
        &self,
        submission: EvaluationSubmission,
        transport: &Transport,
        already_evaluated: bool,
    ) -> Result<ValidatedSubmission, EvaluationViolation> {
        let incident_description = submission
            .incident_description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        if submission.had_incident && incident_description.is_none() {
            return Err(EvaluationViolation::IncidentDescriptionRequired);
        }

        if let Some(score) = submission.manual_score {
            if !submission.had_incident {
                return Err(EvaluationViolation::ManualScoreWithoutIncident);
            }
            if !(score.is_finite() && (0.0..=100.0).contains(&score)) {
                return Err(EvaluationViolation::ManualScoreOutOfRange(score));
            }
        }

        if transport.status != TransportStatus::Delivered {
            return Err(EvaluationViolation::TransportNotDelivered {
                transport: transport.id.clone(),
                status: transport.status.label(),
            });
        }

        if already_evaluated {
            return Err(EvaluationViolation::AlreadyEvaluated(transport.id.clone()));
        }

        if submission.driver_id != transport.driver_id {
            return Err(EvaluationViolation::DriverMismatch {
                transport: transport.id.clone(),
                expected: transport.driver_id.clone(),
                found: submission.driver_id,
            });
        }

        Ok(ValidatedSubmission {
            transport_id: submission.transport_id,
            driver_id: submission.driver_id,
            had_incident: submission.had_incident,
            incident_description: if submission.had_incident {
                incident_description
            } else {
                None
            },
            manual_score: submission.manual_score,
            assessments: submission.assessments,
        })
    }

    /// Active weights must add up to 100 before anyone is scored against them.
    pub fn check_weights(&self, criteria: &[Criterion]) -> Result<f64, EvaluationViolation> {
        let total = check_weight_sum(
            criteria
                .iter()
                .filter(|criterion| criterion.is_active)
                .map(|criterion| (&criterion.id, criterion.weight)),
        )?;
        Ok(total)
    }
}

pub(crate) fn active_weight_total(criteria: &[Criterion]) -> f64 {
    criteria
        .iter()
        .filter(|criterion| criterion.is_active)
        .map(|criterion| criterion.weight)
        .sum()
}

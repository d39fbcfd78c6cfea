//! Driver evaluation after delivery: criteria administration, weighted scoring, and the
//! intake of immutable evaluation records.

pub mod domain;
pub mod dto;
pub mod extract;
pub mod guard;
pub mod report;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Criterion, CriterionAssessment, CriterionChanges, CriterionDraft, CriterionId, CriterionMark,
    CriterionScore, DriverId, Evaluation, EvaluationId, EvaluationSubmission, PenaltyTiers,
    Severity, Transport, TransportId, TransportStatus, WeightUpdate,
};
pub use guard::{CriterionViolation, EvaluationGuard, EvaluationViolation};
pub use report::{CriterionTrend, DriverScorecard};
pub use repository::{
    AlertError, CriteriaSet, CriteriaStore, EvaluationStore, IncidentAlert,
    IncidentAlertPublisher, RepositoryError, TransportDirectory,
};
pub use router::{criteria_router, evaluation_router};
pub use scoring::{
    check_weight_sum, score_for, ScoreComponent, ScoreOutcome, ScoringEngine, ScoringError,
    WeightSumError,
};
pub use service::{
    CriteriaService, CriteriaServiceError, CriterionRemoval, EvaluationService,
    EvaluationServiceError, ScorePreview,
};

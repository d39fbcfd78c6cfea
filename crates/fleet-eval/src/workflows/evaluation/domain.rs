use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for evaluation criteria.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId(pub String);

/// Identifier wrapper for submitted evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

/// Identifier wrapper for transports handed over by the logistics back office.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransportId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriverId(pub String);

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Percentage of the 100-point baseline deducted at each severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTiers {
    #[serde(rename = "penalty_leve")]
    pub leve: f64,
    #[serde(rename = "penalty_medio")]
    pub medio: f64,
    #[serde(rename = "penalty_grave")]
    pub grave: f64,
}

impl PenaltyTiers {
    pub const fn new(leve: f64, medio: f64, grave: f64) -> Self {
        Self { leve, medio, grave }
    }
}

/// Severity recorded by the evaluator for a single criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    SemOcorrencia,
    Leve,
    Medio,
    Grave,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Severity::SemOcorrencia => "sem_ocorrencia",
            Severity::Leve => "leve",
            Severity::Medio => "medio",
            Severity::Grave => "grave",
        }
    }
}

/// Named evaluation dimension with its weight and severity penalties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub name: String,
    pub weight: f64,
    #[serde(flatten)]
    pub penalties: PenaltyTiers,
    pub is_active: bool,
    pub order: i32,
}

/// Mark given to a criterion: a severity tier, or a raw score from the older schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionMark {
    Severity(Severity),
    #[serde(rename = "score")]
    Raw(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionAssessment {
    pub criterion_id: CriterionId,
    #[serde(flatten)]
    pub mark: CriterionMark,
}

impl CriterionAssessment {
    pub fn severity(criterion_id: &str, severity: Severity) -> Self {
        Self {
            criterion_id: CriterionId(criterion_id.to_string()),
            mark: CriterionMark::Severity(severity),
        }
    }

    pub fn raw(criterion_id: &str, score: u8) -> Self {
        Self {
            criterion_id: CriterionId(criterion_id.to_string()),
            mark: CriterionMark::Raw(score),
        }
    }
}

/// Lifecycle of a transport as reported by the logistics back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportStatus {
    Scheduled,
    InTransit,
    Delivered,
    Cancelled,
}

impl TransportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TransportStatus::Scheduled => "scheduled",
            TransportStatus::InTransit => "in_transit",
            TransportStatus::Delivered => "delivered",
            TransportStatus::Cancelled => "cancelled",
        }
    }
}

/// Read-only snapshot of a transport, enough to decide whether it can be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    pub id: TransportId,
    pub driver_id: DriverId,
    pub client_name: String,
    pub vehicle_plate: String,
    pub status: TransportStatus,
    pub delivered_on: Option<NaiveDate>,
}

/// Evaluator input for a finished transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSubmission {
    pub transport_id: TransportId,
    pub driver_id: DriverId,
    pub had_incident: bool,
    pub incident_description: Option<String>,
    pub manual_score: Option<f64>,
    pub assessments: Vec<CriterionAssessment>,
}

/// Per-criterion score captured with the evaluation, including the weight at the time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion_id: CriterionId,
    pub criterion_name: String,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub score: f64,
}

/// Immutable record of a driver evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub transport_id: TransportId,
    pub driver_id: DriverId,
    pub had_incident: bool,
    pub incident_description: Option<String>,
    pub average_score: f64,
    pub weighted_score: f64,
    pub computed_weighted_score: f64,
    pub manual_override: bool,
    pub scores: Vec<CriterionScore>,
    pub evaluated_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn references(&self, criterion_id: &CriterionId) -> bool {
        self.scores
            .iter()
            .any(|score| &score.criterion_id == criterion_id)
    }
}

/// Administrator input for a new criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionDraft {
    pub name: String,
    pub weight: f64,
    #[serde(flatten)]
    pub penalties: PenaltyTiers,
    pub is_active: bool,
    pub order: Option<i32>,
}

/// Partial update of a criterion; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionChanges {
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub penalty_leve: Option<f64>,
    pub penalty_medio: Option<f64>,
    pub penalty_grave: Option<f64>,
    pub is_active: Option<bool>,
    pub order: Option<i32>,
}

/// One entry of a bulk weight rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightUpdate {
    pub criterion_id: CriterionId,
    pub weight: f64,
    pub order: Option<i32>,
    pub penalty_leve: Option<f64>,
    pub penalty_medio: Option<f64>,
    pub penalty_grave: Option<f64>,
}

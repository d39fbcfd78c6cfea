mod severity;
mod weights;

pub use severity::score_for;
pub use weights::{check_weight_sum, WeightSumError, WEIGHT_TOLERANCE, WEIGHT_TOTAL};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::{Criterion, CriterionAssessment, CriterionId, CriterionMark, Severity};

/// Stateless evaluator turning per-criterion marks into average and weighted scores.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score the active criteria of `criteria` using one mark per active criterion.
    ///
    /// Inactive criteria are ignored, but a mark pointing at one is rejected.
    pub fn score(
        &self,
        criteria: &[Criterion],
        assessments: &[CriterionAssessment],
    ) -> Result<ScoreOutcome, ScoringError> {
        let active: Vec<&Criterion> = criteria
            .iter()
            .filter(|criterion| criterion.is_active)
            .collect();
        if active.is_empty() {
            return Err(ScoringError::NoActiveCriteria);
        }

        let mut marks: HashMap<&CriterionId, CriterionMark> = HashMap::new();
        for assessment in assessments {
            let criterion = criteria
                .iter()
                .find(|criterion| criterion.id == assessment.criterion_id)
                .ok_or_else(|| ScoringError::UnknownCriterion(assessment.criterion_id.clone()))?;
            if !criterion.is_active {
                return Err(ScoringError::InactiveCriterion(criterion.id.clone()));
            }
            if marks.insert(&criterion.id, assessment.mark).is_some() {
                return Err(ScoringError::DuplicateMark(criterion.id.clone()));
            }
        }

        let mut components = Vec::with_capacity(active.len());
        for criterion in active {
            let mark = marks
                .get(&criterion.id)
                .copied()
                .ok_or_else(|| ScoringError::MissingMark(criterion.id.clone()))?;
            components.push(component_for(criterion, mark)?);
        }

        let count = components.len() as f64;
        let average = components.iter().map(|component| component.score).sum::<f64>() / count;
        let weighted = components
            .iter()
            .map(|component| component.score * (component.weight / WEIGHT_TOTAL))
            .sum();

        Ok(ScoreOutcome {
            average,
            weighted,
            components,
        })
    }
}

fn component_for(criterion: &Criterion, mark: CriterionMark) -> Result<ScoreComponent, ScoringError> {
    let (severity, score) = match mark {
        CriterionMark::Severity(severity) => (Some(severity), score_for(criterion, severity)),
        CriterionMark::Raw(score) if score > 100 => {
            return Err(ScoringError::ScoreOutOfRange {
                criterion: criterion.id.clone(),
                score,
            })
        }
        CriterionMark::Raw(score) => (None, f64::from(score)),
    };

    Ok(ScoreComponent {
        criterion_id: criterion.id.clone(),
        name: criterion.name.clone(),
        weight: criterion.weight,
        severity,
        score,
    })
}

/// Round a score to two decimals for storage and display.
pub fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Score of a single criterion, kept so evaluators can audit the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub criterion_id: CriterionId,
    pub name: String,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub score: f64,
}

/// Engine output: the simple mean and the weight-proportional score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub average: f64,
    pub weighted: f64,
    pub components: Vec<ScoreComponent>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("no active evaluation criteria are configured")]
    NoActiveCriteria,
    #[error("criterion {0} does not exist")]
    UnknownCriterion(CriterionId),
    #[error("criterion {0} is inactive")]
    InactiveCriterion(CriterionId),
    #[error("criterion {0} was marked more than once")]
    DuplicateMark(CriterionId),
    #[error("criterion {0} has no score or severity")]
    MissingMark(CriterionId),
    #[error("score {score} for criterion {criterion} is outside 0-100")]
    ScoreOutOfRange { criterion: CriterionId, score: u8 },
}

impl ScoringError {
    /// Request field the error should be attached to.
    pub fn field(&self) -> &'static str {
        match self {
            ScoringError::NoActiveCriteria => "criteria",
            _ => "assessments",
        }
    }
}

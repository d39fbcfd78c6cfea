use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Criterion, CriterionAssessment, CriterionChanges, CriterionDraft, CriterionId, CriterionScore,
    DriverId, Evaluation, EvaluationId, EvaluationSubmission, PenaltyTiers, Transport,
    WeightUpdate,
};
use super::guard::{
    active_weight_total, validate_name, validate_penalties, validate_weight, CriterionViolation,
    EvaluationGuard, EvaluationViolation,
};
use super::report::DriverScorecard;
use super::repository::{
    AlertError, CriteriaSet, CriteriaStore, EvaluationStore, IncidentAlert,
    IncidentAlertPublisher, RepositoryError, TransportDirectory,
};
use super::scoring::{
    check_weight_sum, round_score, ScoreOutcome, ScoringEngine, ScoringError, WeightSumError,
    WEIGHT_TOLERANCE, WEIGHT_TOTAL,
};

/// What happened to a criterion removed by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CriterionRemoval {
    /// Still referenced by evaluations, so only switched off.
    Deactivated { criterion: Criterion },
    Deleted { criterion_id: CriterionId },
}

/// Administration of the criteria set.
pub struct CriteriaService<C, E> {
    criteria: Arc<C>,
    evaluations: Arc<E>,
    sequence: AtomicU64,
}

impl<C, E> CriteriaService<C, E>
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
{
    pub fn new(criteria: Arc<C>, evaluations: Arc<E>) -> Self {
        Self {
            criteria,
            evaluations,
            sequence: AtomicU64::new(1),
        }
    }

    fn next_criterion_id(&self) -> CriterionId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        CriterionId(format!("crit-{id:06}"))
    }

    pub fn list_criteria(&self) -> Result<Vec<Criterion>, CriteriaServiceError> {
        Ok(self.criteria.list()?)
    }

    pub fn list_active_criteria(&self) -> Result<Vec<Criterion>, CriteriaServiceError> {
        let mut criteria = self.criteria.list()?;
        criteria.retain(|criterion| criterion.is_active);
        Ok(criteria)
    }

    /// Create a criterion. Weight balance is restored later through a bulk update.
    pub fn create_criterion(&self, draft: CriterionDraft) -> Result<Criterion, CriteriaServiceError> {
        let name = validate_name(&draft.name)?;
        let weight = validate_weight(draft.weight)?;
        let penalties = validate_penalties(draft.penalties)?;

        let stored = self.criteria.transaction(
            |set: &mut CriteriaSet| -> Result<Criterion, CriteriaServiceError> {
                if set.iter().any(|criterion| same_name(&criterion.name, &name)) {
                    return Err(CriterionViolation::DuplicateName(name).into());
                }

                let order = draft.order.unwrap_or_else(|| {
                    set.iter()
                        .map(|criterion| criterion.order)
                        .max()
                        .map_or(1, |max| max + 1)
                });

                Ok(set.insert(Criterion {
                    id: self.next_criterion_id(),
                    name,
                    weight,
                    penalties,
                    is_active: draft.is_active,
                    order,
                })?)
            },
        )?;

        info!(criterion = %stored.id, weight = stored.weight, "criterion created");
        Ok(stored)
    }

    pub fn update_criterion(
        &self,
        id: &CriterionId,
        changes: CriterionChanges,
    ) -> Result<Criterion, CriteriaServiceError> {
        let name = changes.name.as_deref().map(validate_name).transpose()?;
        let weight = changes.weight.map(validate_weight).transpose()?;

        let stored = self.criteria.transaction(
            |set: &mut CriteriaSet| -> Result<Criterion, CriteriaServiceError> {
                if set.get(id).is_none() {
                    return Err(RepositoryError::NotFound.into());
                }
                if let Some(name) = &name {
                    if set
                        .iter()
                        .any(|other| &other.id != id && same_name(&other.name, name))
                    {
                        return Err(CriterionViolation::DuplicateName(name.clone()).into());
                    }
                }

                let criterion = set.get_mut(id)?;
                if let Some(name) = name {
                    criterion.name = name;
                }
                if let Some(weight) = weight {
                    criterion.weight = weight;
                }
                criterion.penalties = validate_penalties(PenaltyTiers {
                    leve: changes.penalty_leve.unwrap_or(criterion.penalties.leve),
                    medio: changes.penalty_medio.unwrap_or(criterion.penalties.medio),
                    grave: changes.penalty_grave.unwrap_or(criterion.penalties.grave),
                })?;
                if let Some(is_active) = changes.is_active {
                    criterion.is_active = is_active;
                }
                if let Some(order) = changes.order {
                    criterion.order = order;
                }
                Ok(criterion.clone())
            },
        )?;

        info!(criterion = %stored.id, "criterion updated");
        Ok(stored)
    }

    /// Rebalance weights in one write. The entries are merged into the stored set and the
    /// resulting active criteria must total 100.
    pub fn bulk_update_weights(
        &self,
        updates: Vec<WeightUpdate>,
    ) -> Result<Vec<Criterion>, CriteriaServiceError> {
        let outcome = self.criteria.transaction(
            |set: &mut CriteriaSet| -> Result<Vec<Criterion>, CriteriaServiceError> {
                let mut seen = HashSet::new();
                let mut changed = Vec::with_capacity(updates.len());
                for update in &updates {
                    if !seen.insert(&update.criterion_id) {
                        return Err(
                            CriterionViolation::DuplicateEntry(update.criterion_id.clone()).into(),
                        );
                    }
                    let criterion = set.get_mut(&update.criterion_id)?;
                    criterion.weight = validate_weight(update.weight)?;
                    if let Some(order) = update.order {
                        criterion.order = order;
                    }
                    criterion.penalties = validate_penalties(PenaltyTiers {
                        leve: update.penalty_leve.unwrap_or(criterion.penalties.leve),
                        medio: update.penalty_medio.unwrap_or(criterion.penalties.medio),
                        grave: update.penalty_grave.unwrap_or(criterion.penalties.grave),
                    })?;
                    changed.push(criterion.clone());
                }

                check_weight_sum(
                    set.active()
                        .map(|criterion| (&criterion.id, criterion.weight)),
                )?;
                Ok(changed)
            },
        );

        if let Err(CriteriaServiceError::Weights(err)) = &outcome {
            warn!(total = err.total, delta = err.delta, "bulk weight update rejected");
        }
        let stored = outcome?;
        info!(criteria = stored.len(), "criteria weights rebalanced");
        Ok(stored)
    }

    /// Soft-delete criteria referenced by past evaluations, hard-delete the rest.
    pub fn remove_criterion(&self, id: &CriterionId) -> Result<CriterionRemoval, CriteriaServiceError> {
        if self.criteria.fetch(id)?.is_none() {
            return Err(RepositoryError::NotFound.into());
        }
        let referenced = self.evaluations.references_criterion(id)?;

        let removal = self.criteria.transaction(
            |set: &mut CriteriaSet| -> Result<CriterionRemoval, RepositoryError> {
                if referenced {
                    let criterion = set.get_mut(id)?;
                    criterion.is_active = false;
                    Ok(CriterionRemoval::Deactivated {
                        criterion: criterion.clone(),
                    })
                } else {
                    set.remove(id)?;
                    Ok(CriterionRemoval::Deleted {
                        criterion_id: id.clone(),
                    })
                }
            },
        )?;

        match &removal {
            CriterionRemoval::Deactivated { criterion } => {
                info!(criterion = %criterion.id, "criterion deactivated")
            }
            CriterionRemoval::Deleted { criterion_id } => {
                info!(criterion = %criterion_id, "criterion deleted")
            }
        }
        Ok(removal)
    }

    /// Create every draft in turn, typically from a CSV import.
    pub fn seed(&self, drafts: Vec<CriterionDraft>) -> Result<Vec<Criterion>, CriteriaServiceError> {
        drafts
            .into_iter()
            .map(|draft| self.create_criterion(draft))
            .collect()
    }
}

fn same_name(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

/// Error raised by the criteria service.
#[derive(Debug, thiserror::Error)]
pub enum CriteriaServiceError {
    #[error(transparent)]
    Violation(#[from] CriterionViolation),
    #[error(transparent)]
    Weights(#[from] WeightSumError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Engine output plus the weight context it was computed against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorePreview {
    #[serde(flatten)]
    pub outcome: ScoreOutcome,
    pub weight_total: f64,
    pub weights_balanced: bool,
}

/// Service composing the guard, the scoring engine and the evaluation collaborators.
pub struct EvaluationService<C, E, T, A> {
    criteria: Arc<C>,
    evaluations: Arc<E>,
    transports: Arc<T>,
    alerts: Arc<A>,
    guard: EvaluationGuard,
    engine: ScoringEngine,
    sequence: AtomicU64,
}

impl<C, E, T, A> EvaluationService<C, E, T, A>
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
    T: TransportDirectory + 'static,
    A: IncidentAlertPublisher + 'static,
{
    pub fn new(criteria: Arc<C>, evaluations: Arc<E>, transports: Arc<T>, alerts: Arc<A>) -> Self {
        Self {
            criteria,
            evaluations,
            transports,
            alerts,
            guard: EvaluationGuard::new(),
            engine: ScoringEngine::new(),
            sequence: AtomicU64::new(1),
        }
    }

    fn next_evaluation_id(&self) -> EvaluationId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        EvaluationId(format!("eval-{id:06}"))
    }

    /// Delivered transports that have not been evaluated yet.
    pub fn pending_transports(&self) -> Result<Vec<Transport>, EvaluationServiceError> {
        let mut pending = Vec::new();
        for transport in self.transports.delivered()? {
            if self.evaluations.for_transport(&transport.id)?.is_none() {
                pending.push(transport);
            }
        }
        pending.sort_by(|left, right| {
            left.delivered_on
                .cmp(&right.delivered_on)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(pending)
    }

    /// Score the marks against the active criteria without persisting anything.
    pub fn preview(
        &self,
        assessments: &[CriterionAssessment],
    ) -> Result<ScorePreview, EvaluationServiceError> {
        let criteria = self.criteria.list()?;
        let outcome = self.engine.score(&criteria, assessments)?;
        let weight_total = active_weight_total(&criteria);

        Ok(ScorePreview {
            outcome,
            weight_total,
            weights_balanced: (weight_total - WEIGHT_TOTAL).abs() < WEIGHT_TOLERANCE,
        })
    }

    /// Validate, score and persist an evaluation for a delivered transport.
    pub fn submit(
        &self,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation, EvaluationServiceError> {
        let transport = self
            .transports
            .fetch(&submission.transport_id)?
            .ok_or(RepositoryError::NotFound)?;
        let already_evaluated = self.evaluations.for_transport(&transport.id)?.is_some();

        let validated = self
            .guard
            .check_submission(submission, &transport, already_evaluated)?;

        let criteria = self.criteria.list()?;
        let outcome = self.engine.score(&criteria, &validated.assessments)?;
        self.guard.check_weights(&criteria)?;

        let computed_weighted_score = round_score(outcome.weighted);
        let weighted_score = validated
            .manual_score
            .map(round_score)
            .unwrap_or(computed_weighted_score);

        let evaluation = Evaluation {
            id: self.next_evaluation_id(),
            transport_id: validated.transport_id,
            driver_id: validated.driver_id,
            had_incident: validated.had_incident,
            incident_description: validated.incident_description,
            average_score: round_score(outcome.average),
            weighted_score,
            computed_weighted_score,
            manual_override: validated.manual_score.is_some(),
            scores: outcome
                .components
                .into_iter()
                .map(|component| CriterionScore {
                    criterion_id: component.criterion_id,
                    criterion_name: component.name,
                    weight: component.weight,
                    severity: component.severity,
                    score: round_score(component.score),
                })
                .collect(),
            evaluated_at: Utc::now(),
        };

        let stored = self.evaluations.insert(evaluation)?;
        info!(
            evaluation = %stored.id,
            transport = %stored.transport_id,
            driver = %stored.driver_id,
            weighted = stored.weighted_score,
            "evaluation recorded"
        );

        if stored.had_incident {
            if let Err(err) = self.publish_incident(&stored) {
                warn!(evaluation = %stored.id, error = %err, "incident alert not delivered");
            }
        }

        Ok(stored)
    }

    fn publish_incident(&self, evaluation: &Evaluation) -> Result<(), AlertError> {
        let mut details = BTreeMap::new();
        if let Some(description) = &evaluation.incident_description {
            details.insert("description".to_string(), description.clone());
        }
        details.insert(
            "weighted_score".to_string(),
            format!("{:.2}", evaluation.weighted_score),
        );
        details.insert(
            "manual_override".to_string(),
            evaluation.manual_override.to_string(),
        );

        self.alerts.publish(IncidentAlert {
            template: "driver_incident_reported".to_string(),
            evaluation_id: evaluation.id.clone(),
            transport_id: evaluation.transport_id.clone(),
            driver_id: evaluation.driver_id.clone(),
            details,
        })
    }

    pub fn list_evaluations(&self) -> Result<Vec<Evaluation>, EvaluationServiceError> {
        Ok(self.evaluations.list()?)
    }

    pub fn get_evaluation(&self, id: &EvaluationId) -> Result<Evaluation, EvaluationServiceError> {
        let evaluation = self
            .evaluations
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(evaluation)
    }

    pub fn driver_scorecard(
        &self,
        driver_id: &DriverId,
    ) -> Result<DriverScorecard, EvaluationServiceError> {
        let evaluations = self.evaluations.list()?;
        Ok(DriverScorecard::from_evaluations(driver_id, &evaluations))
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error(transparent)]
    Violation(#[from] EvaluationViolation),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Criterion, CriterionId, DriverId, Evaluation, EvaluationId, Transport, TransportId,
};

/// Storage abstraction for evaluation criteria.
pub trait CriteriaStore: Send + Sync {
    /// All criteria, ordered by `order` then id.
    fn list(&self) -> Result<Vec<Criterion>, RepositoryError>;
    fn fetch(&self, id: &CriterionId) -> Result<Option<Criterion>, RepositoryError>;
    /// Run `change` against the stored set while holding the write lock. The edited set
    /// replaces the stored one only when `change` returns `Ok`.
    fn transaction<T, E, F>(&self, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut CriteriaSet) -> Result<T, E>,
        E: From<RepositoryError>;
}

/// Every criterion keyed by id; the unit a [`CriteriaStore`] reads and writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriteriaSet {
    records: BTreeMap<CriterionId, Criterion>,
}

impl CriteriaSet {
    pub fn ordered(&self) -> Vec<Criterion> {
        let mut criteria: Vec<Criterion> = self.records.values().cloned().collect();
        criteria.sort_by(|left, right| {
            left.order
                .cmp(&right.order)
                .then_with(|| left.id.cmp(&right.id))
        });
        criteria
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.records.values()
    }

    pub fn active(&self) -> impl Iterator<Item = &Criterion> {
        self.records.values().filter(|criterion| criterion.is_active)
    }

    pub fn get(&self, id: &CriterionId) -> Option<&Criterion> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &CriterionId) -> Result<&mut Criterion, RepositoryError> {
        self.records.get_mut(id).ok_or(RepositoryError::NotFound)
    }

    pub fn insert(&mut self, criterion: Criterion) -> Result<Criterion, RepositoryError> {
        if self.records.contains_key(&criterion.id) {
            return Err(RepositoryError::Conflict);
        }
        self.records.insert(criterion.id.clone(), criterion.clone());
        Ok(criterion)
    }

    pub fn remove(&mut self, id: &CriterionId) -> Result<Criterion, RepositoryError> {
        self.records.remove(id).ok_or(RepositoryError::NotFound)
    }
}

/// Storage abstraction for submitted evaluations. Records are never modified.
pub trait EvaluationStore: Send + Sync {
    /// Persist a new evaluation; a second evaluation for the same transport is a conflict.
    fn insert(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError>;
    fn fetch(&self, id: &EvaluationId) -> Result<Option<Evaluation>, RepositoryError>;
    fn list(&self) -> Result<Vec<Evaluation>, RepositoryError>;
    fn for_transport(&self, id: &TransportId) -> Result<Option<Evaluation>, RepositoryError>;
    fn references_criterion(&self, id: &CriterionId) -> Result<bool, RepositoryError>;
}

/// Read access to the logistics back office's transports.
pub trait TransportDirectory: Send + Sync {
    fn fetch(&self, id: &TransportId) -> Result<Option<Transport>, RepositoryError>;
    fn delivered(&self) -> Result<Vec<Transport>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook notifying fleet managers about incidents reported during evaluation.
pub trait IncidentAlertPublisher: Send + Sync {
    fn publish(&self, alert: IncidentAlert) -> Result<(), AlertError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentAlert {
    pub template: String,
    pub evaluation_id: EvaluationId,
    pub transport_id: TransportId,
    pub driver_id: DriverId,
    pub details: BTreeMap<String, String>,
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}

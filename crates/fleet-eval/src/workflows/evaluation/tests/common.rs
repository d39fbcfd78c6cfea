use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::evaluation::domain::{
    Criterion, CriterionAssessment, CriterionDraft, CriterionId, DriverId, Evaluation,
    EvaluationId, EvaluationSubmission, PenaltyTiers, Severity, Transport, TransportId,
    TransportStatus,
};
use crate::workflows::evaluation::repository::{
    AlertError, CriteriaSet, CriteriaStore, EvaluationStore, IncidentAlert,
    IncidentAlertPublisher, RepositoryError, TransportDirectory,
};
use crate::workflows::evaluation::{CriteriaService, EvaluationService};

pub(super) const PUNCTUALITY: &str = "crit-000001";
pub(super) const VEHICLE_CARE: &str = "crit-000002";
pub(super) const COMMUNICATION: &str = "crit-000003";

pub(super) fn standard_penalties() -> PenaltyTiers {
    PenaltyTiers::new(10.0, 50.0, 100.0)
}

pub(super) fn draft(name: &str, weight: f64) -> CriterionDraft {
    CriterionDraft {
        name: name.to_string(),
        weight,
        penalties: standard_penalties(),
        is_active: true,
        order: None,
    }
}

pub(super) fn standard_drafts() -> Vec<CriterionDraft> {
    vec![
        draft("Pontualidade", 40.0),
        draft("Cuidado com o veículo", 35.0),
        draft("Comunicação", 25.0),
    ]
}

pub(super) fn criterion(id: &str, name: &str, weight: f64, order: i32) -> Criterion {
    Criterion {
        id: CriterionId(id.to_string()),
        name: name.to_string(),
        weight,
        penalties: standard_penalties(),
        is_active: true,
        order,
    }
}

pub(super) fn standard_criteria() -> Vec<Criterion> {
    vec![
        criterion(PUNCTUALITY, "Pontualidade", 40.0, 1),
        criterion(VEHICLE_CARE, "Cuidado com o veículo", 35.0, 2),
        criterion(COMMUNICATION, "Comunicação", 25.0, 3),
    ]
}

/// Leve on punctuality, clean vehicle care, grave on communication.
pub(super) fn worked_example_marks() -> Vec<CriterionAssessment> {
    vec![
        CriterionAssessment::severity(PUNCTUALITY, Severity::Leve),
        CriterionAssessment::severity(VEHICLE_CARE, Severity::SemOcorrencia),
        CriterionAssessment::severity(COMMUNICATION, Severity::Grave),
    ]
}

pub(super) fn clean_marks() -> Vec<CriterionAssessment> {
    vec![
        CriterionAssessment::severity(PUNCTUALITY, Severity::SemOcorrencia),
        CriterionAssessment::severity(VEHICLE_CARE, Severity::SemOcorrencia),
        CriterionAssessment::severity(COMMUNICATION, Severity::SemOcorrencia),
    ]
}

pub(super) fn transport(
    id: &str,
    driver: &str,
    status: TransportStatus,
    delivered_on: Option<(i32, u32, u32)>,
) -> Transport {
    Transport {
        id: TransportId(id.to_string()),
        driver_id: DriverId(driver.to_string()),
        client_name: "Cooperativa Vale Verde".to_string(),
        vehicle_plate: "RKT-4B21".to_string(),
        status,
        delivered_on: delivered_on.map(|(year, month, day)| {
            NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
        }),
    }
}

pub(super) fn standard_transports() -> Vec<Transport> {
    vec![
        transport("tr-100", "drv-7", TransportStatus::Delivered, Some((2025, 3, 10))),
        transport("tr-101", "drv-7", TransportStatus::Delivered, Some((2025, 3, 8))),
        transport("tr-102", "drv-8", TransportStatus::InTransit, None),
        transport("tr-103", "drv-8", TransportStatus::Delivered, Some((2025, 3, 9))),
    ]
}

pub(super) fn submission(transport: &str, driver: &str) -> EvaluationSubmission {
    EvaluationSubmission {
        transport_id: TransportId(transport.to_string()),
        driver_id: DriverId(driver.to_string()),
        had_incident: false,
        incident_description: None,
        manual_score: None,
        assessments: worked_example_marks(),
    }
}

pub(super) fn incident_submission(transport: &str, driver: &str) -> EvaluationSubmission {
    EvaluationSubmission {
        had_incident: true,
        incident_description: Some("  Client reported a damaged pallet  ".to_string()),
        ..submission(transport, driver)
    }
}

pub(super) type TestCriteriaService = CriteriaService<MemoryCriteria, MemoryEvaluations>;
pub(super) type TestEvaluationService =
    EvaluationService<MemoryCriteria, MemoryEvaluations, MemoryTransports, MemoryAlerts>;

pub(super) struct Harness {
    pub(super) criteria_service: Arc<TestCriteriaService>,
    pub(super) evaluation_service: Arc<TestEvaluationService>,
    pub(super) criteria: Arc<MemoryCriteria>,
    pub(super) evaluations: Arc<MemoryEvaluations>,
    pub(super) alerts: Arc<MemoryAlerts>,
}

/// Services wired to fresh memory stores, seeded with the three standard criteria.
pub(super) fn build_services() -> Harness {
    let harness = empty_services();
    harness
        .criteria_service
        .seed(standard_drafts())
        .expect("standard criteria seed");
    harness
}

pub(super) fn empty_services() -> Harness {
    let criteria = Arc::new(MemoryCriteria::default());
    let evaluations = Arc::new(MemoryEvaluations::default());
    let transports = Arc::new(MemoryTransports::with(standard_transports()));
    let alerts = Arc::new(MemoryAlerts::default());

    Harness {
        criteria_service: Arc::new(CriteriaService::new(criteria.clone(), evaluations.clone())),
        evaluation_service: Arc::new(EvaluationService::new(
            criteria.clone(),
            evaluations.clone(),
            transports,
            alerts.clone(),
        )),
        criteria,
        evaluations,
        alerts,
    }
}

#[derive(Default)]
pub(super) struct MemoryCriteria {
    records: Mutex<CriteriaSet>,
}

impl MemoryCriteria {
    pub(super) fn snapshot(&self) -> Vec<Criterion> {
        self.list().expect("memory list")
    }
}

impl CriteriaStore for MemoryCriteria {
    fn list(&self) -> Result<Vec<Criterion>, RepositoryError> {
        Ok(self.records.lock().expect("criteria mutex poisoned").ordered())
    }

    fn fetch(&self, id: &CriterionId) -> Result<Option<Criterion>, RepositoryError> {
        let guard = self.records.lock().expect("criteria mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn transaction<T, E, F>(&self, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut CriteriaSet) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut guard = self.records.lock().expect("criteria mutex poisoned");
        let mut working = guard.clone();
        let outcome = change(&mut working)?;
        *guard = working;
        Ok(outcome)
    }
}

type PendingWrite = Box<dyn FnOnce(&mut CriteriaSet) + Send>;

/// Memory store where another writer commits `pending` just before the next transaction
/// acquires the lock.
#[derive(Default)]
pub(super) struct ContendedCriteria {
    pub(super) inner: MemoryCriteria,
    pending: Mutex<Option<PendingWrite>>,
}

impl ContendedCriteria {
    pub(super) fn queue(&self, write: impl FnOnce(&mut CriteriaSet) + Send + 'static) {
        *self.pending.lock().expect("pending mutex poisoned") = Some(Box::new(write));
    }
}

impl CriteriaStore for ContendedCriteria {
    fn list(&self) -> Result<Vec<Criterion>, RepositoryError> {
        self.inner.list()
    }

    fn fetch(&self, id: &CriterionId) -> Result<Option<Criterion>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn transaction<T, E, F>(&self, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut CriteriaSet) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let pending = self.pending.lock().expect("pending mutex poisoned").take();
        if let Some(write) = pending {
            self.inner
                .transaction(|set| -> Result<(), RepositoryError> {
                    write(set);
                    Ok(())
                })?;
        }
        self.inner.transaction(change)
    }
}

#[derive(Default)]
pub(super) struct MemoryEvaluations {
    records: Mutex<Vec<Evaluation>>,
}

impl EvaluationStore for MemoryEvaluations {
    fn insert(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        let mut guard = self.records.lock().expect("evaluation mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.transport_id == evaluation.transport_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(evaluation.clone());
        Ok(evaluation)
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<Evaluation>, RepositoryError> {
        let guard = self.records.lock().expect("evaluation mutex poisoned");
        Ok(guard.iter().find(|evaluation| &evaluation.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<Evaluation>, RepositoryError> {
        Ok(self.records.lock().expect("evaluation mutex poisoned").clone())
    }

    fn for_transport(&self, id: &TransportId) -> Result<Option<Evaluation>, RepositoryError> {
        let guard = self.records.lock().expect("evaluation mutex poisoned");
        Ok(guard
            .iter()
            .find(|evaluation| &evaluation.transport_id == id)
            .cloned())
    }

    fn references_criterion(&self, id: &CriterionId) -> Result<bool, RepositoryError> {
        let guard = self.records.lock().expect("evaluation mutex poisoned");
        Ok(guard.iter().any(|evaluation| evaluation.references(id)))
    }
}

pub(super) struct MemoryTransports {
    transports: Vec<Transport>,
}

impl MemoryTransports {
    pub(super) fn with(transports: Vec<Transport>) -> Self {
        Self { transports }
    }
}

impl TransportDirectory for MemoryTransports {
    fn fetch(&self, id: &TransportId) -> Result<Option<Transport>, RepositoryError> {
        Ok(self
            .transports
            .iter()
            .find(|transport| &transport.id == id)
            .cloned())
    }

    fn delivered(&self) -> Result<Vec<Transport>, RepositoryError> {
        Ok(self
            .transports
            .iter()
            .filter(|transport| transport.status == TransportStatus::Delivered)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryAlerts {
    events: Mutex<Vec<IncidentAlert>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<IncidentAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl IncidentAlertPublisher for MemoryAlerts {
    fn publish(&self, alert: IncidentAlert) -> Result<(), AlertError> {
        self.events.lock().expect("alert mutex poisoned").push(alert);
        Ok(())
    }
}

pub(super) struct OfflineAlerts;

impl IncidentAlertPublisher for OfflineAlerts {
    fn publish(&self, _alert: IncidentAlert) -> Result<(), AlertError> {
        Err(AlertError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableCriteria;

impl CriteriaStore for UnavailableCriteria {
    fn list(&self) -> Result<Vec<Criterion>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &CriterionId) -> Result<Option<Criterion>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn transaction<T, E, F>(&self, _change: F) -> Result<T, E>
    where
        F: FnOnce(&mut CriteriaSet) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

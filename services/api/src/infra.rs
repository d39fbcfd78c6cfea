use chrono::{Duration, NaiveDate};
use fleet_eval::config::SeedConfig;
use fleet_eval::error::AppError;
use fleet_eval::workflows::criteria_import::CriteriaImporter;
use fleet_eval::workflows::evaluation::{
    AlertError, CriteriaService, CriteriaSet, CriteriaStore, Criterion, CriterionId, DriverId,
    Evaluation, EvaluationId, EvaluationService, EvaluationStore, IncidentAlert,
    IncidentAlertPublisher, RepositoryError, Transport, TransportDirectory, TransportId,
    TransportStatus,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Criteria = CriteriaService<InMemoryCriteriaStore, InMemoryEvaluationStore>;
pub(crate) type Evaluations = EvaluationService<
    InMemoryCriteriaStore,
    InMemoryEvaluationStore,
    InMemoryTransportDirectory,
    InMemoryIncidentAlerts,
>;

fn lock<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{store} lock poisoned")))
}

/// Criteria kept behind a single lock so every write sees and replaces the whole set.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCriteriaStore {
    records: Arc<Mutex<CriteriaSet>>,
}

impl CriteriaStore for InMemoryCriteriaStore {
    fn list(&self) -> Result<Vec<Criterion>, RepositoryError> {
        Ok(lock(&self.records, "criteria")?.ordered())
    }

    fn fetch(&self, id: &CriterionId) -> Result<Option<Criterion>, RepositoryError> {
        Ok(lock(&self.records, "criteria")?.get(id).cloned())
    }

    fn transaction<T, E, F>(&self, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut CriteriaSet) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut guard = lock(&self.records, "criteria")?;
        let mut working = guard.clone();
        let outcome = change(&mut working)?;
        *guard = working;
        Ok(outcome)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationStore {
    records: Arc<Mutex<Vec<Evaluation>>>,
}

impl EvaluationStore for InMemoryEvaluationStore {
    fn insert(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        let mut guard = lock(&self.records, "evaluations")?;
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
        let guard = lock(&self.records, "evaluations")?;
        Ok(guard.iter().find(|evaluation| &evaluation.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<Evaluation>, RepositoryError> {
        Ok(lock(&self.records, "evaluations")?.clone())
    }

    fn for_transport(&self, id: &TransportId) -> Result<Option<Evaluation>, RepositoryError> {
        let guard = lock(&self.records, "evaluations")?;
        Ok(guard
            .iter()
            .find(|evaluation| &evaluation.transport_id == id)
            .cloned())
    }

    fn references_criterion(&self, id: &CriterionId) -> Result<bool, RepositoryError> {
        let guard = lock(&self.records, "evaluations")?;
        Ok(guard.iter().any(|evaluation| evaluation.references(id)))
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryTransportDirectory {
    transports: Arc<Mutex<Vec<Transport>>>,
}

impl InMemoryTransportDirectory {
    pub(crate) fn with(transports: Vec<Transport>) -> Self {
        Self {
            transports: Arc::new(Mutex::new(transports)),
        }
    }
}

impl TransportDirectory for InMemoryTransportDirectory {
    fn fetch(&self, id: &TransportId) -> Result<Option<Transport>, RepositoryError> {
        let guard = lock(&self.transports, "transports")?;
        Ok(guard.iter().find(|transport| &transport.id == id).cloned())
    }

    fn delivered(&self) -> Result<Vec<Transport>, RepositoryError> {
        let guard = lock(&self.transports, "transports")?;
        Ok(guard
            .iter()
            .filter(|transport| transport.status == TransportStatus::Delivered)
            .cloned()
            .collect())
    }
}

/// Keeps published incident alerts in memory and mirrors them to the log.
#[derive(Default, Clone)]
pub(crate) struct InMemoryIncidentAlerts {
    events: Arc<Mutex<Vec<IncidentAlert>>>,
}

impl IncidentAlertPublisher for InMemoryIncidentAlerts {
    fn publish(&self, alert: IncidentAlert) -> Result<(), AlertError> {
        info!(
            template = %alert.template,
            evaluation = %alert.evaluation_id,
            driver = %alert.driver_id,
            "incident alert queued"
        );
        self.events
            .lock()
            .map_err(|_| AlertError::Transport("alert outbox lock poisoned".to_string()))?
            .push(alert);
        Ok(())
    }
}

impl InMemoryIncidentAlerts {
    pub(crate) fn events(&self) -> Vec<IncidentAlert> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        }
    }
}

fn transport(
    id: &str,
    driver: &str,
    client: &str,
    plate: &str,
    status: TransportStatus,
    delivered_on: Option<NaiveDate>,
) -> Transport {
    Transport {
        id: TransportId(id.to_string()),
        driver_id: DriverId(driver.to_string()),
        client_name: client.to_string(),
        vehicle_plate: plate.to_string(),
        status,
        delivered_on,
    }
}

/// Transports offered to evaluators when demo data is enabled.
pub(crate) fn demo_transports(today: NaiveDate) -> Vec<Transport> {
    vec![
        transport(
            "TR-2025-0417",
            "DRV-031",
            "Cooperativa Vale Verde",
            "RKT-4B21",
            TransportStatus::Delivered,
            Some(today - Duration::days(2)),
        ),
        transport(
            "TR-2025-0418",
            "DRV-031",
            "Atacadão Serra Azul",
            "RKT-4B21",
            TransportStatus::Delivered,
            Some(today - Duration::days(1)),
        ),
        transport(
            "TR-2025-0419",
            "DRV-044",
            "Mercantil Porto Novo",
            "QWE-2E19",
            TransportStatus::Delivered,
            Some(today - Duration::days(1)),
        ),
        transport(
            "TR-2025-0420",
            "DRV-044",
            "Distribuidora Litoral",
            "QWE-2E19",
            TransportStatus::InTransit,
            None,
        ),
        transport(
            "TR-2025-0421",
            "DRV-052",
            "Cooperativa Vale Verde",
            "JHK-7C03",
            TransportStatus::Scheduled,
            None,
        ),
    ]
}

pub(crate) struct Services {
    pub(crate) criteria: Arc<Criteria>,
    pub(crate) evaluations: Arc<Evaluations>,
    pub(crate) alerts: Arc<InMemoryIncidentAlerts>,
}

/// Wire the services over in-memory stores and load the configured seed data.
pub(crate) fn build_services(seed: &SeedConfig, today: NaiveDate) -> Result<Services, AppError> {
    let criteria_store = Arc::new(InMemoryCriteriaStore::default());
    let evaluation_store = Arc::new(InMemoryEvaluationStore::default());
    let alerts = Arc::new(InMemoryIncidentAlerts::default());
    let transports = if seed.demo_data {
        InMemoryTransportDirectory::with(demo_transports(today))
    } else {
        InMemoryTransportDirectory::default()
    };

    let criteria = Arc::new(CriteriaService::new(
        criteria_store.clone(),
        evaluation_store.clone(),
    ));

    let drafts = match (&seed.criteria_csv, seed.demo_data) {
        (Some(path), _) => Some(CriteriaImporter::from_path(path)?),
        (None, true) => Some(CriteriaImporter::sample()?),
        (None, false) => None,
    };
    match drafts {
        Some(drafts) => {
            let seeded = criteria.seed(drafts)?;
            info!(criteria = seeded.len(), "criteria seeded");
        }
        None => warn!("no criteria seeded; evaluations are refused until criteria are created"),
    }

    let evaluations = Arc::new(EvaluationService::new(
        criteria_store,
        evaluation_store,
        Arc::new(transports),
        alerts.clone(),
    ));

    Ok(Services {
        criteria,
        evaluations,
        alerts,
    })
}

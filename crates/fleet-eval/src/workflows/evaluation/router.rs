use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{CriterionId, DriverId, EvaluationId};
use super::dto::{
    BulkWeightRequest, CreateCriterionRequest, PreviewRequest, SubmitEvaluationRequest,
    UpdateCriterionRequest,
};
use super::extract::ValidatedJson;
use super::repository::{
    CriteriaStore, EvaluationStore, IncidentAlertPublisher, RepositoryError, TransportDirectory,
};
use super::service::{
    CriteriaService, CriteriaServiceError, EvaluationService, EvaluationServiceError,
};

/// Router builder exposing criteria administration endpoints.
pub fn criteria_router<C, E>(service: Arc<CriteriaService<C, E>>) -> Router
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/criteria",
            get(list_criteria_handler::<C, E>)
                .post(create_criterion_handler::<C, E>)
                .put(bulk_weights_handler::<C, E>),
        )
        .route(
            "/api/v1/criteria/:criterion_id",
            patch(update_criterion_handler::<C, E>).delete(remove_criterion_handler::<C, E>),
        )
        .with_state(service)
}

/// Router builder exposing evaluation intake and lookup endpoints.
pub fn evaluation_router<C, E, T, A>(service: Arc<EvaluationService<C, E, T, A>>) -> Router
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
    T: TransportDirectory + 'static,
    A: IncidentAlertPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/transports/pending-evaluation",
            get(pending_transports_handler::<C, E, T, A>),
        )
        .route(
            "/api/v1/evaluations/preview",
            post(preview_handler::<C, E, T, A>),
        )
        .route(
            "/api/v1/evaluations",
            get(list_evaluations_handler::<C, E, T, A>).post(submit_handler::<C, E, T, A>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id",
            get(evaluation_handler::<C, E, T, A>),
        )
        .route(
            "/api/v1/drivers/:driver_id/scorecard",
            get(scorecard_handler::<C, E, T, A>),
        )
        .with_state(service)
}

fn error_response(status: StatusCode, message: String, field: Option<&str>) -> Response {
    let payload = match field {
        Some(field) => json!({ "error": message, "field": field }),
        None => json!({ "error": message }),
    };
    (status, Json(payload)).into_response()
}

fn repository_response(error: RepositoryError) -> Response {
    let status = match error {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error.to_string(), None)
}

fn criteria_error_response(error: CriteriaServiceError) -> Response {
    match error {
        CriteriaServiceError::Violation(violation) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            violation.to_string(),
            Some(violation.field()),
        ),
        CriteriaServiceError::Weights(weights) => {
            let payload = json!({
                "error": weights.to_string(),
                "field": "items",
                "total": weights.total,
                "delta": weights.delta,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        CriteriaServiceError::Repository(error) => repository_response(error),
    }
}

fn evaluation_error_response(error: EvaluationServiceError) -> Response {
    match error {
        EvaluationServiceError::Violation(violation) => {
            let status = if violation.is_conflict() {
                StatusCode::CONFLICT
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            error_response(status, violation.to_string(), Some(violation.field()))
        }
        EvaluationServiceError::Scoring(error) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            error.to_string(),
            Some(error.field()),
        ),
        EvaluationServiceError::Repository(error) => repository_response(error),
    }
}

pub(crate) async fn list_criteria_handler<C, E>(
    State(service): State<Arc<CriteriaService<C, E>>>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.list_criteria() {
        Ok(criteria) => (StatusCode::OK, Json(criteria)).into_response(),
        Err(error) => criteria_error_response(error),
    }
}

pub(crate) async fn create_criterion_handler<C, E>(
    State(service): State<Arc<CriteriaService<C, E>>>,
    ValidatedJson(request): ValidatedJson<CreateCriterionRequest>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.create_criterion(request.into()) {
        Ok(criterion) => (StatusCode::CREATED, Json(criterion)).into_response(),
        Err(error) => criteria_error_response(error),
    }
}

pub(crate) async fn update_criterion_handler<C, E>(
    State(service): State<Arc<CriteriaService<C, E>>>,
    Path(criterion_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateCriterionRequest>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.update_criterion(&CriterionId(criterion_id), request.into()) {
        Ok(criterion) => (StatusCode::OK, Json(criterion)).into_response(),
        Err(error) => criteria_error_response(error),
    }
}

pub(crate) async fn bulk_weights_handler<C, E>(
    State(service): State<Arc<CriteriaService<C, E>>>,
    ValidatedJson(request): ValidatedJson<BulkWeightRequest>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.bulk_update_weights(request.into_updates()) {
        Ok(criteria) => (StatusCode::OK, Json(criteria)).into_response(),
        Err(error) => criteria_error_response(error),
    }
}

pub(crate) async fn remove_criterion_handler<C, E>(
    State(service): State<Arc<CriteriaService<C, E>>>,
    Path(criterion_id): Path<String>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.remove_criterion(&CriterionId(criterion_id)) {
        Ok(removal) => (StatusCode::OK, Json(removal)).into_response(),
        Err(error) => criteria_error_response(error),
    }
}

pub(crate) async fn pending_transports_handler<C, E, T, A>(
    State(service): State<Arc<EvaluationService<C, E, T, A>>>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
    T: TransportDirectory + 'static,
    A: IncidentAlertPublisher + 'static,
{
    match service.pending_transports() {
        Ok(transports) => (StatusCode::OK, Json(transports)).into_response(),
        Err(error) => evaluation_error_response(error),
    }
}

pub(crate) async fn preview_handler<C, E, T, A>(
    State(service): State<Arc<EvaluationService<C, E, T, A>>>,
    ValidatedJson(request): ValidatedJson<PreviewRequest>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
    T: TransportDirectory + 'static,
    A: IncidentAlertPublisher + 'static,
{
    match service.preview(&request.assessments) {
        Ok(preview) => (StatusCode::OK, Json(preview)).into_response(),
        Err(error) => evaluation_error_response(error),
    }
}

pub(crate) async fn submit_handler<C, E, T, A>(
    State(service): State<Arc<EvaluationService<C, E, T, A>>>,
    ValidatedJson(request): ValidatedJson<SubmitEvaluationRequest>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
    T: TransportDirectory + 'static,
    A: IncidentAlertPublisher + 'static,
{
    match service.submit(request.into()) {
        Ok(evaluation) => (StatusCode::CREATED, Json(evaluation)).into_response(),
        Err(error) => evaluation_error_response(error),
    }
}

pub(crate) async fn list_evaluations_handler<C, E, T, A>(
    State(service): State<Arc<EvaluationService<C, E, T, A>>>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
    T: TransportDirectory + 'static,
    A: IncidentAlertPublisher + 'static,
{
    match service.list_evaluations() {
        Ok(evaluations) => (StatusCode::OK, Json(evaluations)).into_response(),
        Err(error) => evaluation_error_response(error),
    }
}

pub(crate) async fn evaluation_handler<C, E, T, A>(
    State(service): State<Arc<EvaluationService<C, E, T, A>>>,
    Path(evaluation_id): Path<String>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
    T: TransportDirectory + 'static,
    A: IncidentAlertPublisher + 'static,
{
    match service.get_evaluation(&EvaluationId(evaluation_id)) {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(error) => evaluation_error_response(error),
    }
}

pub(crate) async fn scorecard_handler<C, E, T, A>(
    State(service): State<Arc<EvaluationService<C, E, T, A>>>,
    Path(driver_id): Path<String>,
) -> Response
where
    C: CriteriaStore + 'static,
    E: EvaluationStore + 'static,
    T: TransportDirectory + 'static,
    A: IncidentAlertPublisher + 'static,
{
    match service.driver_scorecard(&DriverId(driver_id)) {
        Ok(scorecard) => (StatusCode::OK, Json(scorecard)).into_response(),
        Err(error) => evaluation_error_response(error),
    }
}

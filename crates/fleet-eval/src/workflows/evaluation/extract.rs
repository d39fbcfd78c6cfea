use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::{Validate, ValidationErrors};

/// JSON extractor that runs `validator` checks before the handler sees the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = PayloadRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(PayloadRejection::Malformed)?;

        value.validate().map_err(PayloadRejection::Invalid)?;

        Ok(ValidatedJson(value))
    }
}

/// Why a request body was refused before reaching a service.
#[derive(Debug)]
pub enum PayloadRejection {
    Malformed(JsonRejection),
    Invalid(ValidationErrors),
}

impl IntoResponse for PayloadRejection {
    fn into_response(self) -> Response {
        match self {
            PayloadRejection::Malformed(rejection) => {
                let payload = json!({ "error": format!("invalid JSON: {}", rejection.body_text()) });
                (StatusCode::BAD_REQUEST, Json(payload)).into_response()
            }
            PayloadRejection::Invalid(errors) => {
                let mut fields: Vec<&str> = errors.errors().keys().copied().collect();
                fields.sort_unstable();
                let payload = json!({
                    "error": format!("validation failed: {errors}"),
                    "field": fields.first().copied(),
                    "fields": fields,
                });
                (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
            }
        }
    }
}

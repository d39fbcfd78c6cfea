//! Request payloads accepted by the evaluation router.
//!
//! Payloads are deserialized into these types and checked with `validator` before any
//! service call, so malformed input never reaches the scoring engine.

use serde::{Deserialize, Deserializer};
use validator::Validate;

use super::domain::{
    CriterionAssessment, CriterionChanges, CriterionDraft, CriterionId, DriverId,
    EvaluationSubmission, PenaltyTiers, TransportId, WeightUpdate,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCriterionRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(range(min = 0.01, max = 100.0))]
    pub weight: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub penalty_leve: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub penalty_medio: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub penalty_grave: f64,
    #[serde(default = "default_active", deserialize_with = "deserialize_flag")]
    pub is_active: bool,
    #[serde(default)]
    pub order: Option<i32>,
}

impl From<CreateCriterionRequest> for CriterionDraft {
    fn from(request: CreateCriterionRequest) -> Self {
        CriterionDraft {
            name: request.name,
            weight: request.weight,
            penalties: PenaltyTiers::new(
                request.penalty_leve,
                request.penalty_medio,
                request.penalty_grave,
            ),
            is_active: request.is_active,
            order: request.order,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCriterionRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.01, max = 100.0))]
    pub weight: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub penalty_leve: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub penalty_medio: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub penalty_grave: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_flag")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub order: Option<i32>,
}

impl From<UpdateCriterionRequest> for CriterionChanges {
    fn from(request: UpdateCriterionRequest) -> Self {
        CriterionChanges {
            name: request.name,
            weight: request.weight,
            penalty_leve: request.penalty_leve,
            penalty_medio: request.penalty_medio,
            penalty_grave: request.penalty_grave,
            is_active: request.is_active,
            order: request.order,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WeightUpdateItem {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(range(min = 0.01, max = 100.0))]
    pub weight: f64,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub penalty_leve: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub penalty_medio: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub penalty_grave: Option<f64>,
}

impl From<WeightUpdateItem> for WeightUpdate {
    fn from(item: WeightUpdateItem) -> Self {
        WeightUpdate {
            criterion_id: CriterionId(item.id),
            weight: item.weight,
            order: item.order,
            penalty_leve: item.penalty_leve,
            penalty_medio: item.penalty_medio,
            penalty_grave: item.penalty_grave,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkWeightRequest {
    #[validate]
    pub items: Vec<WeightUpdateItem>,
}

impl BulkWeightRequest {
    pub fn into_updates(self) -> Vec<WeightUpdate> {
        self.items.into_iter().map(WeightUpdate::from).collect()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitEvaluationRequest {
    #[validate(length(min = 1))]
    pub transport_id: String,
    #[validate(length(min = 1))]
    pub driver_id: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub had_incident: bool,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub incident_description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub manual_score: Option<f64>,
    pub assessments: Vec<CriterionAssessment>,
}

impl From<SubmitEvaluationRequest> for EvaluationSubmission {
    fn from(request: SubmitEvaluationRequest) -> Self {
        EvaluationSubmission {
            transport_id: TransportId(request.transport_id),
            driver_id: DriverId(request.driver_id),
            had_incident: request.had_incident,
            incident_description: request.incident_description,
            manual_score: request.manual_score,
            assessments: request.assessments,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PreviewRequest {
    pub assessments: Vec<CriterionAssessment>,
}

fn default_active() -> bool {
    true
}

/// Flags arrive either as JSON booleans or as the strings "true"/"false".
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn resolve<E: serde::de::Error>(self) -> Result<bool, E> {
        match self {
            Flag::Bool(value) => Ok(value),
            Flag::Text(text) => parse_flag(&text)
                .ok_or_else(|| E::custom(format!("'{text}' is not a valid boolean flag"))),
        }
    }
}

/// Parse the textual flag spellings used by the back office exports.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "sim" | "s" => Some(true),
        "false" | "0" | "no" | "não" | "nao" | "n" => Some(false),
        _ => None,
    }
}

pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Flag::deserialize(deserializer)?.resolve()
}

pub(crate) fn deserialize_optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Flag>::deserialize(deserializer)?
        .map(Flag::resolve)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::evaluation::domain::{CriterionMark, Severity};
    use serde_json::json;

    #[test]
    fn boolean_as_string_flags_are_accepted() {
        let request: SubmitEvaluationRequest = serde_json::from_value(json!({
            "transport_id": "tr-1",
            "driver_id": "drv-1",
            "had_incident": "true",
            "incident_description": "Scratched bumper at the client yard",
            "assessments": [{ "criterion_id": "crit-000001", "severity": "grave" }]
        }))
        .expect("payload parses");

        assert!(request.had_incident);
        assert_eq!(
            request.assessments[0].mark,
            CriterionMark::Severity(Severity::Grave)
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn unknown_flag_text_is_rejected() {
        let result = serde_json::from_value::<CreateCriterionRequest>(json!({
            "name": "Pontualidade",
            "weight": 40,
            "penalty_leve": 10,
            "penalty_medio": 50,
            "penalty_grave": 100,
            "is_active": "maybe"
        }));

        assert!(result.is_err());
    }

    #[test]
    fn raw_scores_use_the_score_key() {
        let request: PreviewRequest = serde_json::from_value(json!({
            "assessments": [{ "criterion_id": "crit-000002", "score": 85 }]
        }))
        .expect("payload parses");

        assert_eq!(request.assessments[0].mark, CriterionMark::Raw(85));
    }

    #[test]
    fn validator_rejects_out_of_range_penalties() {
        let request: CreateCriterionRequest = serde_json::from_value(json!({
            "name": "Comunicação",
            "weight": 25,
            "penalty_leve": 10,
            "penalty_medio": 50,
            "penalty_grave": 120
        }))
        .expect("payload parses");

        assert!(request.is_active);
        let errors = request.validate().expect_err("penalty above 100");
        assert!(errors.field_errors().contains_key("penalty_grave"));
    }

    #[test]
    fn weight_items_carry_only_the_penalties_sent() {
        let item: WeightUpdateItem = serde_json::from_value(json!({
            "id": "crit-000001",
            "weight": 40,
            "penalty_leve": 5
        }))
        .expect("payload parses");

        let update = WeightUpdate::from(item);
        assert_eq!(update.penalty_leve, Some(5.0));
        assert!(update.penalty_grave.is_none());
        assert_eq!(update.criterion_id, CriterionId("crit-000001".to_string()));
    }
}

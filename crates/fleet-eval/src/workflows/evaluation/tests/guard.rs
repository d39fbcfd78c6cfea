use super::common::*;

use crate::workflows::evaluation::domain::{DriverId, TransportStatus};
use crate::workflows::evaluation::guard::{EvaluationGuard, EvaluationViolation};

fn delivered() -> crate::workflows::evaluation::domain::Transport {
    transport("tr-100", "drv-7", TransportStatus::Delivered, Some((2025, 3, 10)))
}

#[test]
fn accepts_a_clean_submission() {
    let validated = EvaluationGuard::new()
        .check_submission(submission("tr-100", "drv-7"), &delivered(), false)
        .expect("valid submission");

    assert!(!validated.had_incident);
    assert!(validated.incident_description.is_none());
    assert_eq!(validated.assessments.len(), 3);
}

#[test]
fn incidents_require_a_description() {
    let mut payload = incident_submission("tr-100", "drv-7");
    payload.incident_description = Some("   ".to_string());

    let err = EvaluationGuard::new()
        .check_submission(payload, &delivered(), false)
        .expect_err("blank description");

    assert_eq!(err, EvaluationViolation::IncidentDescriptionRequired);
    assert_eq!(err.field(), "incident_description");
}

#[test]
fn incident_descriptions_are_trimmed_and_dropped_without_incident() {
    let guard = EvaluationGuard::new();

    let validated = guard
        .check_submission(incident_submission("tr-100", "drv-7"), &delivered(), false)
        .expect("incident accepted");
    assert_eq!(
        validated.incident_description.as_deref(),
        Some("Client reported a damaged pallet")
    );

    let mut payload = submission("tr-100", "drv-7");
    payload.incident_description = Some("left over from a draft".to_string());
    let validated = guard
        .check_submission(payload, &delivered(), false)
        .expect("no incident");
    assert!(validated.incident_description.is_none());
}

#[test]
fn manual_scores_need_an_incident_and_a_valid_range() {
    let guard = EvaluationGuard::new();

    let mut payload = submission("tr-100", "drv-7");
    payload.manual_score = Some(80.0);
    assert_eq!(
        guard.check_submission(payload, &delivered(), false),
        Err(EvaluationViolation::ManualScoreWithoutIncident)
    );

    let mut payload = incident_submission("tr-100", "drv-7");
    payload.manual_score = Some(120.0);
    assert_eq!(
        guard.check_submission(payload, &delivered(), false),
        Err(EvaluationViolation::ManualScoreOutOfRange(120.0))
    );

    let mut payload = incident_submission("tr-100", "drv-7");
    payload.manual_score = Some(45.5);
    let validated = guard
        .check_submission(payload, &delivered(), false)
        .expect("override accepted");
    assert_eq!(validated.manual_score, Some(45.5));
}

#[test]
fn only_delivered_transports_can_be_evaluated_once() {
    let guard = EvaluationGuard::new();
    let in_transit = transport("tr-102", "drv-8", TransportStatus::InTransit, None);

    let err = guard
        .check_submission(submission("tr-102", "drv-8"), &in_transit, false)
        .expect_err("not delivered");
    assert!(err.is_conflict());
    assert!(err.to_string().contains("in_transit"));

    let err = guard
        .check_submission(submission("tr-100", "drv-7"), &delivered(), true)
        .expect_err("already evaluated");
    assert!(matches!(err, EvaluationViolation::AlreadyEvaluated(_)));
    assert!(err.is_conflict());
}

#[test]
fn driver_must_match_the_transport() {
    let err = EvaluationGuard::new()
        .check_submission(submission("tr-100", "drv-8"), &delivered(), false)
        .expect_err("wrong driver");

    match err {
        EvaluationViolation::DriverMismatch {
            expected, found, ..
        } => {
            assert_eq!(expected, DriverId("drv-7".to_string()));
            assert_eq!(found, DriverId("drv-8".to_string()));
        }
        other => panic!("expected driver mismatch, got {other:?}"),
    }
}

#[test]
fn weights_must_balance_across_active_criteria() {
    let guard = EvaluationGuard::new();
    let total = guard
        .check_weights(&standard_criteria())
        .expect("balanced weights");
    assert!((total - 100.0).abs() < 1e-9);

    let mut criteria = standard_criteria();
    criteria[1].is_active = false;
    let err = guard.check_weights(&criteria).expect_err("65 total");
    assert!(matches!(err, EvaluationViolation::UnbalancedWeights(_)));
    assert!(!err.is_conflict());
}

use crate::infra::build_services;
use chrono::Local;
use clap::Args;
use fleet_eval::config::SeedConfig;
use fleet_eval::error::AppError;
use fleet_eval::workflows::criteria_import::CriteriaImporter;
use fleet_eval::workflows::evaluation::{
    check_weight_sum, Criterion, CriterionAssessment, DriverScorecard, Evaluation,
    EvaluationSubmission, Severity,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct CriteriaCheckArgs {
    /// Criteria CSV export (Name, Weight, Penalty Leve, Penalty Medio, Penalty Grave, Active, Order)
    pub(crate) path: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Criteria CSV to score against instead of the bundled sample set.
    #[arg(long)]
    pub(crate) criteria_csv: Option<PathBuf>,
    /// Print the evaluation and scorecard as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_criteria_check(args: CriteriaCheckArgs) -> Result<(), AppError> {
    let drafts = CriteriaImporter::from_path(&args.path)?;

    println!("Criteria in {}", args.path.display());
    println!(
        "{:<4} {:<32} {:>7} {:>6} {:>6} {:>6}  {}",
        "ord", "name", "weight", "leve", "medio", "grave", "active"
    );
    for draft in &drafts {
        println!(
            "{:<4} {:<32} {:>7.2} {:>6.1} {:>6.1} {:>6.1}  {}",
            draft.order.unwrap_or_default(),
            draft.name,
            draft.weight,
            draft.penalties.leve,
            draft.penalties.medio,
            draft.penalties.grave,
            if draft.is_active { "yes" } else { "no" }
        );
    }

    let active: f64 = drafts
        .iter()
        .filter(|draft| draft.is_active)
        .map(|draft| draft.weight)
        .sum();
    println!("Active weight total: {active:.2}");
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let services = build_services(
        &SeedConfig {
            criteria_csv: args.criteria_csv,
            demo_data: true,
        },
        Local::now().date_naive(),
    )?;

    let criteria = services.criteria.list_active_criteria()?;
    let pending = services.evaluations.pending_transports()?;

    let mut evaluations = Vec::new();
    for (index, transport) in pending.iter().take(2).enumerate() {
        let incident = index == 1;
        let submission = EvaluationSubmission {
            transport_id: transport.id.clone(),
            driver_id: transport.driver_id.clone(),
            had_incident: incident,
            incident_description: incident
                .then(|| "Seal on the rear door found broken at unloading".to_string()),
            manual_score: None,
            assessments: sample_marks(&criteria, incident),
        };
        let evaluation = services.evaluations.submit(submission)?;
        evaluations.push(evaluation);
    }

    let Some(first) = evaluations.first() else {
        println!("No delivered transports are waiting for evaluation.");
        return Ok(());
    };
    let scorecard = services.evaluations.driver_scorecard(&first.driver_id)?;

    if args.json {
        let payload = serde_json::json!({
            "evaluations": evaluations,
            "scorecard": scorecard,
        });
        println!("{payload:#}");
    } else {
        render_criteria(&criteria);
        for evaluation in &evaluations {
            render_evaluation(evaluation);
        }
        render_scorecard(&scorecard);
        println!("\nIncident alerts queued: {}", services.alerts.events().len());
    }

    Ok(())
}

/// Leve on the first criterion and grave on the last; the incident run scores every tier as medio.
fn sample_marks(criteria: &[Criterion], incident: bool) -> Vec<CriterionAssessment> {
    let last = criteria.len().saturating_sub(1);
    criteria
        .iter()
        .enumerate()
        .map(|(index, criterion)| {
            let severity = match (incident, index) {
                (true, _) => Severity::Medio,
                (false, 0) => Severity::Leve,
                (false, index) if index == last => Severity::Grave,
                _ => Severity::SemOcorrencia,
            };
            CriterionAssessment::severity(&criterion.id.0, severity)
        })
        .collect()
}

fn render_criteria(criteria: &[Criterion]) {
    println!("Active criteria");
    for criterion in criteria {
        println!(
            "  {} {:<28} weight {:>6.2}  penalties {}/{}/{}",
            criterion.id,
            criterion.name,
            criterion.weight,
            criterion.penalties.leve,
            criterion.penalties.medio,
            criterion.penalties.grave
        );
    }
    let total = check_weight_sum(
        criteria
            .iter()
            .map(|criterion| (&criterion.id, criterion.weight)),
    );
    match total {
        Ok(total) => println!("  total weight {total:.2}"),
        Err(err) => println!("  {err}"),
    }
}

fn render_evaluation(evaluation: &Evaluation) {
    println!(
        "\nEvaluation {} for transport {} (driver {})",
        evaluation.id, evaluation.transport_id, evaluation.driver_id
    );
    for score in &evaluation.scores {
        let severity = score
            .severity
            .map(Severity::label)
            .unwrap_or("raw score");
        println!(
            "  {:<28} {:<15} {:>6.2}",
            score.criterion_name, severity, score.score
        );
    }
    println!("  average  {:>6.2}", evaluation.average_score);
    println!("  weighted {:>6.2}", evaluation.weighted_score);
    if let Some(description) = &evaluation.incident_description {
        println!("  incident: {description}");
    }
}

fn render_scorecard(scorecard: &DriverScorecard) {
    println!("\nScorecard for driver {}", scorecard.driver_id);
    println!("  evaluations        {}", scorecard.evaluations);
    if let Some(mean) = scorecard.mean_weighted_score {
        println!("  mean weighted      {mean:.2}");
    }
    if let Some(rate) = scorecard.incident_rate {
        println!("  incident rate      {:.0}%", rate * 100.0);
    }
    for trend in &scorecard.criteria {
        println!(
            "  {:<28} {:>6.2} over {} evaluation(s)",
            trend.criterion_name, trend.mean_score, trend.samples
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_eval::workflows::evaluation::{CriterionId, CriterionMark, PenaltyTiers};

    fn criterion(id: &str, order: i32) -> Criterion {
        Criterion {
            id: CriterionId(id.to_string()),
            name: format!("Criterion {order}"),
            weight: 25.0,
            penalties: PenaltyTiers::new(10.0, 50.0, 100.0),
            is_active: true,
            order,
        }
    }

    #[test]
    fn sample_marks_cover_every_active_criterion() {
        let criteria: Vec<Criterion> = (1..=4)
            .map(|order| criterion(&format!("crit-{order:06}"), order))
            .collect();

        let clean = sample_marks(&criteria, false);
        let marks: Vec<CriterionMark> = clean.iter().map(|mark| mark.mark).collect();
        assert_eq!(
            marks,
            vec![
                CriterionMark::Severity(Severity::Leve),
                CriterionMark::Severity(Severity::SemOcorrencia),
                CriterionMark::Severity(Severity::SemOcorrencia),
                CriterionMark::Severity(Severity::Grave),
            ]
        );

        let incident = sample_marks(&criteria, true);
        assert!(incident
            .iter()
            .all(|mark| mark.mark == CriterionMark::Severity(Severity::Medio)));
    }

    #[test]
    fn criteria_check_accepts_the_bundled_sample() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../crates/fleet-eval/sample_criteria.csv");
        run_criteria_check(CriteriaCheckArgs { path }).expect("sample is valid");
    }

    #[test]
    fn criteria_check_reports_missing_files() {
        let result = run_criteria_check(CriteriaCheckArgs {
            path: PathBuf::from("/nonexistent/criteria.csv"),
        });
        assert!(matches!(result, Err(AppError::CriteriaImport(_))));
    }
}

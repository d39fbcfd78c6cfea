use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{CriterionId, DriverId, Evaluation};
use super::scoring::round_score;

#[derive(Debug, Default, Clone)]
struct CriterionTally {
    name: String,
    samples: usize,
    total: f64,
}

/// Mean score a driver obtained on one criterion across their evaluations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionTrend {
    pub criterion_id: CriterionId,
    pub criterion_name: String,
    pub samples: usize,
    pub mean_score: f64,
}

/// Aggregated view of a driver's evaluation history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverScorecard {
    pub driver_id: DriverId,
    pub evaluations: usize,
    pub mean_weighted_score: Option<f64>,
    pub mean_average_score: Option<f64>,
    pub best_weighted_score: Option<f64>,
    pub worst_weighted_score: Option<f64>,
    pub incidents: usize,
    pub incident_rate: Option<f64>,
    pub manual_overrides: usize,
    pub last_evaluated_at: Option<DateTime<Utc>>,
    pub criteria: Vec<CriterionTrend>,
}

impl DriverScorecard {
    /// Build the scorecard from every evaluation; records of other drivers are skipped.
    pub fn from_evaluations<'a, I>(driver_id: &DriverId, evaluations: I) -> Self
    where
        I: IntoIterator<Item = &'a Evaluation>,
    {
        let mut count = 0usize;
        let mut weighted_total = 0.0;
        let mut average_total = 0.0;
        let mut best: Option<f64> = None;
        let mut worst: Option<f64> = None;
        let mut incidents = 0usize;
        let mut manual_overrides = 0usize;
        let mut last_evaluated_at: Option<DateTime<Utc>> = None;
        let mut tallies: BTreeMap<CriterionId, CriterionTally> = BTreeMap::new();

        for evaluation in evaluations
            .into_iter()
            .filter(|evaluation| &evaluation.driver_id == driver_id)
        {
            count += 1;
            weighted_total += evaluation.weighted_score;
            average_total += evaluation.average_score;
            best = Some(best.map_or(evaluation.weighted_score, |value| {
                value.max(evaluation.weighted_score)
            }));
            worst = Some(worst.map_or(evaluation.weighted_score, |value| {
                value.min(evaluation.weighted_score)
            }));
            if evaluation.had_incident {
                incidents += 1;
            }
            if evaluation.manual_override {
                manual_overrides += 1;
            }
            if last_evaluated_at.map_or(true, |last| evaluation.evaluated_at > last) {
                last_evaluated_at = Some(evaluation.evaluated_at);
            }

            for score in &evaluation.scores {
                let tally = tallies.entry(score.criterion_id.clone()).or_default();
                tally.name = score.criterion_name.clone();
                tally.samples += 1;
                tally.total += score.score;
            }
        }

        let mean = |total: f64| (count > 0).then(|| round_score(total / count as f64));

        Self {
            driver_id: driver_id.clone(),
            evaluations: count,
            mean_weighted_score: mean(weighted_total),
            mean_average_score: mean(average_total),
            best_weighted_score: best,
            worst_weighted_score: worst,
            incidents,
            incident_rate: (count > 0).then(|| incidents as f64 / count as f64),
            manual_overrides,
            last_evaluated_at,
            criteria: tallies
                .into_iter()
                .map(|(criterion_id, tally)| CriterionTrend {
                    criterion_id,
                    criterion_name: tally.name,
                    samples: tally.samples,
                    mean_score: round_score(tally.total / tally.samples as f64),
                })
                .collect(),
        }
    }
}

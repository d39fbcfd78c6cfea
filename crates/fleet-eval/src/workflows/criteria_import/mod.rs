//! Import of criteria sets exported from the back office spreadsheet.

mod normalizer;
mod parser;

use crate::workflows::evaluation::domain::{CriterionDraft, CriterionId, PenaltyTiers};
use crate::workflows::evaluation::dto::parse_flag;
use crate::workflows::evaluation::guard::{
    validate_name, validate_penalties, validate_weight, CriterionViolation,
};
use crate::workflows::evaluation::scoring::{check_weight_sum, WeightSumError};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use parser::CriterionRecord;

/// Criteria set used by the demo data and local walkthroughs.
pub const SAMPLE_CRITERIA_CSV: &str = include_str!("../../../sample_criteria.csv");

#[derive(Debug)]
pub enum CriteriaImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Empty,
    InvalidFlag { line: usize, value: String },
    Criterion {
        line: usize,
        violation: CriterionViolation,
    },
    Weights(WeightSumError),
}

impl std::fmt::Display for CriteriaImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriteriaImportError::Io(err) => write!(f, "failed to read criteria file: {err}"),
            CriteriaImportError::Csv(err) => write!(f, "invalid criteria CSV data: {err}"),
            CriteriaImportError::Empty => write!(f, "criteria file has no rows"),
            CriteriaImportError::InvalidFlag { line, value } => {
                write!(f, "line {line}: Active must be yes or no (found '{value}')")
            }
            CriteriaImportError::Criterion { line, violation } => {
                write!(f, "line {line}: {violation}")
            }
            CriteriaImportError::Weights(err) => write!(f, "active criteria: {err}"),
        }
    }
}

impl std::error::Error for CriteriaImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CriteriaImportError::Io(err) => Some(err),
            CriteriaImportError::Csv(err) => Some(err),
            CriteriaImportError::Criterion { violation, .. } => Some(violation),
            CriteriaImportError::Weights(err) => Some(err),
            CriteriaImportError::Empty | CriteriaImportError::InvalidFlag { .. } => None,
        }
    }
}

impl From<std::io::Error> for CriteriaImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CriteriaImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<WeightSumError> for CriteriaImportError {
    fn from(err: WeightSumError) -> Self {
        Self::Weights(err)
    }
}

pub struct CriteriaImporter;

impl CriteriaImporter {
    pub fn sample() -> Result<Vec<CriterionDraft>, CriteriaImportError> {
        Self::from_reader(SAMPLE_CRITERIA_CSV.as_bytes())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CriterionDraft>, CriteriaImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse and validate every row; the active weights must balance to 100.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CriterionDraft>, CriteriaImportError> {
        let records = parser::parse_records(reader)?;
        if records.is_empty() {
            return Err(CriteriaImportError::Empty);
        }

        let mut seen = HashSet::new();
        let mut drafts = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let draft = draft_from_record(index, record, &mut seen)?;
            drafts.push(draft);
        }

        let placeholders: Vec<(CriterionId, f64)> = drafts
            .iter()
            .enumerate()
            .filter(|(_, draft)| draft.is_active)
            .map(|(index, draft)| (CriterionId(format!("row-{index}")), draft.weight))
            .collect();
        check_weight_sum(placeholders.iter().map(|(id, weight)| (id, *weight)))?;

        Ok(drafts)
    }
}

fn draft_from_record(
    index: usize,
    record: CriterionRecord,
    seen: &mut HashSet<String>,
) -> Result<CriterionDraft, CriteriaImportError> {
    let line = record.line;
    let reject = |violation| CriteriaImportError::Criterion { line, violation };

    let name = validate_name(&record.name).map_err(reject)?;
    if !seen.insert(normalizer::name_key(&name)) {
        return Err(reject(CriterionViolation::DuplicateName(name)));
    }
    let weight = validate_weight(record.weight).map_err(reject)?;
    let penalties = validate_penalties(PenaltyTiers::new(
        record.penalty_leve,
        record.penalty_medio,
        record.penalty_grave,
    ))
    .map_err(reject)?;

    let is_active = match record.active {
        None => true,
        Some(value) => match parse_flag(&value) {
            Some(flag) => flag,
            None => return Err(CriteriaImportError::InvalidFlag { line, value }),
        },
    };

    Ok(CriterionDraft {
        name,
        weight,
        penalties,
        is_active,
        order: Some(record.order.unwrap_or(index as i32 + 1)),
    })
}

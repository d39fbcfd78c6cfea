use super::normalizer::normalize_name;
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One criteria row after trimming, before any domain validation.
#[derive(Debug)]
pub(crate) struct CriterionRecord {
    pub(crate) line: usize,
    pub(crate) name: String,
    pub(crate) weight: f64,
    pub(crate) penalty_leve: f64,
    pub(crate) penalty_medio: f64,
    pub(crate) penalty_grave: f64,
    pub(crate) active: Option<String>,
    pub(crate) order: Option<i32>,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<CriterionRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for (index, record) in csv_reader.deserialize::<CriterionRow>().enumerate() {
        let row = record?;
        records.push(CriterionRecord {
            // header occupies line 1
            line: index + 2,
            name: normalize_name(&row.name),
            weight: row.weight,
            penalty_leve: row.penalty_leve,
            penalty_medio: row.penalty_medio,
            penalty_grave: row.penalty_grave,
            active: row.active,
            order: row.order,
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct CriterionRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Weight")]
    weight: f64,
    #[serde(rename = "Penalty Leve")]
    penalty_leve: f64,
    #[serde(rename = "Penalty Medio")]
    penalty_medio: f64,
    #[serde(rename = "Penalty Grave")]
    penalty_grave: f64,
    #[serde(rename = "Active", default, deserialize_with = "empty_string_as_none")]
    active: Option<String>,
    #[serde(rename = "Order", default)]
    order: Option<i32>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

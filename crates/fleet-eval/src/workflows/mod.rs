pub mod criteria_import;
pub mod evaluation;

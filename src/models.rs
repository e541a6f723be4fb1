use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SubjectId = Uuid;

/// Baseline attendance for one subject, in whatever unit the source counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub session_type: String,
    pub attended_units: f64,
    pub conducted_units: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_percentage: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Attend,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub day_offset: i64,
    pub subject_id: SubjectId,
    pub action: Action,
}

fn unit_weight() -> f64 {
    1.0
}

/// One request in a step-by-step forecast. The weight is supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub subject_id: SubjectId,
    pub action: Action,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

/// Percentages right after one simulation is applied, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CascadeStep {
    pub subject_id: SubjectId,
    pub subject_pct: f64,
    pub global_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectProjection {
    #[serde(flatten)]
    pub subject: Subject,
    pub current_pct: f64,
    pub final_pct: f64,
    pub diff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlobalImpact {
    pub before: f64,
    pub after: f64,
    pub diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactResult {
    pub global: GlobalImpact,
    pub subjects: Vec<SubjectProjection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Day {
    pub offset: u32,
    pub date: NaiveDate,
    pub is_rest_day: bool,
}

/// A subject list together with the externally reported overall percentage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    pub subjects: Vec<Subject>,
    pub global_pct: f64,
}

use crate::impact::projected_pct;
use crate::importer::DEFAULT_SESSION_TYPE;
use crate::models::{Baseline, Subject, SubjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Present,
    Absent,
    Cancelled,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Present => "PRESENT",
            LogStatus::Absent => "ABSENT",
            LogStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PRESENT" => Some(LogStatus::Present),
            "ABSENT" => Some(LogStatus::Absent),
            "CANCELLED" => Some(LogStatus::Cancelled),
            _ => None,
        }
    }
}

/// One joined row from the store. Subjects without sessions or logs still
/// produce a row with the optional columns empty.
#[derive(Debug, Clone)]
pub struct LogRow {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub session_type: Option<String>,
    pub duration_hours: Option<f64>,
    pub status: Option<LogStatus>,
}

/// Folds store rows into the canonical subject list, keeping first-seen order.
pub fn aggregate(rows: &[LogRow]) -> Baseline {
    let mut subjects: Vec<Subject> = Vec::new();

    for row in rows {
        let index = match subjects.iter().position(|s| s.id == row.subject_id) {
            Some(index) => index,
            None => {
                subjects.push(Subject {
                    id: row.subject_id,
                    name: row.subject_name.clone(),
                    session_type: row
                        .session_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SESSION_TYPE.to_string()),
                    attended_units: 0.0,
                    conducted_units: 0.0,
                    baseline_percentage: None,
                });
                subjects.len() - 1
            }
        };

        let duration = row.duration_hours.unwrap_or(0.0);
        let subject = &mut subjects[index];
        match row.status {
            Some(LogStatus::Present) => {
                subject.attended_units += duration;
                subject.conducted_units += duration;
            }
            Some(LogStatus::Absent) => subject.conducted_units += duration,
            Some(LogStatus::Cancelled) | None => {}
        }
    }

    let attended: f64 = subjects.iter().map(|s| s.attended_units).sum();
    let conducted: f64 = subjects.iter().map(|s| s.conducted_units).sum();

    Baseline {
        subjects,
        global_pct: projected_pct(attended, conducted),
    }
}

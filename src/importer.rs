use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use thiserror::Error;

const SUBJECT_HEADERS: &[&str] = &[
    "subject",
    "subject name",
    "course",
    "course title",
    "course name",
    "sub",
    "subject code",
];
const TYPE_HEADERS: &[&str] = &["type", "subject type", "session type", "l/p", "category"];
const DATE_HEADERS: &[&str] = &["date", "session date", "class date", "time"];
const STATUS_HEADERS: &[&str] = &["status", "attendance", "state", "att"];
const PRESENT_HEADERS: &[&str] = &["present", "attended", "p"];
const ABSENT_HEADERS: &[&str] = &["absent", "bunked", "a", "missed"];
const TOTAL_HEADERS: &[&str] = &["total", "conducted", "classes held"];

const PRESENT_MARKERS: &[&str] = &["PRESENT", "P", "YES", "ATTENDED"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%d/%m/%Y"];
const SUMMARY_HISTORY_DAYS: i64 = 90;
/// Summary rows claiming more sessions than this are rejected.
pub const MAX_SUMMARY_SESSIONS: u32 = 10_000;
pub const DEFAULT_SESSION_TYPE: &str = "Lecture";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not recognise the CSV layout (need a subject column plus date/status or present counts)")]
    UnrecognizedLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// One row per class held.
    Daily,
    /// One row per subject with present/absent counts.
    Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedSession {
    pub subject: String,
    pub session_type: String,
    pub date: NaiveDate,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedImport {
    pub mode: ImportMode,
    pub sessions: Vec<ImportedSession>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Subject,
    Type,
    Date,
    Status,
    Present,
    Absent,
    Total,
}

/// Parses an attendance export whose headers vary between sources.
///
/// `today` anchors the fallback date for unparseable dates and the synthetic history
/// generated for summary exports.
pub fn parse_attendance(text: &str, today: NaiveDate) -> Result<ParsedImport, ImportError> {
    let text = text.trim_start_matches('\u{feff}').trim();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    let columns = map_columns(&headers);

    if !columns.contains_key(&Column::Subject) {
        return Err(ImportError::UnrecognizedLayout);
    }
    let mode = if columns.contains_key(&Column::Date) && columns.contains_key(&Column::Status) {
        ImportMode::Daily
    } else if columns.contains_key(&Column::Present) {
        ImportMode::Summary
    } else {
        return Err(ImportError::UnrecognizedLayout);
    };

    let history_start = today - Duration::days(SUMMARY_HISTORY_DAYS);
    let mut sessions = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record?;
        let value = |column: Column| {
            columns
                .get(&column)
                .and_then(|index| record.get(*index))
                .filter(|value| !value.is_empty())
        };

        let Some(subject) = value(Column::Subject) else {
            skipped += 1;
            continue;
        };
        let session_type = value(Column::Type).unwrap_or(DEFAULT_SESSION_TYPE);

        match mode {
            ImportMode::Daily => {
                let (Some(date), Some(status)) = (value(Column::Date), value(Column::Status))
                else {
                    skipped += 1;
                    continue;
                };
                sessions.push(ImportedSession {
                    subject: subject.to_string(),
                    session_type: session_type.to_string(),
                    date: parse_date(date, today),
                    present: is_present(status),
                });
            }
            ImportMode::Summary => {
                let present = parse_count(value(Column::Present));
                let absent = match (value(Column::Absent), value(Column::Total)) {
                    (None, Some(total)) => total
                        .parse::<u32>()
                        .ok()
                        .zip(present)
                        .map(|(total, present)| total.saturating_sub(present)),
                    (absent, _) => parse_count(absent),
                };
                let (Some(present), Some(absent)) = (present, absent) else {
                    skipped += 1;
                    continue;
                };
                let total = match present.checked_add(absent) {
                    Some(total) if total <= MAX_SUMMARY_SESSIONS => total,
                    _ => {
                        skipped += 1;
                        continue;
                    }
                };
                for i in 0..total {
                    sessions.push(ImportedSession {
                        subject: subject.to_string(),
                        session_type: session_type.to_string(),
                        date: history_start + Duration::days(i64::from(i)),
                        present: i < present,
                    });
                }
            }
        }
    }

    Ok(ParsedImport {
        mode,
        sessions,
        skipped,
    })
}

fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace('.', "")
        .replace('_', " ")
}

fn map_columns(headers: &[String]) -> HashMap<Column, usize> {
    let synonyms: [(Column, &[&str]); 7] = [
        (Column::Subject, SUBJECT_HEADERS),
        (Column::Type, TYPE_HEADERS),
        (Column::Date, DATE_HEADERS),
        (Column::Status, STATUS_HEADERS),
        (Column::Present, PRESENT_HEADERS),
        (Column::Absent, ABSENT_HEADERS),
        (Column::Total, TOTAL_HEADERS),
    ];

    let mut columns = HashMap::new();
    for (column, names) in synonyms {
        if let Some(index) = headers.iter().position(|h| names.contains(&h.as_str())) {
            columns.insert(column, index);
        }
    }
    columns
}

fn is_present(status: &str) -> bool {
    let status = status.trim().to_uppercase();
    PRESENT_MARKERS.contains(&status.as_str())
}

fn parse_date(value: &str, fallback: NaiveDate) -> NaiveDate {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .unwrap_or(fallback)
}

/// Missing counts read as zero; anything non-numeric rejects the row.
fn parse_count(value: Option<&str>) -> Option<u32> {
    match value {
        None => Some(0),
        Some(raw) => raw.parse().ok(),
    }
}

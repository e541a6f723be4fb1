use std::collections::HashMap;

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::baseline::{self, LogRow, LogStatus};
use crate::importer::ImportedSession;
use crate::models::Baseline;
use crate::weight::weight_of;

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub logs_written: usize,
    pub subjects: Vec<String>,
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<ImportSummary> {
    let subjects = vec![
        (
            Uuid::parse_str("6b1e2c4a-8f3d-4d27-9a51-0c7e5f9b2d13")?,
            "Operating Systems",
            "CS301",
            vec![("Lecture", 18, 2)],
        ),
        (
            Uuid::parse_str("a47c9e02-35b8-4f6a-8d1c-e29f70b6c845")?,
            "Database Systems",
            "CS305",
            vec![("Lecture", 12, 3), ("Lab", 4, 2)],
        ),
        (
            Uuid::parse_str("f2d85b7e-6c19-4a03-b7e4-913a2d8c5f60")?,
            "Computer Networks",
            "CS310",
            vec![("Lecture", 9, 5)],
        ),
    ];

    let start = NaiveDate::from_ymd_opt(2026, 7, 1).context("invalid date")?;
    let mut sessions = Vec::new();

    for (id, name, code, kinds) in subjects {
        upsert_subject(pool, id, name, Some(code)).await?;

        for (kind, present, absent) in kinds {
            for i in 0..present + absent {
                sessions.push(ImportedSession {
                    subject: name.to_string(),
                    session_type: kind.to_string(),
                    date: start + Duration::days(i64::from(i)),
                    present: i < present,
                });
            }
        }
    }

    import_sessions(pool, &sessions).await
}

async fn upsert_subject(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    code: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO attendance_forecast.subjects (id, name, code)
        VALUES ($1, $2, $3)
        ON CONFLICT ((lower(name))) DO UPDATE
        SET code = COALESCE(EXCLUDED.code, attendance_forecast.subjects.code)
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(code)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert subject {name}"))?
    .get("id");

    Ok(id)
}

async fn upsert_session_type(pool: &PgPool, subject_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO attendance_forecast.session_types (id, subject_id, name, duration_hours)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (subject_id, (lower(name))) DO UPDATE
        SET duration_hours = attendance_forecast.session_types.duration_hours
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(subject_id)
    .bind(name)
    .bind(f64::from(weight_of(name)))
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

/// Writes imported sessions, reusing subjects and session types matched by name
/// case-insensitively. A second import of the same day overwrites its status.
pub async fn import_sessions(
    pool: &PgPool,
    sessions: &[ImportedSession],
) -> anyhow::Result<ImportSummary> {
    let mut subject_ids: HashMap<String, Uuid> = HashMap::new();
    let mut session_type_ids: HashMap<(Uuid, String), Uuid> = HashMap::new();
    let mut summary = ImportSummary::default();

    for session in sessions {
        let subject_key = session.subject.to_lowercase();
        let subject_id = match subject_ids.get(&subject_key) {
            Some(id) => *id,
            None => {
                let id = upsert_subject(pool, Uuid::new_v4(), &session.subject, None).await?;
                subject_ids.insert(subject_key, id);
                summary.subjects.push(session.subject.clone());
                id
            }
        };

        let type_key = (subject_id, session.session_type.to_lowercase());
        let session_type_id = match session_type_ids.get(&type_key) {
            Some(id) => *id,
            None => {
                let id = upsert_session_type(pool, subject_id, &session.session_type).await?;
                debug!(%subject_id, session_type = %session.session_type, "session type ready");
                session_type_ids.insert(type_key, id);
                id
            }
        };

        let status = if session.present {
            LogStatus::Present
        } else {
            LogStatus::Absent
        };

        sqlx::query(
            r#"
            INSERT INTO attendance_forecast.attendance_logs
            (id, session_type_id, occurred_on, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (session_type_id, occurred_on) DO UPDATE
            SET status = EXCLUDED.status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_type_id)
        .bind(session.date)
        .bind(status.as_str())
        .execute(pool)
        .await?;

        summary.logs_written += 1;
    }

    info!(
        logs = summary.logs_written,
        subjects = summary.subjects.len(),
        "attendance logs written"
    );
    Ok(summary)
}

pub async fn fetch_log_rows(pool: &PgPool) -> anyhow::Result<Vec<LogRow>> {
    let records = sqlx::query(
        r#"
        SELECT s.id AS subject_id, s.name AS subject_name,
               st.name AS session_type, st.duration_hours, l.status
        FROM attendance_forecast.subjects s
        LEFT JOIN attendance_forecast.session_types st ON st.subject_id = s.id
        LEFT JOIN attendance_forecast.attendance_logs l ON l.session_type_id = st.id
        ORDER BY s.created_at, s.name, st.created_at, st.name, l.occurred_on
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let status: Option<String> = record.get("status");
        rows.push(LogRow {
            subject_id: record.get("subject_id"),
            subject_name: record.get("subject_name"),
            session_type: record.get("session_type"),
            duration_hours: record.get("duration_hours"),
            status: status.as_deref().and_then(LogStatus::parse),
        });
    }

    Ok(rows)
}

pub async fn fetch_baseline(pool: &PgPool) -> anyhow::Result<Baseline> {
    let rows = fetch_log_rows(pool).await?;
    let baseline = baseline::aggregate(&rows);
    debug!(
        subjects = baseline.subjects.len(),
        global_pct = baseline.global_pct,
        "baseline loaded"
    );
    Ok(baseline)
}

use std::collections::HashMap;
use std::fmt::Write;

use crate::advice::advise;
use crate::ledger::ActionLedger;
use crate::models::{Action, Day, ImpactResult, Subject};

/// Two-decimal change with an explicit plus sign; anything that rounds to zero prints bare.
pub fn signed(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0.00".to_string()
    } else if rounded > 0.0 {
        format!("+{rounded:.2}")
    } else {
        format!("{rounded:.2}")
    }
}

pub fn build_report(
    days: &[Day],
    subjects: &[Subject],
    ledger: &ActionLedger,
    impact: &ImpactResult,
    target_pct: f64,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Forecast");
    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        let _ = writeln!(
            output,
            "Planning {} to {} against a {:.0}% target",
            first.date,
            last.date,
            target_pct
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Week");

    for day in days {
        let marker = if day.is_rest_day {
            " (no classes)"
        } else if ledger.has_actions_on_day(i64::from(day.offset)) {
            " (planned)"
        } else {
            ""
        };
        let _ = writeln!(output, "- {} {}{}", day.date.format("%a"), day.date, marker);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall");
    let _ = writeln!(
        output,
        "- {:.2}% now, {:.2}% after ({})",
        impact.global.before,
        impact.global.after,
        signed(impact.global.diff)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Subjects");

    if impact.subjects.is_empty() {
        let _ = writeln!(output, "No subjects recorded yet.");
    } else {
        for projection in impact.subjects.iter() {
            let subject = &projection.subject;
            let flag = if projection.final_pct < target_pct {
                " below target"
            } else {
                ""
            };
            let _ = writeln!(
                output,
                "- {} ({}): {:.1}% -> {:.1}% ({}){}; {}",
                subject.name,
                subject.session_type,
                projection.current_pct,
                projection.final_pct,
                signed(projection.diff),
                flag,
                advise(subject.attended_units, subject.conducted_units, target_pct)
            );
        }
    }

    let names: HashMap<_, _> = subjects.iter().map(|s| (s.id, s.name.as_str())).collect();
    let dates: HashMap<_, _> = days.iter().map(|d| (i64::from(d.offset), d.date)).collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Planned Sessions");

    if ledger.is_empty() {
        let _ = writeln!(output, "Nothing planned.");
    } else {
        for entry in ledger.entries() {
            let when = dates
                .get(&entry.day_offset)
                .map(|date| date.to_string())
                .unwrap_or_else(|| format!("day {}", entry.day_offset));
            let name = names
                .get(&entry.subject_id)
                .copied()
                .unwrap_or("unknown subject");
            let verb = match entry.action {
                Action::Attend => "attend",
                Action::Skip => "skip",
            };
            let _ = writeln!(output, "- {when}: {verb} {name}");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::days::generate_days;
    use crate::impact::compute_impact;
    use chrono::{NaiveDate, Weekday};
    use uuid::Uuid;

    fn subjects() -> Vec<Subject> {
        vec![
            Subject {
                id: Uuid::from_u128(1),
                name: "Operating Systems".to_string(),
                session_type: "Lecture".to_string(),
                attended_units: 18.0,
                conducted_units: 20.0,
                baseline_percentage: None,
            },
            Subject {
                id: Uuid::from_u128(2),
                name: "Database Lab".to_string(),
                session_type: "Lab".to_string(),
                attended_units: 6.0,
                conducted_units: 10.0,
                baseline_percentage: None,
            },
        ]
    }

    #[test]
    fn report_lists_week_subjects_and_plan() {
        let subjects = subjects();
        let days = generate_days(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(), Weekday::Sun);
        let mut ledger = ActionLedger::new();
        ledger.cycle(1, Uuid::from_u128(2));
        ledger.cycle(1, Uuid::from_u128(2));
        let impact = compute_impact(&subjects, &ledger, 80.0);

        let report = build_report(&days, &subjects, &ledger, &impact, 75.0);

        assert!(report.contains("Planning 2026-10-19 to 2026-10-25"));
        assert!(report.contains("- Tue 2026-10-20 (planned)"));
        assert!(report.contains("- Sun 2026-10-25 (no classes)"));
        assert!(report.contains("- 2026-10-20: skip Database Lab"));
        assert!(report.contains("Database Lab (Lab): 60.0% -> 50.0% (-10.00) below target"));
        assert!(report.contains("at risk, attend the next 6"));
    }

    #[test]
    fn empty_plan_is_reported() {
        let subjects = subjects();
        let days = generate_days(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(), Weekday::Sun);
        let ledger = ActionLedger::new();
        let impact = compute_impact(&subjects, &ledger, 80.0);

        let report = build_report(&days, &subjects, &ledger, &impact, 75.0);
        assert!(report.contains("Nothing planned."));
        assert!(report.contains("80.00% now, 80.00% after (0.00)"));
    }

    #[test]
    fn signs_positive_changes() {
        assert_eq!(signed(0.476), "+0.48");
        assert_eq!(signed(-1.0), "-1.00");
        assert_eq!(signed(0.0), "0.00");
        assert_eq!(signed(-0.001), "0.00");
    }
}

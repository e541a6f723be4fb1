use std::collections::HashMap;

use crate::ledger::ActionLedger;
use crate::models::{
    Action, CascadeStep, GlobalImpact, ImpactResult, Simulation, Subject, SubjectId,
    SubjectProjection,
};
use crate::weight::weight_of;

/// Projects every subject and the overall percentage after applying the whole ledger.
///
/// Day offsets play no part in the arithmetic. `current_global_pct` is reported as
/// `before` untouched, even when it disagrees with the subject totals.
pub fn compute_impact(
    subjects: &[Subject],
    ledger: &ActionLedger,
    current_global_pct: f64,
) -> ImpactResult {
    let mut global_attended: f64 = subjects.iter().map(|s| s.attended_units).sum();
    let mut global_conducted: f64 = subjects.iter().map(|s| s.conducted_units).sum();

    let by_id: HashMap<SubjectId, &Subject> = subjects.iter().map(|s| (s.id, s)).collect();
    let mut added: HashMap<SubjectId, (f64, f64)> = HashMap::new();

    for entry in ledger.entries() {
        let Some(subject) = by_id.get(&entry.subject_id) else {
            continue;
        };

        let weight = f64::from(weight_of(&subject.session_type));
        let totals = added.entry(entry.subject_id).or_insert((0.0, 0.0));

        if entry.action == Action::Attend {
            totals.0 += weight;
            global_attended += weight;
        }
        totals.1 += weight;
        global_conducted += weight;
    }

    let mut projections: Vec<SubjectProjection> = subjects
        .iter()
        .map(|subject| {
            let (added_attended, added_conducted) =
                added.get(&subject.id).copied().unwrap_or((0.0, 0.0));
            let final_pct = projected_pct(
                subject.attended_units + added_attended,
                subject.conducted_units + added_conducted,
            );
            let current_pct = current_pct(subject);

            SubjectProjection {
                subject: subject.clone(),
                current_pct,
                final_pct,
                diff: final_pct - current_pct,
            }
        })
        .collect();

    projections.sort_by(|a, b| b.diff.abs().total_cmp(&a.diff.abs()));

    let after = projected_pct(global_attended, global_conducted);

    ImpactResult {
        global: GlobalImpact {
            before: current_global_pct,
            after,
            diff: after - current_global_pct,
        },
        subjects: projections,
    }
}

/// Applies simulations one after another and records the running percentages.
///
/// Each step builds on the previous ones. Simulations for unknown subjects produce
/// no step.
pub fn cascade(subjects: &[Subject], simulations: &[Simulation]) -> Vec<CascadeStep> {
    let mut totals: HashMap<SubjectId, (f64, f64)> = subjects
        .iter()
        .map(|s| (s.id, (s.attended_units, s.conducted_units)))
        .collect();
    let mut global_attended: f64 = subjects.iter().map(|s| s.attended_units).sum();
    let mut global_conducted: f64 = subjects.iter().map(|s| s.conducted_units).sum();

    let mut steps = Vec::with_capacity(simulations.len());
    for simulation in simulations {
        let Some(subject) = totals.get_mut(&simulation.subject_id) else {
            continue;
        };

        if simulation.action == Action::Attend {
            subject.0 += simulation.weight;
            global_attended += simulation.weight;
        }
        subject.1 += simulation.weight;
        global_conducted += simulation.weight;

        steps.push(CascadeStep {
            subject_id: simulation.subject_id,
            subject_pct: round2(projected_pct(subject.0, subject.1)),
            global_pct: round2(projected_pct(global_attended, global_conducted)),
        });
    }
    steps
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage shown as "now". A subject with nothing conducted reads 0%.
pub fn current_pct(subject: &Subject) -> f64 {
    subject.baseline_percentage.unwrap_or_else(|| {
        if subject.conducted_units > 0.0 {
            subject.attended_units / subject.conducted_units * 100.0
        } else {
            0.0
        }
    })
}

/// Percentage shown as "after". Nothing conducted reads 100%.
pub fn projected_pct(attended: f64, conducted: f64) -> f64 {
    if conducted > 0.0 {
        attended / conducted * 100.0
    } else {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LedgerEntry;
    use uuid::Uuid;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.001
    }

    fn subject(n: u128, session_type: &str, attended: f64, conducted: f64) -> Subject {
        Subject {
            id: Uuid::from_u128(n),
            name: format!("Subject {n}"),
            session_type: session_type.to_string(),
            attended_units: attended,
            conducted_units: conducted,
            baseline_percentage: None,
        }
    }

    #[test]
    fn single_lecture_walkthrough() {
        let subjects = vec![subject(1, "Lecture", 18.0, 20.0)];
        let id = Uuid::from_u128(1);
        let mut ledger = ActionLedger::new();

        ledger.cycle(0, id);
        let result = compute_impact(&subjects, &ledger, 90.0);
        let projection = &result.subjects[0];
        assert!(close(projection.final_pct, 90.476));
        assert!(close(projection.diff, 0.476));
        assert!(close(result.global.after, 90.476));
        assert!(close(result.global.diff, 0.476));

        ledger.cycle(0, id);
        let result = compute_impact(&subjects, &ledger, 90.0);
        assert!(close(result.subjects[0].final_pct, 85.714));

        ledger.cycle(0, id);
        let result = compute_impact(&subjects, &ledger, 90.0);
        assert!(close(result.subjects[0].final_pct, 90.0));
        assert!(close(result.global.diff, 0.0));
    }

    #[test]
    fn labs_move_twice_as_far() {
        let subjects = vec![subject(1, "Physics Lab", 8.0, 10.0)];
        let mut ledger = ActionLedger::new();
        ledger.cycle(1, Uuid::from_u128(1));
        ledger.cycle(1, Uuid::from_u128(1));

        let result = compute_impact(&subjects, &ledger, 80.0);
        assert!(close(result.subjects[0].final_pct, 8.0 / 12.0 * 100.0));
        assert!(close(result.global.after, 8.0 / 12.0 * 100.0));
    }

    #[test]
    fn every_day_counts_toward_totals() {
        let subjects = vec![
            subject(1, "Lecture", 10.0, 12.0),
            subject(2, "Lab", 6.0, 8.0),
        ];
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        let spread: ActionLedger = vec![
            LedgerEntry {
                day_offset: 0,
                subject_id: a,
                action: Action::Attend,
            },
            LedgerEntry {
                day_offset: 3,
                subject_id: a,
                action: Action::Skip,
            },
            LedgerEntry {
                day_offset: 5,
                subject_id: b,
                action: Action::Skip,
            },
        ]
        .into_iter()
        .collect();
        let shuffled: ActionLedger = vec![
            LedgerEntry {
                day_offset: 6,
                subject_id: a,
                action: Action::Skip,
            },
            LedgerEntry {
                day_offset: 1,
                subject_id: a,
                action: Action::Attend,
            },
            LedgerEntry {
                day_offset: 1,
                subject_id: b,
                action: Action::Skip,
            },
        ]
        .into_iter()
        .collect();

        assert_eq!(
            compute_impact(&subjects, &spread, 80.0),
            compute_impact(&subjects, &shuffled, 80.0)
        );
    }

    #[test]
    fn offsets_outside_the_week_still_count() {
        let subjects = vec![subject(1, "Lecture", 18.0, 20.0)];
        let id = Uuid::from_u128(1);
        let mut ledger = ActionLedger::new();
        ledger.cycle(-1, id);
        ledger.cycle(12, id);
        ledger.cycle(12, id);

        let result = compute_impact(&subjects, &ledger, 90.0);
        // One attend and one skip: 19 of 22.
        assert!(close(result.subjects[0].final_pct, 19.0 / 22.0 * 100.0));
        assert!(close(result.global.after, 19.0 / 22.0 * 100.0));
        assert!(result.subjects[0].diff < 0.0);
    }

    #[test]
    fn cascade_reports_each_step() {
        let subjects = vec![subject(1, "Lecture", 10.0, 10.0)];
        let id = Uuid::from_u128(1);
        let skip = Simulation {
            subject_id: id,
            action: Action::Skip,
            weight: 1.0,
        };

        let steps = cascade(&subjects, &[skip, skip]);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].subject_pct, 90.91);
        assert_eq!(steps[0].global_pct, 90.91);
        assert_eq!(steps[1].subject_pct, 83.33);
        assert_eq!(steps[1].global_pct, 83.33);
    }

    #[test]
    fn cascade_uses_caller_weights_and_tracks_the_whole_record() {
        let subjects = vec![
            subject(1, "Lecture", 9.0, 10.0),
            subject(2, "Lab", 10.0, 10.0),
        ];
        let simulations = vec![
            Simulation {
                subject_id: Uuid::from_u128(2),
                action: Action::Skip,
                weight: 2.0,
            },
            Simulation {
                subject_id: Uuid::from_u128(99),
                action: Action::Skip,
                weight: 1.0,
            },
            Simulation {
                subject_id: Uuid::from_u128(1),
                action: Action::Attend,
                weight: 1.0,
            },
        ];

        let steps = cascade(&subjects, &simulations);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].subject_pct, 83.33);
        assert_eq!(steps[0].global_pct, 86.36);
        assert_eq!(steps[1].subject_id, Uuid::from_u128(1));
        assert_eq!(steps[1].subject_pct, 90.91);
        assert_eq!(steps[1].global_pct, 86.96);
    }

    #[test]
    fn cascade_on_empty_record_stays_finite() {
        let subjects = vec![subject(1, "Lecture", 0.0, 0.0)];
        let steps = cascade(
            &subjects,
            &[Simulation {
                subject_id: Uuid::from_u128(1),
                action: Action::Skip,
                weight: 0.0,
            }],
        );
        assert_eq!(steps[0].subject_pct, 100.0);
        assert_eq!(steps[0].global_pct, 100.0);
    }

    #[test]
    fn simulation_weight_defaults_to_one() {
        let json = r#"{"subject_id": "00000000-0000-0000-0000-000000000001", "action": "SKIP"}"#;
        let simulation: Simulation = serde_json::from_str(json).unwrap();
        assert_eq!(simulation.weight, 1.0);
        assert_eq!(simulation.action, Action::Skip);
    }

    #[test]
    fn zero_conducted_projects_to_full_but_reads_zero_now() {
        let subjects = vec![subject(1, "Lecture", 0.0, 0.0)];
        let result = compute_impact(&subjects, &ActionLedger::new(), 100.0);
        let projection = &result.subjects[0];
        assert_eq!(projection.current_pct, 0.0);
        assert_eq!(projection.final_pct, 100.0);
        assert_eq!(projection.diff, 100.0);
        assert_eq!(result.global.after, 100.0);
    }

    #[test]
    fn supplied_baseline_percentage_wins() {
        let mut tracked = subject(1, "Lecture", 18.0, 20.0);
        tracked.baseline_percentage = Some(88.0);
        let result = compute_impact(&[tracked], &ActionLedger::new(), 90.0);
        assert_eq!(result.subjects[0].current_pct, 88.0);
        assert!(close(result.subjects[0].diff, 2.0));
    }

    #[test]
    fn ranks_by_magnitude_and_keeps_ties_in_order() {
        let subjects = vec![
            subject(1, "Lecture", 9.0, 10.0),
            subject(2, "Lecture", 5.0, 5.0),
            subject(3, "Lecture", 9.0, 10.0),
            subject(4, "Lecture", 9.0, 10.0),
        ];
        let mut ledger = ActionLedger::new();
        // Same shift for 1 and 3, larger one for 2, none for 4.
        ledger.cycle(0, Uuid::from_u128(1));
        ledger.cycle(0, Uuid::from_u128(1));
        ledger.cycle(0, Uuid::from_u128(3));
        ledger.cycle(0, Uuid::from_u128(3));
        ledger.cycle(2, Uuid::from_u128(2));
        ledger.cycle(2, Uuid::from_u128(2));

        let result = compute_impact(&subjects, &ledger, 90.0);
        let order: Vec<u128> = result
            .subjects
            .iter()
            .map(|p| p.subject.id.as_u128())
            .collect();
        assert_eq!(order, vec![2, 1, 3, 4]);
    }

    #[test]
    fn unknown_subjects_are_ignored() {
        let subjects = vec![subject(1, "Lecture", 18.0, 20.0)];
        let mut ledger = ActionLedger::new();
        ledger.cycle(0, Uuid::from_u128(99));

        let result = compute_impact(&subjects, &ledger, 90.0);
        assert!(close(result.subjects[0].final_pct, 90.0));
        assert!(close(result.global.after, 90.0));
    }

    #[test]
    fn before_is_taken_from_caller() {
        let subjects = vec![subject(1, "Lecture", 18.0, 20.0)];
        let result = compute_impact(&subjects, &ActionLedger::new(), 87.5);
        assert_eq!(result.global.before, 87.5);
        assert!(close(result.global.after, 90.0));
        assert!(close(result.global.diff, 2.5));
    }

    #[test]
    fn empty_input_yields_full_projection() {
        let result = compute_impact(&[], &ActionLedger::new(), 100.0);
        assert!(result.subjects.is_empty());
        assert_eq!(result.global.after, 100.0);
        assert_eq!(result.global.diff, 0.0);
    }

    #[test]
    fn inconsistent_counts_do_not_panic() {
        let subjects = vec![subject(1, "Lecture", 25.0, 20.0), subject(2, "Lab", -3.0, -1.0)];
        let result = compute_impact(&subjects, &ActionLedger::new(), 0.0);
        assert!(result.subjects.iter().all(|p| p.final_pct.is_finite()));
        assert!(result.global.after.is_finite());
    }

    #[test]
    fn result_serializes_to_json() {
        let subjects = vec![subject(1, "Lecture", 18.0, 20.0)];
        let result = compute_impact(&subjects, &ActionLedger::new(), 90.0);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["global"]["before"], 90.0);
        assert_eq!(json["subjects"][0]["session_type"], "Lecture");
        assert_eq!(json["subjects"][0]["final_pct"], 90.0);
    }
}

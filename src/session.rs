use thiserror::Error;
use tracing::debug;

use crate::days::in_window;
use crate::impact::compute_impact;
use crate::ledger::{ActionLedger, LedgerKey};
use crate::models::{Baseline, ImpactResult, LedgerEntry, SubjectId};

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("day offset {0} is outside the planning window")]
    OutsideWindow(i64),
}

/// One user's planner: a baseline and the decisions simulated against it.
#[derive(Debug, Clone, Default)]
pub struct ForecastSession {
    baseline: Baseline,
    ledger: ActionLedger,
}

impl ForecastSession {
    pub fn new(baseline: Baseline) -> Self {
        ForecastSession {
            baseline,
            ledger: ActionLedger::new(),
        }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn ledger(&self) -> &ActionLedger {
        &self.ledger
    }

    /// Cycles one cell and recomputes the projection from scratch.
    pub fn toggle(&mut self, day_offset: i64, subject_id: SubjectId) -> ImpactResult {
        self.ledger.cycle(day_offset, subject_id);
        debug!(
            day_offset,
            %subject_id,
            state = ?self.ledger.get(day_offset, subject_id),
            "toggled planner cell"
        );
        self.impact()
    }

    /// Loads previously planned entries, replacing any decision already on those cells.
    pub fn load_plan(&mut self, entries: impl IntoIterator<Item = LedgerEntry>) {
        let mut merged: Vec<LedgerEntry> = self.ledger.entries().collect();
        merged.extend(entries);
        self.ledger = merged.into_iter().collect();
    }

    /// Loads a saved plan then replays toggles in order, rejecting any cell outside
    /// the displayed window. Nothing is applied when a cell is rejected.
    pub fn apply_plan(
        &mut self,
        plan: Vec<LedgerEntry>,
        toggles: &[LedgerKey],
    ) -> Result<ImpactResult, PlanError> {
        let offsets = plan
            .iter()
            .map(|entry| entry.day_offset)
            .chain(toggles.iter().map(|key| key.day_offset));
        for day_offset in offsets {
            if !in_window(day_offset) {
                return Err(PlanError::OutsideWindow(day_offset));
            }
        }

        self.load_plan(plan);
        for key in toggles {
            self.toggle(key.day_offset, key.subject_id);
        }
        Ok(self.impact())
    }

    /// A fresh baseline invalidates every simulated decision.
    pub fn replace_baseline(&mut self, baseline: Baseline) {
        debug!(
            dropped = self.ledger.len(),
            subjects = baseline.subjects.len(),
            "baseline replaced, clearing planner"
        );
        self.baseline = baseline;
        self.ledger.clear();
    }

    pub fn impact(&self) -> ImpactResult {
        compute_impact(
            &self.baseline.subjects,
            &self.ledger,
            self.baseline.global_pct,
        )
    }
}

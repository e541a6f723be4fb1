use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Action, LedgerEntry, SubjectId};

/// One cell of the planner grid: a subject on a given day of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LedgerKey {
    pub day_offset: i64,
    pub subject_id: SubjectId,
}

#[derive(Debug, Error, PartialEq)]
pub enum KeyParseError {
    #[error("expected DAY:SUBJECT_ID, got `{0}`")]
    Shape(String),
    #[error("invalid day offset `{0}`")]
    DayOffset(String),
    #[error("invalid subject id `{0}`")]
    SubjectId(String),
}

impl FromStr for LedgerKey {
    type Err = KeyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (day, subject) = value
            .split_once(':')
            .ok_or_else(|| KeyParseError::Shape(value.to_string()))?;
        let day_offset = day
            .trim()
            .parse::<i64>()
            .map_err(|_| KeyParseError::DayOffset(day.to_string()))?;
        let subject_id = Uuid::parse_str(subject.trim())
            .map_err(|_| KeyParseError::SubjectId(subject.to_string()))?;
        Ok(LedgerKey {
            day_offset,
            subject_id,
        })
    }
}

/// Sparse record of simulated decisions. A missing key means no decision.
///
/// Any offset is accepted here; narrowing to the displayed window is left to
/// whoever feeds the ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionLedger {
    actions: BTreeMap<LedgerKey, Action>,
}

impl ActionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the cell through none -> attend -> skip -> none.
    pub fn cycle(&mut self, day_offset: i64, subject_id: SubjectId) {
        let key = LedgerKey {
            day_offset,
            subject_id,
        };
        match self.actions.get(&key).copied() {
            None => {
                self.actions.insert(key, Action::Attend);
            }
            Some(Action::Attend) => {
                self.actions.insert(key, Action::Skip);
            }
            Some(Action::Skip) => {
                self.actions.remove(&key);
            }
        }
    }

    pub fn get(&self, day_offset: i64, subject_id: SubjectId) -> Option<Action> {
        self.actions
            .get(&LedgerKey {
                day_offset,
                subject_id,
            })
            .copied()
    }

    pub fn has_actions_on_day(&self, day_offset: i64) -> bool {
        self.actions.keys().any(|key| key.day_offset == day_offset)
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Entries ordered by day, then subject id.
    pub fn entries(&self) -> impl Iterator<Item = LedgerEntry> + '_ {
        self.actions.iter().map(|(key, action)| LedgerEntry {
            day_offset: key.day_offset,
            subject_id: key.subject_id,
            action: *action,
        })
    }
}

impl FromIterator<LedgerEntry> for ActionLedger {
    fn from_iter<I: IntoIterator<Item = LedgerEntry>>(iter: I) -> Self {
        let actions = iter
            .into_iter()
            .map(|entry| {
                (
                    LedgerKey {
                        day_offset: entry.day_offset,
                        subject_id: entry.subject_id,
                    },
                    entry.action,
                )
            })
            .collect();
        ActionLedger { actions }
    }
}

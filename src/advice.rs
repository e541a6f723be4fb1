use serde::Serialize;

/// How far a record is from the attendance target, in the record's own units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Advice {
    Safe { can_skip: u64 },
    /// `None` when the target is 100% and already missed.
    AtRisk { must_attend: Option<u64> },
}

pub const DEFAULT_TARGET_PCT: f64 = 75.0;

pub fn advise(attended: f64, conducted: f64, target_pct: f64) -> Advice {
    if conducted <= 0.0 {
        return Advice::Safe { can_skip: 0 };
    }

    let target = target_pct.clamp(1.0, 100.0) / 100.0;
    let current = attended / conducted;

    if current >= target {
        let can_skip = (attended / target - conducted).floor().max(0.0);
        return Advice::Safe {
            can_skip: can_skip as u64,
        };
    }

    if target >= 1.0 {
        return Advice::AtRisk { must_attend: None };
    }

    let needed = ((target * conducted - attended) / (1.0 - target)).ceil().max(0.0);
    Advice::AtRisk {
        must_attend: Some(needed as u64),
    }
}

impl std::fmt::Display for Advice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advice::Safe { can_skip } => write!(f, "safe, can skip {can_skip}"),
            Advice::AtRisk {
                must_attend: Some(needed),
            } => write!(f, "at risk, attend the next {needed}"),
            Advice::AtRisk { must_attend: None } => write!(f, "at risk, target unreachable"),
        }
    }
}

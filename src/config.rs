use anyhow::Context;
use chrono::{NaiveDate, Weekday};
use clap::Args;

use crate::advice::DEFAULT_TARGET_PCT;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .context("DATABASE_URL must be set to a production Postgres instance")?;
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(DbConfig {
            database_url,
            max_connections,
        })
    }
}

/// Knobs shared by every command that shows a planning window or advice.
#[derive(Debug, Clone, Args)]
pub struct PlannerOptions {
    /// First day of the window (defaults to today)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Weekday with no classes
    #[arg(long, default_value = "sun")]
    pub rest_day: Weekday,
    /// Attendance percentage to stay above
    #[arg(long, default_value_t = DEFAULT_TARGET_PCT as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub target: u8,
}

impl PlannerOptions {
    pub fn reference_date(&self) -> NaiveDate {
        self.from.unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn target_pct(&self) -> f64 {
        f64::from(self.target)
    }
}

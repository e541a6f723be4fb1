use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::models::Day;

pub const WINDOW_DAYS: u32 = 7;

/// The planning window: `reference` plus the following six days.
pub fn generate_days(reference: NaiveDate, rest_day: Weekday) -> Vec<Day> {
    (0..WINDOW_DAYS)
        .map(|offset| {
            let date = reference + Duration::days(i64::from(offset));
            Day {
                offset,
                date,
                is_rest_day: date.weekday() == rest_day,
            }
        })
        .collect()
}

pub fn in_window(day_offset: i64) -> bool {
    (0..i64::from(WINDOW_DAYS)).contains(&day_offset)
}

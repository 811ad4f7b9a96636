//! Daily practice streaks.
//!
//! The transition is a pure function of the practice date, the last counted
//! practice date and the streak carried so far. It runs once per submitted
//! answer; several answers on the same calendar day count once.

use std::str::FromStr;

use anyhow::anyhow;
use chrono::{Local, NaiveDate, Utc};

use crate::models::StreakState;

/// Storage format for practice dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Computes the streak after practicing on `today`.
pub fn advance(today: NaiveDate, last_practice: Option<NaiveDate>, current: u32) -> u32 {
    match last_practice {
        None => 1,
        Some(last) if last == today => current.max(1),
        Some(last) if Some(last) == today.pred_opt() => current.saturating_add(1),
        Some(_) => 1,
    }
}

impl StreakState {
    /// The state after practicing on `today`; the best streak never decreases.
    pub fn after_practice(self, today: NaiveDate, last_practice: Option<NaiveDate>) -> StreakState {
        let current = advance(today, last_practice, self.current);
        StreakState {
            current,
            best: self.best.max(current),
        }
    }
}

/// Parses a stored practice date. Anything unreadable counts as no previous practice.
pub fn parse_practice_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .inspect_err(|err| log::warn!("[parse_practice_date] Ignoring malformed practice date '{raw}': {err}"))
        .ok()
}

pub fn format_practice_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Which calendar decides what "today" is for streak purposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreakClock {
    /// The host's local calendar date.
    #[default]
    Local,
    Utc,
}

impl StreakClock {
    pub fn today(self) -> NaiveDate {
        match self {
            StreakClock::Local => Local::now().date_naive(),
            StreakClock::Utc => Utc::now().date_naive(),
        }
    }
}

impl FromStr for StreakClock {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StreakClock::Local),
            "utc" => Ok(StreakClock::Utc),
            other => Err(anyhow!("Unknown streak clock: {other} (expected local or utc)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn first_practice_starts_at_one() {
        assert_eq!(advance(day(10), None, 0), 1);
        assert_eq!(advance(day(10), None, 7), 1);
    }

    #[test]
    fn same_day_keeps_streak() {
        assert_eq!(advance(day(10), Some(day(10)), 4), 4);
        assert_eq!(advance(day(10), Some(day(10)), 0), 1);
    }

    #[test]
    fn next_day_increments() {
        assert_eq!(advance(day(11), Some(day(10)), 4), 5);
        assert_eq!(advance(day(11), Some(day(10)), 0), 1);
    }

    #[test]
    fn longest_streak_saturates() {
        assert_eq!(advance(day(11), Some(day(10)), u32::MAX), u32::MAX);

        let state = StreakState { current: u32::MAX, best: u32::MAX };
        assert_eq!(state.after_practice(day(11), Some(day(10))), state);
    }

    #[test]
    fn gap_resets() {
        assert_eq!(advance(day(13), Some(day(10)), 4), 1);
        // a date in the future is not a continuation either
        assert_eq!(advance(day(10), Some(day(12)), 4), 1);
    }

    #[test]
    fn increments_across_month_boundary() {
        let last = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        assert_eq!(advance(day(1), Some(last), 2), 3);
    }

    #[test]
    fn best_tracks_maximum() {
        let state = StreakState { current: 4, best: 4 };
        assert_eq!(state.after_practice(day(11), Some(day(10))), StreakState { current: 5, best: 5 });

        let state = StreakState { current: 2, best: 9 };
        assert_eq!(state.after_practice(day(11), Some(day(10))), StreakState { current: 3, best: 9 });
        assert_eq!(state.after_practice(day(20), Some(day(10))), StreakState { current: 1, best: 9 });
    }

    #[test]
    fn malformed_dates_are_ignored() {
        assert_eq!(parse_practice_date("2026-03-10"), Some(day(10)));
        assert_eq!(parse_practice_date("10/03/2026"), None);
        assert_eq!(parse_practice_date(""), None);
    }

    #[test]
    fn clock_parses() {
        assert_eq!("UTC".parse::<StreakClock>().unwrap(), StreakClock::Utc);
        assert_eq!("local".parse::<StreakClock>().unwrap(), StreakClock::Local);
        assert!("Asia/Almaty".parse::<StreakClock>().is_err());
    }
}

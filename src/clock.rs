//! Calendar clock abstraction.
//!
//! Every day/week boundary in the app comes through here so tests can pin
//! a fixed date instead of depending on the wall clock.

use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};

pub trait CalendarClock: Send + Sync {
    /// The current calendar date, UTC-midnight truncated.
    fn today(&self) -> NaiveDate;
}

/// Production clock backed by the system wall clock.
pub struct SystemClock;

impl CalendarClock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Fixed clock for tests.
pub struct FixedClock(pub NaiveDate);

impl CalendarClock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday() as u64;
    date - Days::new(back)
}

/// English weekday label used in prompts.
pub fn day_label(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2026-08-29 is a Saturday
        assert_eq!(week_start(d("2026-08-29")), d("2026-08-24"));
        // A Monday maps to itself
        assert_eq!(week_start(d("2026-08-24")), d("2026-08-24"));
        // Sunday still belongs to the preceding Monday's week
        assert_eq!(week_start(d("2026-08-30")), d("2026-08-24"));
    }

    #[test]
    fn test_weekend_flag() {
        assert!(is_weekend(d("2026-08-29")));
        assert!(is_weekend(d("2026-08-30")));
        assert!(!is_weekend(d("2026-08-28")));
    }

    #[test]
    fn test_day_label() {
        assert_eq!(day_label(d("2026-08-24")), "Monday");
        assert_eq!(day_label(d("2026-08-30")), "Sunday");
    }

    #[test]
    fn test_fixed_clock_returns_pinned_date() {
        let clock = FixedClock(d("2026-01-15"));
        assert_eq!(clock.today(), d("2026-01-15"));
    }
}

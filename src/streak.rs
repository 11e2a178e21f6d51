//! Streak calculation.
//!
//! A streak is the number of consecutive days, ending at yesterday, on
//! which the non-negotiable task was completed — plus today if today is
//! already marked done. Today is an extension of the streak rather than
//! part of the backward walk, so an unfinished today never breaks it.

use chrono::{Days, NaiveDate};

/// Count the current streak from completed streak-day dates.
///
/// `completed_desc` must contain only dates whose non-negotiable was
/// completed, sorted descending. Duplicate dates are tolerated.
pub fn current_streak(completed_desc: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut streak = 0u32;
    let mut cursor = today - Days::new(1);

    for &date in completed_desc {
        if date == today {
            streak += 1;
            continue;
        }
        if date > today {
            // Rows from a future date (clock skew) never count.
            continue;
        }
        if date == cursor {
            streak += 1;
            cursor = cursor - Days::new(1);
        } else if date < cursor {
            break;
        }
        // date between cursor and today can only be a duplicate of an
        // already-counted day; skip it.
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    const TODAY: &str = "2026-08-29";

    #[test]
    fn test_no_completed_days_is_zero() {
        assert_eq!(current_streak(&[], d(TODAY)), 0);
    }

    #[test]
    fn test_three_consecutive_days_including_today() {
        let rows = [d("2026-08-29"), d("2026-08-28"), d("2026-08-27")];
        assert_eq!(current_streak(&rows, d(TODAY)), 3);
    }

    #[test]
    fn test_today_not_done_does_not_break_streak() {
        let rows = [d("2026-08-28"), d("2026-08-27"), d("2026-08-26")];
        assert_eq!(current_streak(&rows, d(TODAY)), 3);
    }

    #[test]
    fn test_gap_stops_the_walk() {
        // Yesterday done, day-before-yesterday missing, three days ago done.
        let rows = [d("2026-08-28"), d("2026-08-26")];
        assert_eq!(current_streak(&rows, d(TODAY)), 1);
    }

    #[test]
    fn test_only_today_done() {
        assert_eq!(current_streak(&[d(TODAY)], d(TODAY)), 1);
    }

    #[test]
    fn test_only_old_rows_is_zero() {
        let rows = [d("2026-08-20"), d("2026-08-19")];
        assert_eq!(current_streak(&rows, d(TODAY)), 0);
    }

    #[test]
    fn test_today_plus_contiguous_run() {
        let rows = [d("2026-08-29"), d("2026-08-28")];
        assert_eq!(current_streak(&rows, d(TODAY)), 2);
    }

    #[test]
    fn test_future_rows_are_ignored() {
        let rows = [d("2026-09-01"), d("2026-08-28")];
        assert_eq!(current_streak(&rows, d(TODAY)), 1);
    }

    #[test]
    fn test_long_run() {
        let mut rows = Vec::new();
        for i in 1..=30u64 {
            rows.push(d(TODAY) - Days::new(i));
        }
        assert_eq!(current_streak(&rows, d(TODAY)), 30);
    }
}

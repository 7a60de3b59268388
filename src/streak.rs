//! Daily activity streak tracking.
//!
//! A streak counts consecutive UTC calendar days with at least one
//! qualifying activity. Same-day activity never double-counts; a gap of
//! more than one day restarts the count at 1.

use chrono::{DateTime, Timelike, Utc};

use crate::clock::days_between;
use crate::domain::StreakState;

/// Fold one activity timestamp into the streak. Pure: returns the new
/// state, never mutates.
pub fn record_activity(state: &StreakState, as_of: DateTime<Utc>) -> StreakState {
  let current_streak = match state.last_activity_at {
    None => 1,
    Some(last) => {
      // A clock that drifted backwards is treated as same-day activity
      let gap_days = days_between(last, as_of).max(0);
      match gap_days {
        0 => state.current_streak,
        1 => state.current_streak + 1,
        _ => {
          tracing::debug!(
            "Streak of {} broken after {} day gap",
            state.current_streak,
            gap_days
          );
          1
        }
      }
    }
  };

  StreakState {
    current_streak,
    longest_streak: state.longest_streak.max(current_streak),
    last_activity_at: Some(as_of),
  }
}

/// Advisory signal: an unbroken streak will lapse at midnight and the
/// learner has not shown up today, and the day is getting late (past
/// `risk_hour` in the engine's reference timezone). Never mutates state.
pub fn is_at_risk(state: &StreakState, as_of: DateTime<Utc>, risk_hour: u32) -> bool {
  let Some(last) = state.last_activity_at else {
    return false;
  };
  let gap_days = days_between(last, as_of);
  gap_days >= 1 && state.current_streak > 0 && as_of.hour() >= risk_hour
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone};

  fn d0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
  }

  fn state(current: u32, longest: u32, last: Option<DateTime<Utc>>) -> StreakState {
    StreakState {
      current_streak: current,
      longest_streak: longest,
      last_activity_at: last,
    }
  }

  #[test]
  fn test_first_activity_starts_streak() {
    let next = record_activity(&StreakState::new(), d0());
    assert_eq!(next.current_streak, 1);
    assert_eq!(next.longest_streak, 1);
    assert_eq!(next.last_activity_at, Some(d0()));
  }

  #[test]
  fn test_next_day_extends_streak() {
    // Scenario: streak of 5, activity the next day, then again same day
    let next = record_activity(&state(5, 5, Some(d0())), d0() + Duration::days(1));
    assert_eq!(next.current_streak, 6);
    assert_eq!(next.longest_streak, 6);

    let again = record_activity(&next, d0() + Duration::days(1) + Duration::hours(5));
    assert_eq!(again.current_streak, 6);
  }

  #[test]
  fn test_same_day_does_not_double_count() {
    let next = record_activity(&state(3, 7, Some(d0())), d0() + Duration::hours(8));
    assert_eq!(next.current_streak, 3);
    assert_eq!(next.longest_streak, 7);
  }

  #[test]
  fn test_gap_breaks_streak_but_keeps_longest() {
    // Scenario: streak of 5, three days of silence
    let next = record_activity(&state(5, 5, Some(d0())), d0() + Duration::days(3));
    assert_eq!(next.current_streak, 1);
    assert_eq!(next.longest_streak, 5);
  }

  #[test]
  fn test_any_multi_day_gap_restarts_at_one() {
    for gap in [2, 5, 30, 365] {
      let next = record_activity(&state(99, 99, Some(d0())), d0() + Duration::days(gap));
      assert_eq!(next.current_streak, 1, "gap of {} days", gap);
    }
  }

  #[test]
  fn test_midnight_boundary_counts_as_next_day() {
    let late = Utc.with_ymd_and_hms(2026, 3, 1, 23, 50, 0).unwrap();
    let early = Utc.with_ymd_and_hms(2026, 3, 2, 0, 10, 0).unwrap();
    let next = record_activity(&state(2, 2, Some(late)), early);
    assert_eq!(next.current_streak, 3);
  }

  #[test]
  fn test_longest_invariant_holds() {
    let mut streak = StreakState::new();
    let mut now = d0();
    for day in 0..10 {
      // Break the streak twice along the way
      let jump = if day == 4 || day == 7 { 3 } else { 1 };
      now = now + Duration::days(jump);
      streak = record_activity(&streak, now);
      assert!(streak.longest_streak >= streak.current_streak);
    }
  }

  #[test]
  fn test_at_risk_requires_evening_and_absence() {
    let yesterday = d0(); // 09:00
    let streak = state(4, 4, Some(yesterday));

    // Next day, before the risk hour
    let next_morning = d0() + Duration::days(1);
    assert!(!is_at_risk(&streak, next_morning, 18));

    // Next day, past the risk hour
    let next_evening = d0() + Duration::days(1) + Duration::hours(10);
    assert!(is_at_risk(&streak, next_evening, 18));
  }

  #[test]
  fn test_not_at_risk_after_activity_today() {
    let streak = state(4, 4, Some(d0()));
    let same_evening = d0() + Duration::hours(11); // 20:00 same day
    assert!(!is_at_risk(&streak, same_evening, 18));
  }

  #[test]
  fn test_not_at_risk_without_streak() {
    assert!(!is_at_risk(&StreakState::new(), d0(), 18));
    let broken = state(0, 6, Some(d0() - Duration::days(5)));
    assert!(!is_at_risk(&broken, d0() + Duration::hours(10), 18));
  }
}

//! Time source and day-boundary arithmetic.
//!
//! All day math uses UTC with a midnight boundary. The choice matters:
//! streak continuation and due buckets are defined in calendar days, so
//! every caller must agree on where a day starts. Business logic never
//! reads the wall clock directly; it goes through a [`ReviewClock`] so
//! tests (and hosts replaying history) can pin "now".

use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::cell::Cell;

pub trait ReviewClock {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time. The only place in the crate that touches `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ReviewClock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A pinned clock for tests and deterministic replay.
#[derive(Debug, Clone)]
pub struct FixedClock {
  now: Cell<DateTime<Utc>>,
}

impl FixedClock {
  pub fn new(now: DateTime<Utc>) -> Self {
    Self { now: Cell::new(now) }
  }

  pub fn set(&self, now: DateTime<Utc>) {
    self.now.set(now);
  }

  pub fn advance(&self, by: Duration) {
    self.now.set(self.now.get() + by);
  }
}

impl ReviewClock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.now.get()
  }
}

/// Midnight (UTC) of the day containing `t`.
pub fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
  t.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Calendar-day difference from `a` to `b` (UTC midnight boundary).
///
/// 23:59 to 00:01 the next day counts as 1 even though only two minutes
/// passed; that is the intended semantics for streaks and due buckets.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
  (b.date_naive() - a.date_naive()).num_days()
}

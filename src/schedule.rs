//! Review schedule projections.
//!
//! Pure functions over the current item set and a reference "now":
//! nothing here is stored, and recomputing is always safe.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::start_of_day;
use crate::domain::{Item, ReviewSchedule};

/// One day of the forward-looking review calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub due: usize,
}

/// Bucket the item set into disjoint due windows relative to `as_of`.
///
/// - `due_today`: due before tomorrow's midnight, overdue included
/// - `due_this_week`: due on days 1-6 after today
/// - `due_next_week`: due on days 7-13 after today
///
/// Items due further out fall into no bucket, so the three counts sum to
/// at most the item count.
pub fn due_buckets(items: &[&Item], as_of: DateTime<Utc>) -> ReviewSchedule {
    let start = start_of_day(as_of);
    let tomorrow = start + Duration::days(1);
    let week_end = start + Duration::days(7);
    let next_week_end = start + Duration::days(14);

    let mut schedule = ReviewSchedule::default();
    for item in items {
        let due = item.next_review_at;
        if due < tomorrow {
            schedule.due_today += 1;
        } else if due < week_end {
            schedule.due_this_week += 1;
        } else if due < next_week_end {
            schedule.due_next_week += 1;
        }
    }
    schedule
}

/// Per-day due counts for the next `days` days starting today. Overdue
/// items collapse into day 0, matching `due_buckets`'s today semantics.
pub fn review_calendar(items: &[&Item], as_of: DateTime<Utc>, days: u32) -> Vec<CalendarDay> {
    let start = start_of_day(as_of);
    let mut calendar: Vec<CalendarDay> = (0..days)
        .map(|offset| CalendarDay {
            date: (start + Duration::days(offset as i64)).date_naive(),
            due: 0,
        })
        .collect();

    for item in items {
        let offset = (item.next_review_at - start).num_days().max(0);
        if let Some(day) = calendar.get_mut(offset as usize) {
            day.due += 1;
        }
    }
    calendar
}

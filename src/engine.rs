//! The per-learner engine facade.
//!
//! One `LearnerEngine` owns a single learner's scheduling, progression,
//! and streak state, and exposes the host-facing contract: answer
//! events in, updated state and events out. All operations are
//! synchronous in-memory transformations; loading and persisting the
//! snapshot is the host's job, as is serializing answer events for the
//! same item (there is no internal locking and no answer dedup key).

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::clock::ReviewClock;
use crate::config::EngineConfig;
use crate::domain::{
  EngineEvent, Item, ProgressionState, ReviewPerformance, ReviewSchedule, StreakState,
};
use crate::error::EngineError;
use crate::progression::{xp_reward, ActivityKind, ProgressionLedger};
use crate::schedule::{due_buckets, review_calendar, CalendarDay};
use crate::srs::session::{order_session, RecentReview};
use crate::srs::ItemScheduler;
use crate::streak;

/// The full per-learner state the host loads before calling the engine
/// and persists after. The engine defines this shape but never touches
/// storage itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
  pub items: Vec<Item>,
  pub progression: ProgressionState,
  pub streak: StreakState,
  pub performance: ReviewPerformance,
}

/// What one answer event produced.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
  /// Updated item state.
  pub item: Item,
  pub was_correct: bool,
  /// Caller-supplied confidence, clamped to [0, 1]; 0.5 when absent.
  pub confidence: f64,
  pub xp_awarded: u64,
  /// Level-up and mastery events for the host's notification layer.
  pub events: Vec<EngineEvent>,
}

pub struct LearnerEngine<C: ReviewClock> {
  config: EngineConfig,
  clock: C,
  scheduler: ItemScheduler,
  progression: ProgressionLedger,
  streak: StreakState,
  performance: ReviewPerformance,
  last_event_at: Option<DateTime<Utc>>,
}

impl<C: ReviewClock> LearnerEngine<C> {
  /// Fresh learner. The configuration is validated here; a bad config
  /// never constructs an engine.
  pub fn new(config: EngineConfig, clock: C) -> Result<Self, EngineError> {
    config.validate()?;
    let progression = ProgressionLedger::new(&config);
    Ok(Self {
      config,
      clock,
      scheduler: ItemScheduler::new(),
      progression,
      streak: StreakState::new(),
      performance: ReviewPerformance::default(),
      last_event_at: None,
    })
  }

  /// Resume a learner from persisted state.
  pub fn from_snapshot(
    config: EngineConfig,
    clock: C,
    snapshot: EngineSnapshot,
  ) -> Result<Self, EngineError> {
    config.validate()?;
    let progression = ProgressionLedger::from_state(snapshot.progression, &config);
    Ok(Self {
      scheduler: ItemScheduler::from_items(snapshot.items),
      progression,
      streak: snapshot.streak,
      performance: snapshot.performance,
      config,
      clock,
      last_event_at: None,
    })
  }

  pub fn snapshot(&self) -> EngineSnapshot {
    EngineSnapshot {
      items: self.scheduler.items().cloned().collect(),
      progression: self.progression.state().clone(),
      streak: self.streak.clone(),
      performance: self.performance.clone(),
    }
  }

  pub fn clock(&self) -> &C {
    &self.clock
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Read the clock for a state mutation, rejecting a clock that runs
  /// backwards relative to the last applied event.
  fn observe_now(&mut self) -> Result<DateTime<Utc>, EngineError> {
    let now = self.clock.now();
    if let Some(last_seen) = self.last_event_at {
      if now < last_seen {
        return Err(EngineError::InvalidTimestamp { now, last_seen });
      }
    }
    self.last_event_at = Some(now);
    Ok(now)
  }

  /// Bring an item into the study set, due immediately. Idempotent for
  /// already-known ids.
  pub fn add_item(&mut self, item_id: &str) -> Result<Item, EngineError> {
    let now = self.observe_now()?;
    Ok(self.scheduler.add_item(item_id, now).clone())
  }

  /// Apply one answer event: scheduling, lifetime counters, XP, and the
  /// daily streak all advance together, and any level-up or mastery
  /// transition comes back as events.
  ///
  /// Callers must invoke this at most once per logical answer; a retry
  /// of the same answer counts twice.
  pub fn record_answer(
    &mut self,
    item_id: &str,
    correct: bool,
    confidence: Option<f64>,
  ) -> Result<AnswerOutcome, EngineError> {
    let now = self.observe_now()?;
    let record = self.scheduler.record_answer(item_id, correct, now, &self.config)?;

    self.performance.total_reviews += 1;
    if correct {
      self.performance.correct_reviews += 1;
    }

    let xp = xp_reward(ActivityKind::Review, record.item.difficulty(), correct);
    let mut events = self
      .progression
      .award_xp(xp as i64, ActivityKind::Review.as_str(), &self.config)?;

    self.streak = streak::record_activity(&self.streak, now);
    self.performance.streak_days = self.streak.current_streak;

    if record.newly_mastered {
      events.push(EngineEvent::ItemMastered {
        item_id: record.item.id.clone(),
      });
    }

    Ok(AnswerOutcome {
      item: record.item,
      was_correct: correct,
      confidence: confidence.unwrap_or(0.5).clamp(0.0, 1.0),
      xp_awarded: xp,
      events,
    })
  }

  /// Count a qualifying activity toward the daily streak without going
  /// through an answer (e.g. a listening session).
  pub fn record_activity(&mut self) -> Result<StreakState, EngineError> {
    let now = self.observe_now()?;
    self.streak = streak::record_activity(&self.streak, now);
    self.performance.streak_days = self.streak.current_streak;
    Ok(self.streak.clone())
  }

  /// Host-initiated XP award (session bonuses and the like).
  pub fn award_xp(&mut self, amount: i64, reason: &str) -> Result<Vec<EngineEvent>, EngineError> {
    self.progression.award_xp(amount, reason, &self.config)
  }

  pub fn due_items(&self) -> Vec<&Item> {
    self.scheduler.due_items(self.clock.now())
  }

  pub fn schedule(&self) -> ReviewSchedule {
    let items: Vec<&Item> = self.scheduler.items().collect();
    due_buckets(&items, self.clock.now())
  }

  pub fn calendar(&self, days: u32) -> Vec<CalendarDay> {
    let items: Vec<&Item> = self.scheduler.items().collect();
    review_calendar(&items, self.clock.now(), days)
  }

  /// Session ordering over the currently due set; advisory, leaves all
  /// due dates untouched.
  pub fn session_order(
    &self,
    recent: &HashMap<String, Vec<RecentReview>>,
    rng: &mut impl Rng,
  ) -> Vec<String> {
    let now = self.clock.now();
    order_session(&self.scheduler.due_items(now), recent, now, rng)
  }

  pub fn is_mastered(&self, item_id: &str) -> Result<bool, EngineError> {
    self.scheduler.is_mastered(item_id)
  }

  pub fn reset_item(&mut self, item_id: &str) -> Result<Item, EngineError> {
    let now = self.observe_now()?;
    Ok(self.scheduler.reset_item(item_id, now)?.clone())
  }

  /// Advisory streak-at-risk probe for the host's notification layer.
  pub fn streak_at_risk(&self) -> bool {
    streak::is_at_risk(&self.streak, self.clock.now(), self.config.risk_hour)
  }

  pub fn performance(&self) -> &ReviewPerformance {
    &self.performance
  }

  pub fn progression(&self) -> &ProgressionState {
    self.progression.state()
  }

  pub fn streak(&self) -> &StreakState {
    &self.streak
  }

  pub fn item(&self, item_id: &str) -> Option<&Item> {
    self.scheduler.get(item_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::FixedClock;
  use chrono::{Duration, TimeZone};

  fn d0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
  }

  fn engine() -> LearnerEngine<FixedClock> {
    LearnerEngine::new(EngineConfig::default(), FixedClock::new(d0())).unwrap()
  }

  #[test]
  fn test_bad_config_never_constructs() {
    let config = EngineConfig {
      risk_hour: 99,
      ..EngineConfig::default()
    };
    assert!(LearnerEngine::new(config, FixedClock::new(d0())).is_err());
  }

  #[test]
  fn test_answer_flow_updates_everything() {
    let mut engine = engine();
    engine.add_item("a").unwrap();

    let outcome = engine.record_answer("a", true, None).unwrap();
    assert!(outcome.was_correct);
    assert_eq!(outcome.confidence, 0.5);
    assert_eq!(outcome.xp_awarded, 10); // review, normal difficulty
    assert!(outcome.item.next_review_at > d0());

    assert_eq!(engine.performance().total_reviews, 1);
    assert_eq!(engine.performance().correct_reviews, 1);
    assert_eq!(engine.progression().xp, 10);
    assert_eq!(engine.streak().current_streak, 1);
  }

  #[test]
  fn test_confidence_clamped() {
    let mut engine = engine();
    engine.add_item("a").unwrap();
    let outcome = engine.record_answer("a", true, Some(3.5)).unwrap();
    assert_eq!(outcome.confidence, 1.0);
  }

  #[test]
  fn test_unknown_item_surfaces() {
    let mut engine = engine();
    assert!(matches!(
      engine.record_answer("ghost", true, None),
      Err(EngineError::ItemNotFound(_))
    ));
  }

  #[test]
  fn test_incorrect_answer_still_counts_activity() {
    let mut engine = engine();
    engine.add_item("a").unwrap();
    let outcome = engine.record_answer("a", false, None).unwrap();

    assert!(outcome.xp_awarded > 0); // partial credit
    assert!(outcome.xp_awarded < 10);
    assert_eq!(engine.performance().correct_reviews, 0);
    assert_eq!(engine.streak().current_streak, 1);
  }

  #[test]
  fn test_mastery_event_emitted() {
    let mut engine = engine();
    engine.add_item("a").unwrap();

    let mut saw_mastery = false;
    for _ in 0..12 {
      let outcome = engine.record_answer("a", true, None).unwrap();
      let clock_target = outcome.item.next_review_at;
      engine.clock().set(clock_target);
      if outcome
        .events
        .iter()
        .any(|e| matches!(e, EngineEvent::ItemMastered { item_id } if item_id == "a"))
      {
        saw_mastery = true;
        break;
      }
    }
    assert!(saw_mastery);
    assert!(engine.is_mastered("a").unwrap());
  }

  #[test]
  fn test_level_up_event_from_reviews() {
    let mut engine = engine();
    for i in 0..12 {
      engine.add_item(&format!("i{}", i)).unwrap();
    }

    let mut level_ups = 0;
    for i in 0..12 {
      let outcome = engine
        .record_answer(&format!("i{}", i), true, None)
        .unwrap();
      level_ups += outcome
        .events
        .iter()
        .filter(|e| matches!(e, EngineEvent::LevelUp { .. }))
        .count();
    }

    // 12 reviews x 10 XP crosses the 100 XP boundary exactly once
    assert_eq!(engine.progression().xp, 120);
    assert_eq!(engine.progression().level, 1);
    assert_eq!(level_ups, 1);
  }

  #[test]
  fn test_award_xp_rejects_negative() {
    let mut engine = engine();
    assert!(matches!(
      engine.award_xp(-10, "oops"),
      Err(EngineError::InvalidXpAmount(-10))
    ));
  }

  #[test]
  fn test_streak_across_days() {
    let mut engine = engine();
    engine.add_item("a").unwrap();

    engine.record_answer("a", true, None).unwrap();
    assert_eq!(engine.streak().current_streak, 1);

    engine.clock().set(d0() + Duration::days(1));
    engine.record_activity().unwrap();
    assert_eq!(engine.streak().current_streak, 2);

    engine.clock().set(d0() + Duration::days(4));
    engine.record_activity().unwrap();
    assert_eq!(engine.streak().current_streak, 1);
    assert_eq!(engine.streak().longest_streak, 2);
  }

  #[test]
  fn test_streak_at_risk_probe() {
    let mut engine = engine();
    engine.record_activity().unwrap();
    assert!(!engine.streak_at_risk());

    // Next evening, past the default risk hour, no activity yet today
    engine.clock().set(d0() + Duration::days(1) + Duration::hours(10));
    assert!(engine.streak_at_risk());
  }

  #[test]
  fn test_backwards_clock_rejected() {
    let mut engine = engine();
    engine.add_item("a").unwrap();
    engine.record_answer("a", true, None).unwrap();

    engine.clock().set(d0() - Duration::hours(1));
    assert!(matches!(
      engine.record_answer("a", false, None),
      Err(EngineError::InvalidTimestamp { .. })
    ));

    // Queries still work with a bad clock; only mutations are guarded
    let _ = engine.schedule();
  }

  #[test]
  fn test_schedule_and_calendar() {
    let mut engine = engine();
    engine.add_item("a").unwrap();
    engine.add_item("b").unwrap();
    engine.record_answer("a", true, None).unwrap();

    let schedule = engine.schedule();
    assert_eq!(schedule.due_today, 1); // "b" still due now
    let calendar = engine.calendar(14);
    let total: usize = calendar.iter().map(|d| d.due).sum();
    assert_eq!(total, 2);
  }

  #[test]
  fn test_session_order_covers_due_set() {
    let mut engine = engine();
    for id in ["a", "b", "c"] {
      engine.add_item(id).unwrap();
    }
    let mut rng = rand::rng();
    let mut order = engine.session_order(&HashMap::new(), &mut rng);
    order.sort();
    assert_eq!(order, vec!["a", "b", "c"]);
  }

  #[test]
  fn test_snapshot_round_trip() {
    let mut engine = engine();
    engine.add_item("a").unwrap();
    engine.add_item("b").unwrap();
    engine.record_answer("a", true, Some(0.9)).unwrap();
    engine.award_xp(200, "session_complete").unwrap();

    let json = serde_json::to_string(&engine.snapshot()).unwrap();
    let snapshot: EngineSnapshot = serde_json::from_str(&json).unwrap();

    let restored =
      LearnerEngine::from_snapshot(EngineConfig::default(), FixedClock::new(d0()), snapshot)
        .unwrap();
    assert_eq!(restored.progression().xp, engine.progression().xp);
    assert_eq!(restored.progression().level, engine.progression().level);
    assert_eq!(restored.performance(), engine.performance());
    assert_eq!(
      restored.item("a").unwrap().consecutive_correct,
      engine.item("a").unwrap().consecutive_correct
    );
  }

  #[test]
  fn test_from_snapshot_rederives_level_from_table() {
    let snapshot = EngineSnapshot {
      items: Vec::new(),
      progression: ProgressionState {
        xp: 300,
        level: 0,
        level_title: "Novice".to_string(),
      },
      streak: StreakState::new(),
      performance: ReviewPerformance::default(),
    };
    let engine =
      LearnerEngine::from_snapshot(EngineConfig::default(), FixedClock::new(d0()), snapshot)
        .unwrap();
    assert_eq!(engine.progression().level, 2);
    assert_eq!(engine.progression().level_title, "Student");
  }
}

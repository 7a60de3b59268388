use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated experience and the level derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
  pub xp: u64,
  pub level: usize,
  pub level_title: String,
}

impl ProgressionState {
  pub fn new(first_title: impl Into<String>) -> Self {
    Self {
      xp: 0,
      level: 0,
      level_title: first_title.into(),
    }
  }
}

/// Daily activity streak. `longest_streak >= current_streak` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakState {
  pub current_streak: u32,
  pub longest_streak: u32,
  pub last_activity_at: Option<DateTime<Utc>>,
}

impl StreakState {
  pub fn new() -> Self {
    Self {
      current_streak: 0,
      longest_streak: 0,
      last_activity_at: None,
    }
  }
}

impl Default for StreakState {
  fn default() -> Self {
    Self::new()
  }
}

/// Lifetime review counters. The counters only grow; the ratios are
/// computed on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewPerformance {
  pub total_reviews: u64,
  pub correct_reviews: u64,
  pub streak_days: u32,
}

impl ReviewPerformance {
  /// Share of correct answers, as a percentage.
  pub fn efficiency(&self) -> f64 {
    if self.total_reviews > 0 {
      self.correct_reviews as f64 / self.total_reviews as f64 * 100.0
    } else {
      0.0
    }
  }
}

/// Due-item counts bucketed by horizon. A pure projection over the item
/// set; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSchedule {
  pub due_today: usize,
  pub due_this_week: usize,
  pub due_next_week: usize,
}

/// Events raised for the host's notification/UI collaborators. The engine
/// never consumes these itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
  LevelUp { new_level: usize, title: String },
  ItemMastered { item_id: String },
  StreakAtRisk,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_efficiency_empty() {
    let perf = ReviewPerformance::default();
    assert_eq!(perf.efficiency(), 0.0);
  }

  #[test]
  fn test_efficiency_ratio() {
    let perf = ReviewPerformance {
      total_reviews: 8,
      correct_reviews: 6,
      streak_days: 0,
    };
    assert!((perf.efficiency() - 75.0).abs() < 1e-9);
  }

  #[test]
  fn test_streak_state_new() {
    let streak = StreakState::new();
    assert_eq!(streak.current_streak, 0);
    assert_eq!(streak.longest_streak, 0);
    assert!(streak.last_activity_at.is_none());
  }

  #[test]
  fn test_event_serde_shape() {
    // Tagged snake_case wire format consumed by the host
    let event = EngineEvent::LevelUp {
      new_level: 2,
      title: "Student".to_string(),
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"level_up\""));
    assert!(json.contains("\"new_level\":2"));

    let back: EngineEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
  }

  #[test]
  fn test_streak_at_risk_event_is_bare() {
    let json = serde_json::to_string(&EngineEvent::StreakAtRisk).unwrap();
    assert_eq!(json, "{\"type\":\"streak_at_risk\"}");
  }

  #[test]
  fn test_mastered_event_carries_item_id() {
    let event = EngineEvent::ItemMastered {
      item_id: "vocab-7".to_string(),
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("item_mastered"));
    assert!(json.contains("vocab-7"));
  }
}

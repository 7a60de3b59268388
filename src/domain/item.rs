use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::srs::ease::{ease_to_level, EASE_START};

/// Where an item sits in its learning lifecycle. Derived from review
/// history and level, never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemPhase {
  New,
  Learning,
  Reviewing,
  Mastered,
}

impl ItemPhase {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "new" => Some(Self::New),
      "learning" => Some(Self::Learning),
      "reviewing" => Some(Self::Reviewing),
      "mastered" => Some(Self::Mastered),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::New => "new",
      Self::Learning => "learning",
      Self::Reviewing => "reviewing",
      Self::Mastered => "mastered",
    }
  }
}

/// How demanding an item currently is, read off its ease factor. Feeds
/// the XP reward multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemDifficulty {
  Easy,
  Normal,
  Hard,
}

impl ItemDifficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Easy => "easy",
      Self::Normal => "normal",
      Self::Hard => "hard",
    }
  }
}

/// Per-item review state, owned by exactly one learner.
///
/// Mutated only through the scheduler; everything else reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
  pub id: String,
  pub ease_factor: f64,
  pub consecutive_correct: u32,
  pub next_review_at: DateTime<Utc>,
  /// Projection of the ease factor onto 0-5, see `srs::ease::ease_to_level`.
  pub level: u8,
  /// Set when level 5 is reached on a correct answer; cleared by any
  /// incorrect answer or an explicit reset.
  pub mastered: bool,
  pub total_reviews: u32,
  pub correct_reviews: u32,
}

impl Item {
  /// A freshly added item: default ease, no streak, due immediately.
  pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
    Self {
      id: id.into(),
      ease_factor: EASE_START,
      consecutive_correct: 0,
      next_review_at: now,
      level: ease_to_level(EASE_START),
      mastered: false,
      total_reviews: 0,
      correct_reviews: 0,
    }
  }

  pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
    self.next_review_at <= as_of
  }

  pub fn phase(&self) -> ItemPhase {
    if self.total_reviews == 0 {
      ItemPhase::New
    } else if self.mastered {
      ItemPhase::Mastered
    } else if self.level >= 3 {
      ItemPhase::Reviewing
    } else {
      ItemPhase::Learning
    }
  }

  pub fn difficulty(&self) -> ItemDifficulty {
    if self.ease_factor < 2.0 {
      ItemDifficulty::Hard
    } else if self.ease_factor < 3.0 {
      ItemDifficulty::Normal
    } else {
      ItemDifficulty::Easy
    }
  }
}

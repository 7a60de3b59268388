//! Ease-factor state transition for a single item.
//!
//! SM-2 family: correct answers nudge the ease factor up by a step that
//! grows with the correct streak, one miss knocks it down by more than
//! any single step gains. The ease factor alone determines the review
//! interval and the 0-5 level.

use crate::config::EngineConfig;

/// Ease factor assigned to an item entering the study set.
pub const EASE_START: f64 = 2.5;

/// Fixed cost of an incorrect answer. Strictly larger than any value
/// `streak_bonus` can return: one mistake outweighs one success.
const LAPSE_PENALTY: f64 = 0.3;

/// Ease increment for the `streak`-th consecutive correct answer.
/// Non-decreasing in streak length, capped.
fn streak_bonus(streak: u32) -> f64 {
  match streak {
    0 => 0.0,
    1 => 0.1,
    2..=3 => 0.12,
    4..=6 => 0.15,
    _ => 0.2,
  }
}

/// Project an ease factor onto the 0-5 level scale.
///
/// `level = clamp(floor(ease * 2 - 2), 0, 5)`: the floor ease of 1.3
/// gives level 0, the starting ease of 2.5 gives level 3, and anything
/// from 3.5 up saturates at level 5. Mastery is keyed off this projection,
/// so the formula is part of the engine's contract.
pub fn ease_to_level(ease: f64) -> u8 {
  (ease * 2.0 - 2.0).floor().clamp(0.0, 5.0) as u8
}

pub struct ReviewTransition {
  pub ease_factor: f64,
  pub consecutive_correct: u32,
  pub interval_days: i64,
  pub level: u8,
}

/// Compute the post-answer state for one item.
///
/// Never fails: pathological inputs (NaN ease, out-of-range values) are
/// coerced into the valid domain before the update, and the result is
/// always within `[ease_floor, ease_ceiling]`.
pub fn calculate_review(
  correct: bool,
  prior_ease: f64,
  prior_consecutive_correct: u32,
  config: &EngineConfig,
) -> ReviewTransition {
  let prior = if prior_ease.is_finite() {
    prior_ease.clamp(config.ease_floor, config.ease_ceiling)
  } else {
    EASE_START
  };

  let (ease_factor, consecutive_correct) = if correct {
    let streak = prior_consecutive_correct.saturating_add(1);
    let ease = (prior + streak_bonus(streak)).clamp(config.ease_floor, config.ease_ceiling);
    (ease, streak)
  } else {
    ((prior - LAPSE_PENALTY).max(config.ease_floor), 0)
  };

  ReviewTransition {
    ease_factor,
    consecutive_correct,
    interval_days: config.base_interval(ease_factor),
    level: ease_to_level(ease_factor),
  }
}

//! Per-learner item scheduling.
//!
//! The scheduler owns every item's review state and is the only writer.
//! Callers must serialize answer events for the same item and guarantee
//! at-most-once delivery per logical answer: there is no dedup key here,
//! so replaying an answer applies the ease transition again.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::domain::Item;
use crate::error::EngineError;
use crate::srs::ease;

/// Outcome of applying one answer to one item.
pub struct AnswerRecord {
  /// The item's state after the transition.
  pub item: Item,
  /// True when this answer pushed the item into mastery.
  pub newly_mastered: bool,
}

#[derive(Debug, Default)]
pub struct ItemScheduler {
  items: BTreeMap<String, Item>,
}

impl ItemScheduler {
  pub fn new() -> Self {
    Self::default()
  }

  /// Rebuild from persisted state (the host's load path).
  pub fn from_items(items: Vec<Item>) -> Self {
    Self {
      items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
    }
  }

  /// Register an item entering the study set. Adding an id that already
  /// exists keeps the existing review state untouched.
  pub fn add_item(&mut self, id: &str, now: DateTime<Utc>) -> &Item {
    if self.items.contains_key(id) {
      tracing::debug!("Item {} already scheduled, keeping state", id);
    } else {
      self.items.insert(id.to_string(), Item::new(id, now));
    }
    &self.items[id]
  }

  /// Apply one answer event. The ease transition runs exactly once per
  /// call; `now` becomes the base for the next review interval.
  pub fn record_answer(
    &mut self,
    item_id: &str,
    correct: bool,
    now: DateTime<Utc>,
    config: &EngineConfig,
  ) -> Result<AnswerRecord, EngineError> {
    let item = self
      .items
      .get_mut(item_id)
      .ok_or_else(|| EngineError::ItemNotFound(item_id.to_string()))?;

    let transition =
      ease::calculate_review(correct, item.ease_factor, item.consecutive_correct, config);

    item.ease_factor = transition.ease_factor;
    item.consecutive_correct = transition.consecutive_correct;
    item.level = transition.level;
    item.next_review_at = now + Duration::days(transition.interval_days);
    item.total_reviews = item.total_reviews.saturating_add(1);
    if correct {
      item.correct_reviews = item.correct_reviews.saturating_add(1);
    }

    let was_mastered = item.mastered;
    if correct && item.level == 5 {
      item.mastered = true;
    } else if !correct {
      // A lapse drops the item out of mastery; level is already
      // recomputed from the reduced ease.
      item.mastered = false;
    }
    let newly_mastered = item.mastered && !was_mastered;

    if newly_mastered {
      tracing::info!("Item {} mastered", item_id);
    } else if was_mastered && !item.mastered {
      tracing::info!("Item {} dropped out of mastery", item_id);
    }

    Ok(AnswerRecord {
      item: item.clone(),
      newly_mastered,
    })
  }

  /// All items due at `as_of`, ordered by `(next_review_at, id)` ascending.
  /// The ordering is part of the contract: hosts rely on it being stable.
  pub fn due_items(&self, as_of: DateTime<Utc>) -> Vec<&Item> {
    let mut due: Vec<&Item> = self.items.values().filter(|i| i.is_due(as_of)).collect();
    due.sort_by(|a, b| {
      a.next_review_at
        .cmp(&b.next_review_at)
        .then_with(|| a.id.cmp(&b.id))
    });
    due
  }

  pub fn is_mastered(&self, item_id: &str) -> Result<bool, EngineError> {
    self
      .items
      .get(item_id)
      .map(|i| i.mastered)
      .ok_or_else(|| EngineError::ItemNotFound(item_id.to_string()))
  }

  /// Explicit reset: back to a fresh item, due immediately. The only way
  /// besides a lapse to clear the mastered flag.
  pub fn reset_item(&mut self, item_id: &str, now: DateTime<Utc>) -> Result<&Item, EngineError> {
    let item = self
      .items
      .get_mut(item_id)
      .ok_or_else(|| EngineError::ItemNotFound(item_id.to_string()))?;
    *item = Item::new(item_id, now);
    tracing::info!("Item {} reset", item_id);
    Ok(item)
  }

  pub fn get(&self, item_id: &str) -> Option<&Item> {
    self.items.get(item_id)
  }

  pub fn items(&self) -> impl Iterator<Item = &Item> {
    self.items.values()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

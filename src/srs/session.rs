//! Session ordering for due items.
//!
//! Re-weights and reorders a learner's due set using recent per-item
//! performance. Purely advisory: due dates and scheduler state are never
//! touched. Weights favor:
//! - items with lower success rates
//! - items that were recently failed (reinforcement)
//! - items that haven't been reviewed much
//! - items that haven't been seen in a while

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::{HashMap, VecDeque};

use crate::domain::Item;

/// One recent review observation for an item, supplied by the host's
/// analytics collaborator.
#[derive(Debug, Clone)]
pub struct RecentReview {
  pub reviewed_at: DateTime<Utc>,
  pub was_correct: bool,
}

/// An item with its calculated selection weight.
#[derive(Debug, Clone)]
pub struct ItemWeight {
  pub item_id: String,
  pub weight: f64,
}

/// Failed items queue up here and resurface a few cards later.
#[derive(Debug, Clone, Default)]
pub struct ReinforcementQueue {
  queue: VecDeque<String>,
  items_since_reinforce: u32,
  pub last_item_id: Option<String>,
}

impl ReinforcementQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_failed(&mut self, item_id: &str) {
    if !self.queue.iter().any(|id| id == item_id) {
      self.queue.push_back(item_id.to_string());
    }
  }

  /// Drop an item from the queue (answered correctly elsewhere).
  pub fn remove(&mut self, item_id: &str) {
    self.queue.retain(|id| id != item_id);
  }

  pub fn should_resurface(&self) -> bool {
    !self.queue.is_empty() && self.items_since_reinforce >= 3
  }

  pub fn pop(&mut self) -> Option<String> {
    if self.should_resurface() {
      self.items_since_reinforce = 0;
      self.queue.pop_front()
    } else {
      None
    }
  }

  pub fn note_shown(&mut self, item_id: &str) {
    self.items_since_reinforce += 1;
    self.last_item_id = Some(item_id.to_string());
  }

  pub fn is_empty(&self) -> bool {
    self.queue.is_empty()
  }
}

/// Selection weight for one item given its counters and recent history.
pub fn item_weight(item: &Item, recent: &[RecentReview], as_of: DateTime<Utc>) -> f64 {
  let mut weight = 1.0;

  // Factor 1: success rate (lower success = higher weight), 1.0 to 2.0
  let success_rate = if item.total_reviews > 0 {
    item.correct_reviews as f64 / item.total_reviews as f64
  } else {
    0.5 // new items get neutral weight
  };
  weight *= 2.0 - success_rate;

  // Factor 2: recency of last failure
  if let Some(last_fail) = recent.iter().filter(|r| !r.was_correct).last() {
    let minutes_since_fail = (as_of - last_fail.reviewed_at).num_minutes();
    if minutes_since_fail < 5 {
      weight *= 10.0;
    } else if minutes_since_fail < 30 {
      weight *= 3.0;
    } else if minutes_since_fail < 60 {
      weight *= 1.5;
    }
  }

  // Factor 3: review count (less reviewed = higher weight)
  if item.total_reviews == 0 {
    weight *= 2.0;
  } else if item.total_reviews < 3 {
    weight *= 1.5;
  } else if item.total_reviews < 5 {
    weight *= 1.2;
  }

  // Factor 4: time since last seen (staler = slightly higher, up to 2x)
  if let Some(last) = recent.last() {
    let hours_since = (as_of - last.reviewed_at).num_hours();
    weight *= 1.0 + (hours_since as f64 * 0.1).min(1.0);
  } else {
    weight *= 1.5;
  }

  weight
}

/// Weighted random selection. Higher weight = more likely. `exclude`
/// keeps the same item from coming up twice in a row.
pub fn weighted_select(
  weights: &[ItemWeight],
  exclude: Option<&str>,
  rng: &mut impl Rng,
) -> Option<String> {
  let available: Vec<_> = weights
    .iter()
    .filter(|w| exclude.map_or(true, |id| w.item_id != id))
    .collect();

  if available.is_empty() {
    return None;
  }
  if available.len() == 1 {
    return Some(available[0].item_id.clone());
  }

  let total_weight: f64 = available.iter().map(|w| w.weight).sum();
  if total_weight <= 0.0 {
    // Degenerate weights: fall back to uniform
    let idx = rng.random_range(0..available.len());
    return Some(available[idx].item_id.clone());
  }

  let mut target = rng.random_range(0.0..total_weight);
  for w in &available {
    target -= w.weight;
    if target <= 0.0 {
      return Some(w.item_id.clone());
    }
  }

  available.last().map(|w| w.item_id.clone())
}

/// Produce a full session ordering of the due set: weighted sampling
/// without replacement, so high-weight items cluster early but the whole
/// set is always covered.
pub fn order_session(
  due: &[&Item],
  recent: &HashMap<String, Vec<RecentReview>>,
  as_of: DateTime<Utc>,
  rng: &mut impl Rng,
) -> Vec<String> {
  let mut weights: Vec<ItemWeight> = due
    .iter()
    .map(|item| ItemWeight {
      item_id: item.id.clone(),
      weight: item_weight(
        item,
        recent.get(&item.id).map(|r| r.as_slice()).unwrap_or(&[]),
        as_of,
      ),
    })
    .collect();

  let mut order = Vec::with_capacity(weights.len());
  while let Some(picked) = weighted_select(&weights, None, rng) {
    weights.retain(|w| w.item_id != picked);
    order.push(picked);
  }
  order
}

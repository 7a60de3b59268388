//! Experience points and level progression.
//!
//! XP only ever increases, and the level is a table lookup, never a
//! formula: boundaries must stay stable across releases.

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, LevelBand};
use crate::domain::{EngineEvent, ItemDifficulty, ProgressionState};
use crate::error::EngineError;

// ==================== XP reward tables ====================

/// Multiplier applied when the answer was wrong: showing up still earns
/// a sliver of credit.
pub const PARTIAL_CREDIT_FACTOR: f64 = 0.25;

/// What a learner did to earn XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Review,
    SessionComplete,
    LessonComplete,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::SessionComplete => "session_complete",
            Self::LessonComplete => "lesson_complete",
        }
    }

    fn base_xp(&self) -> u64 {
        match self {
            Self::Review => 10,
            Self::SessionComplete => 25,
            Self::LessonComplete => 50,
        }
    }
}

fn difficulty_multiplier(difficulty: ItemDifficulty) -> f64 {
    match difficulty {
        ItemDifficulty::Easy => 0.8,
        ItemDifficulty::Normal => 1.0,
        ItemDifficulty::Hard => 1.3,
    }
}

/// XP earned for one activity: `base * difficulty * credit`, rounded to
/// the nearest point. Pure lookup, no state.
pub fn xp_reward(activity: ActivityKind, difficulty: ItemDifficulty, was_correct: bool) -> u64 {
    let credit = if was_correct { 1.0 } else { PARTIAL_CREDIT_FACTOR };
    let raw = activity.base_xp() as f64 * difficulty_multiplier(difficulty) * credit;
    raw.round().max(0.0) as u64
}

// ==================== Level lookup ====================

/// Index of the band `xp` falls into: the highest band whose `min_xp`
/// does not exceed `xp`. The table is validated non-empty and ascending.
pub fn level_for(xp: u64, table: &[LevelBand]) -> usize {
    table
        .iter()
        .rposition(|band| band.min_xp <= xp)
        .unwrap_or(0)
}

// ==================== Ledger ====================

#[derive(Debug, Clone)]
pub struct ProgressionLedger {
    state: ProgressionState,
}

impl ProgressionLedger {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: ProgressionState::new(config.level_table[0].title.clone()),
        }
    }

    /// Resume from persisted state. Level and title are re-derived from
    /// XP so a stale snapshot cannot disagree with the table.
    pub fn from_state(state: ProgressionState, config: &EngineConfig) -> Self {
        let level = level_for(state.xp, &config.level_table);
        Self {
            state: ProgressionState {
                xp: state.xp,
                level,
                level_title: config.level_table[level].title.clone(),
            },
        }
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    /// Add XP and re-derive the level. Emits a single `LevelUp` carrying
    /// the final level when the award crosses one or more boundaries.
    pub fn award_xp(
        &mut self,
        amount: i64,
        reason: &str,
        config: &EngineConfig,
    ) -> Result<Vec<EngineEvent>, EngineError> {
        if amount < 0 {
            return Err(EngineError::InvalidXpAmount(amount));
        }

        self.state.xp = self.state.xp.saturating_add(amount as u64);
        let new_level = level_for(self.state.xp, &config.level_table);

        let mut events = Vec::new();
        if new_level > self.state.level {
            let title = config.level_table[new_level].title.clone();
            tracing::info!(
                "Level up to {} ({}) at {} XP via {}",
                new_level,
                title,
                self.state.xp,
                reason
            );
            events.push(EngineEvent::LevelUp {
                new_level,
                title: title.clone(),
            });
            self.state.level = new_level;
            self.state.level_title = title;
        } else {
            tracing::debug!("Awarded {} XP via {}, total {}", amount, reason, self.state.xp);
        }

        Ok(events)
    }
}

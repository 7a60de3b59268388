pub mod item;
pub mod progress;

pub use item::{Item, ItemDifficulty, ItemPhase};
pub use progress::{
  EngineEvent, ProgressionState, ReviewPerformance, ReviewSchedule, StreakState,
};

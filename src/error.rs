//! Engine error taxonomy.
//!
//! Everything not listed here is defensively normalized instead of
//! rejected: out-of-range ease values are clamped, a missing confidence
//! defaults to neutral, a missing last-activity timestamp means "never
//! active". All variants are recoverable by the host.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Unknown item id passed to a scheduler operation. Hosts should treat
    /// this as a data-integrity signal (likely a sync bug), not a user error.
    ItemNotFound(String),
    /// Negative XP award.
    InvalidXpAmount(i64),
    /// The clock went backwards relative to the last applied event.
    InvalidTimestamp {
        now: DateTime<Utc>,
        last_seen: DateTime<Utc>,
    },
    /// Configuration rejected at construction time.
    InvalidConfig(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::ItemNotFound(id) => write!(f, "Unknown item: {}", id),
            EngineError::InvalidXpAmount(amount) => {
                write!(f, "XP award must be non-negative, got {}", amount)
            }
            EngineError::InvalidTimestamp { now, last_seen } => write!(
                f,
                "Non-monotonic clock: now {} is earlier than last seen {}",
                now.to_rfc3339(),
                last_seen.to_rfc3339()
            ),
            EngineError::InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
        }
    }
}

impl std::error::Error for EngineError {}

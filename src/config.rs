//! Engine configuration.
//!
//! A closed, validated record: unknown fields in `engine.toml` and
//! out-of-range values are rejected at construction time rather than
//! silently ignored. Defaults live here as constant tables.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::EngineError;

// ==================== Defaults ====================

/// Hour of day (0-23, engine reference timezone) after which an unbroken
/// streak with no activity today counts as "at risk".
pub const DEFAULT_RISK_HOUR: u32 = 18;

/// Hard floor for the ease factor. Below this, items would be shown so
/// often the schedule degenerates.
pub const DEFAULT_EASE_FLOOR: f64 = 1.3;

/// Hard ceiling for the ease factor, keeping intervals bounded no matter
/// how long the correct streak runs.
pub const DEFAULT_EASE_CEILING: f64 = 10.0;

/// Level progression bands: (minimum XP, title). Each band ends where the
/// next begins; the last band is open-ended.
pub const DEFAULT_LEVEL_TABLE: [(u64, &str); 6] = [
    (0, "Novice"),
    (100, "Apprentice"),
    (250, "Student"),
    (500, "Scholar"),
    (1000, "Adept"),
    (2000, "Master"),
];

/// Ease-to-interval mapping: (exclusive ease upper bound, review interval
/// in days). Non-decreasing in ease; the last entry is the catch-all.
pub const DEFAULT_INTERVAL_TABLE: [(f64, i64); 7] = [
    (1.5, 1),
    (2.0, 2),
    (2.5, 4),
    (3.0, 7),
    (4.0, 14),
    (6.0, 30),
    (f64::MAX, 60),
];

// ==================== Configuration record ====================

/// One band of the level table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelBand {
    pub min_xp: u64,
    pub title: String,
}

/// One step of the ease-to-interval table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntervalStep {
    /// Exclusive upper bound on the ease factor for this step.
    pub max_ease: f64,
    /// Review interval in days.
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub risk_hour: u32,
    pub ease_floor: f64,
    pub ease_ceiling: f64,
    pub level_table: Vec<LevelBand>,
    pub interval_table: Vec<IntervalStep>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_hour: DEFAULT_RISK_HOUR,
            ease_floor: DEFAULT_EASE_FLOOR,
            ease_ceiling: DEFAULT_EASE_CEILING,
            level_table: DEFAULT_LEVEL_TABLE
                .iter()
                .map(|(min_xp, title)| LevelBand {
                    min_xp: *min_xp,
                    title: title.to_string(),
                })
                .collect(),
            interval_table: DEFAULT_INTERVAL_TABLE
                .iter()
                .map(|(max_ease, days)| IntervalStep {
                    max_ease: *max_ease,
                    days: *days,
                })
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Check every invariant the rest of the engine relies on.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.risk_hour > 23 {
            return Err(EngineError::InvalidConfig(format!(
                "risk_hour must be 0-23, got {}",
                self.risk_hour
            )));
        }
        if !self.ease_floor.is_finite() || self.ease_floor < 1.0 {
            return Err(EngineError::InvalidConfig(format!(
                "ease_floor must be finite and >= 1.0, got {}",
                self.ease_floor
            )));
        }
        if !self.ease_ceiling.is_finite() || self.ease_ceiling <= self.ease_floor {
            return Err(EngineError::InvalidConfig(format!(
                "ease_ceiling must be finite and > ease_floor ({}), got {}",
                self.ease_floor, self.ease_ceiling
            )));
        }
        if self.level_table.is_empty() {
            return Err(EngineError::InvalidConfig("level_table is empty".to_string()));
        }
        if self.level_table[0].min_xp != 0 {
            return Err(EngineError::InvalidConfig(
                "level_table must start at min_xp = 0".to_string(),
            ));
        }
        for pair in self.level_table.windows(2) {
            if pair[1].min_xp <= pair[0].min_xp {
                return Err(EngineError::InvalidConfig(format!(
                    "level_table min_xp must be strictly increasing ({} then {})",
                    pair[0].min_xp, pair[1].min_xp
                )));
            }
        }
        if let Some(band) = self.level_table.iter().find(|b| b.title.is_empty()) {
            return Err(EngineError::InvalidConfig(format!(
                "level_table band at {} XP has an empty title",
                band.min_xp
            )));
        }
        if self.interval_table.is_empty() {
            return Err(EngineError::InvalidConfig(
                "interval_table is empty".to_string(),
            ));
        }
        for step in &self.interval_table {
            if step.max_ease.is_nan() {
                return Err(EngineError::InvalidConfig(
                    "interval_table max_ease must not be NaN".to_string(),
                ));
            }
            if step.days < 1 {
                return Err(EngineError::InvalidConfig(format!(
                    "interval_table days must be >= 1, got {}",
                    step.days
                )));
            }
        }
        for pair in self.interval_table.windows(2) {
            if pair[1].max_ease <= pair[0].max_ease {
                return Err(EngineError::InvalidConfig(
                    "interval_table max_ease must be strictly increasing".to_string(),
                ));
            }
            if pair[1].days < pair[0].days {
                return Err(EngineError::InvalidConfig(
                    "interval_table days must be non-decreasing".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Map an ease factor to a review interval in days. Non-decreasing in
    /// ease by construction (validated above).
    pub fn base_interval(&self, ease: f64) -> i64 {
        for step in &self.interval_table {
            if ease < step.max_ease {
                return step.days;
            }
        }
        // Past the last bound: the table's longest interval applies.
        self.interval_table[self.interval_table.len() - 1].days
    }
}

// ==================== File / environment loading ====================

/// `engine.toml` structure.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    engine: Option<EngineSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineSection {
    risk_hour: Option<u32>,
    ease_floor: Option<f64>,
    ease_ceiling: Option<f64>,
    level_table: Option<Vec<LevelBand>>,
    interval_table: Option<Vec<IntervalStep>>,
}

/// Parse a configuration from TOML contents. Partial files are fine:
/// anything missing falls back to the default.
pub fn config_from_toml(contents: &str) -> Result<EngineConfig, EngineError> {
    let file: ConfigFile = toml::from_str(contents)
        .map_err(|e| EngineError::InvalidConfig(format!("TOML parse error: {}", e)))?;
    let section = file.engine.unwrap_or_default();

    let mut config = EngineConfig::default();
    if let Some(risk_hour) = section.risk_hour {
        config.risk_hour = risk_hour;
    }
    if let Some(ease_floor) = section.ease_floor {
        config.ease_floor = ease_floor;
    }
    if let Some(ease_ceiling) = section.ease_ceiling {
        config.ease_ceiling = ease_ceiling;
    }
    if let Some(level_table) = section.level_table {
        config.level_table = level_table;
    }
    if let Some(interval_table) = section.interval_table {
        config.interval_table = interval_table;
    }
    config.validate()?;
    Ok(config)
}

/// Parse a configuration from a TOML file on disk.
pub fn config_from_path(path: &Path) -> Result<EngineConfig, EngineError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        EngineError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
    })?;
    config_from_toml(&contents)
}

/// Load configuration with priority: engine.toml > environment > defaults.
///
/// Recognized environment variables (also read from a `.env` file):
/// `RECALL_RISK_HOUR`, `RECALL_EASE_FLOOR`, `RECALL_EASE_CEILING`.
/// Malformed values fail fast instead of being ignored.
pub fn load_config() -> Result<EngineConfig, EngineError> {
    let _ = dotenvy::dotenv();

    if Path::new("engine.toml").exists() {
        tracing::info!("Loading engine configuration from engine.toml");
        return config_from_path(Path::new("engine.toml"));
    }

    let mut config = EngineConfig::default();
    if let Ok(raw) = std::env::var("RECALL_RISK_HOUR") {
        tracing::info!("Using risk hour from RECALL_RISK_HOUR: {}", raw);
        config.risk_hour = raw
            .parse()
            .map_err(|_| EngineError::InvalidConfig(format!("RECALL_RISK_HOUR: {:?}", raw)))?;
    }
    if let Ok(raw) = std::env::var("RECALL_EASE_FLOOR") {
        tracing::info!("Using ease floor from RECALL_EASE_FLOOR: {}", raw);
        config.ease_floor = raw
            .parse()
            .map_err(|_| EngineError::InvalidConfig(format!("RECALL_EASE_FLOOR: {:?}", raw)))?;
    }
    if let Ok(raw) = std::env::var("RECALL_EASE_CEILING") {
        tracing::info!("Using ease ceiling from RECALL_EASE_CEILING: {}", raw);
        config.ease_ceiling = raw
            .parse()
            .map_err(|_| EngineError::InvalidConfig(format!("RECALL_EASE_CEILING: {:?}", raw)))?;
    }
    config.validate()?;
    Ok(config)
}

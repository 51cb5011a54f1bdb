//! Snap preferences: thresholds, vertex budget, target scope.

use crate::scope::ScopeMode;
use crate::snap::AxisFlags;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

/// Default snap threshold in screen pixels.
pub const DEFAULT_SNAP_DISTANCE_PX: u32 = 15;
/// Default vertex budget for full-resolution insertion.
pub const DEFAULT_VERTEX_BUDGET: usize = 50_000;

const SNAP_DISTANCE_RANGE: RangeInclusive<u32> = 1..=1000;
const VERTEX_BUDGET_RANGE: RangeInclusive<usize> = 100..=10_000_000;

/// Floor of the derived world search radius.
const MIN_WORLD_SEARCH_RADIUS: f64 = 5.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Snap settings for a move session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Screen-space snap threshold in pixels.
    pub snap_distance_px: u32,
    /// Maximum raw vertices inserted at full resolution.
    pub max_vertex_budget: usize,
    pub target_scope: ScopeMode,
    /// Axes enabled for alignment search when a session starts.
    pub align_axes: AxisFlags,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            snap_distance_px: DEFAULT_SNAP_DISTANCE_PX,
            max_vertex_budget: DEFAULT_VERTEX_BUDGET,
            target_scope: ScopeMode::default(),
            align_axes: AxisFlags::NONE,
        }
    }
}

impl SnapConfig {
    /// World-space radius for the k-d tree query.
    ///
    /// The pixel threshold does the real filtering, so this stays generous.
    pub fn world_search_radius(&self) -> f64 {
        (self.snap_distance_px as f64 * 0.5).max(MIN_WORLD_SEARCH_RADIUS)
    }

    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if !SNAP_DISTANCE_RANGE.contains(&self.snap_distance_px) {
            return Err(ConfigError::Invalid {
                field: "snap_distance_px",
                reason: format!(
                    "{} is outside {}..={}",
                    self.snap_distance_px,
                    SNAP_DISTANCE_RANGE.start(),
                    SNAP_DISTANCE_RANGE.end()
                ),
            });
        }
        if !VERTEX_BUDGET_RANGE.contains(&self.max_vertex_budget) {
            return Err(ConfigError::Invalid {
                field: "max_vertex_budget",
                reason: format!(
                    "{} is outside {}..={}",
                    self.max_vertex_budget,
                    VERTEX_BUDGET_RANGE.start(),
                    VERTEX_BUDGET_RANGE.end()
                ),
            });
        }
        if let ScopeMode::Collection(name) = &self.target_scope {
            if name.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "target_scope",
                    reason: "collection name is empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SnapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded snap config from {:?}", path);
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

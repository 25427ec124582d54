//! Engine configuration
//!
//! The merge and split heuristics are tuned by hand. Every constant lives
//! here so a scene can override it from a JSON file; missing keys keep
//! their defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning constants for the merge engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Gaps below this are bridged first
    pub initial_gap_threshold: i32,
    /// Multiplier applied to a bridged gap to form the next threshold
    pub gap_growth_factor: i32,
    /// Offset added to the next threshold after each bridge
    pub gap_growth_offset: i32,
    /// Interval chains shorter than this many columns are noise candidates
    pub noise_run_length: u32,
    /// Fraction of a column's span below which a short-lived interval is noise
    pub noise_extent_ratio: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            initial_gap_threshold: 15,
            gap_growth_factor: 1,
            gap_growth_offset: 12,
            noise_run_length: 25,
            noise_extent_ratio: 0.2,
        }
    }
}

/// Tuning constants for the split engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Pixels removed on each side of the cut point (the cut gap is twice this)
    pub half_gap: i32,
    /// Segments this many columns apart may still be connected
    pub column_window: i32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            half_gap: 4,
            column_window: 3,
        }
    }
}

/// Rendering defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Alpha for shapes that are not the highlighted one
    pub dim_alpha: f64,
    /// Clip extent used by shapes that are not inside a container
    pub default_extent: i32,
    /// Length cap for an animated surface's frame list
    pub max_frames: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dim_alpha: 0.66,
            default_extent: 2048,
            max_frames: 12_000,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frames per second used to convert milliseconds into frame indices
    pub fps: u32,
    pub merge: MergeConfig,
    pub split: SplitConfig,
    pub render: RenderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fps: 20,
            merge: MergeConfig::default(),
            split: SplitConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Convert milliseconds to whole frames at the configured rate
    pub fn ms_to_frames(&self, ms: f64) -> u32 {
        ms_to_frames(ms, self.fps)
    }
}

/// Convert milliseconds to whole frames, truncating
pub fn ms_to_frames(ms: f64, fps: u32) -> u32 {
    let frames = ms / 1000.0 * fps as f64;
    if frames.is_finite() && frames > 0.0 {
        frames as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.fps, 20);
        assert_eq!(config.merge.initial_gap_threshold, 15);
        assert_eq!(config.merge.noise_run_length, 25);
        assert_eq!(config.split.half_gap, 4);
        assert_eq!(config.render.default_extent, 2048);
        assert_eq!(config.render.max_frames, 12_000);
    }

    #[test]
    fn test_partial_override() {
        let config =
            EngineConfig::from_json_str(r#"{ "fps": 30, "merge": { "noise_run_length": 5 } }"#)
                .unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.merge.noise_run_length, 5);
        // Untouched keys keep their defaults
        assert_eq!(config.merge.initial_gap_threshold, 15);
        assert_eq!(config.split, SplitConfig::default());
    }

    #[test]
    fn test_malformed_config() {
        assert!(matches!(
            EngineConfig::from_json_str("{ fps: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/nonexistent/silhouette.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_ms_to_frames() {
        assert_eq!(ms_to_frames(1000.0, 20), 20);
        assert_eq!(ms_to_frames(1049.0, 20), 20);
        assert_eq!(ms_to_frames(0.0, 20), 0);
        assert_eq!(ms_to_frames(-50.0, 20), 0);
    }
}

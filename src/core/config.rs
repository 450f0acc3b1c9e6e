/// Tunables for the streamer and the director, loadable from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Window sizing, polling cadence and spawn-type weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Segments kept strictly ahead of the observer's segment.
    pub segments_ahead: usize,
    /// Segments kept strictly behind before despawning.
    pub segments_behind: usize,
    /// Seconds between window-maintenance passes.
    pub check_interval: f32,
    pub straight_weight: f32,
    pub curve_weight: f32,
    pub special_weight: f32,
    /// Instances created into each registered type's pool at initialize.
    pub prewarm_per_type: usize,
    pub seed: u64,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            segments_ahead: 5,
            segments_behind: 2,
            check_interval: 0.5,
            straight_weight: 0.6,
            curve_weight: 0.3,
            special_weight: 0.1,
            prewarm_per_type: 0,
            seed: 0,
        }
    }
}

impl StreamerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.check_interval >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "check_interval must be non-negative, got {}",
                self.check_interval
            )));
        }
        for (name, weight) in [
            ("straight_weight", self.straight_weight),
            ("curve_weight", self.curve_weight),
            ("special_weight", self.special_weight),
        ] {
            if !(weight >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be non-negative, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

/// Cooldown and concurrency limits for event triggering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Segment entries required between successful triggers.
    pub min_segments_between_events: u32,
    /// Concurrent active events allowed per category.
    pub max_events_per_category: usize,
    pub seed: u64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            min_segments_between_events: 2,
            max_events_per_category: 2,
            seed: 0,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub streamer: StreamerConfig,
    pub director: DirectorConfig,
}

impl RoadConfig {
    /// Load a configuration from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<RoadConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a configuration from a RON string. Missing fields take defaults.
    pub fn parse_ron(input: &str) -> Result<RoadConfig, ConfigError> {
        let config: RoadConfig = ron::from_str(input)?;
        config.streamer.validate()?;
        Ok(config)
    }
}

//! Feed client configuration
//!
//! Every key is optional; missing keys take their defaults.
//!
//! ```yaml
//! host: live-timing.formula1.com
//! cookie: "a1b2c3"
//! min_board_rows: 20
//! log_filter: livetiming=info
//! replay_rate: 20.0
//! replay_speed: 2.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FeedError, Result};

/// Board rows shown even when fewer cars are known
pub const DEFAULT_MIN_BOARD_ROWS: usize = 20;

/// Packets per second a recording is replayed at, before `replay_speed`
pub const DEFAULT_REPLAY_RATE: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Timing server that serves keys and key frames
    pub host: String,
    /// Login cookie sent with key requests
    pub cookie: String,
    /// Floor for [`SessionSummary::board_rows`](crate::SessionSummary::board_rows)
    pub min_board_rows: usize,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Packets per second for recordings at 1x
    pub replay_rate: f64,
    /// Playback speed multiplier for recordings
    pub replay_speed: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            host: "live-timing.formula1.com".to_string(),
            cookie: String::new(),
            min_board_rows: DEFAULT_MIN_BOARD_ROWS,
            log_filter: "livetiming=info".to_string(),
            replay_rate: DEFAULT_REPLAY_RATE,
            replay_speed: 1.0,
        }
    }
}

impl FeedConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FeedError::recording_error(path.to_path_buf(), e))?;
        debug!(path = %path.display(), "Loaded feed config");
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document is a valid, all-default config
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| FeedError::parse_error("feed config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(FeedError::Config { reason: "host must not be empty".to_string() });
        }
        if !self.replay_rate.is_finite() || self.replay_rate <= 0.0 {
            return Err(FeedError::Config {
                reason: format!("replay_rate must be positive, got {}", self.replay_rate),
            });
        }
        if !self.replay_speed.is_finite() || self.replay_speed <= 0.0 {
            return Err(FeedError::Config {
                reason: format!("replay_speed must be positive, got {}", self.replay_speed),
            });
        }
        Ok(())
    }
}

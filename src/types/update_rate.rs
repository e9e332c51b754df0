//! Update rate control for session summary streams

use serde::{Deserialize, Serialize};

/// How often a subscriber wants to see session summaries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum UpdateRate {
    /// Every change, as soon as it is reduced
    Native,

    /// At most this many summaries per second, latest wins
    Max(u32),
}

impl UpdateRate {
    /// Collapse rates that cannot be honoured to `Native`.
    pub fn normalize(self) -> Self {
        match self {
            UpdateRate::Max(0) => UpdateRate::Native,
            other => other,
        }
    }

    /// Get throttle interval if needed
    pub fn throttle_interval(self) -> Option<std::time::Duration> {
        match self.normalize() {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(std::time::Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}

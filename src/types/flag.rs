//! Track flag state

use serde::{Deserialize, Serialize};

use super::wire_codes::flag as codes;

/// Flag currently in effect on track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum TrackFlag {
    Green,
    Yellow,
    SafetyCarStandby,
    SafetyCarDeployed,
    Red,
    /// No flag reported yet, or a code this client does not know
    #[default]
    Unknown,
}

impl TrackFlag {
    pub fn from_code(code: i32) -> Self {
        match code {
            codes::GREEN => TrackFlag::Green,
            codes::YELLOW => TrackFlag::Yellow,
            codes::SAFETY_CAR_STANDBY => TrackFlag::SafetyCarStandby,
            codes::SAFETY_CAR_DEPLOYED => TrackFlag::SafetyCarDeployed,
            codes::RED => TrackFlag::Red,
            _ => TrackFlag::Unknown,
        }
    }

    /// Decode the ASCII digit carried in a track status payload.
    pub fn from_digit(byte: u8) -> Self {
        Self::from_code(i32::from(byte) - i32::from(b'0'))
    }

    /// True while the safety car is involved.
    pub fn is_safety_car(self) -> bool {
        matches!(self, TrackFlag::SafetyCarStandby | TrackFlag::SafetyCarDeployed)
    }
}

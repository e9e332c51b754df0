//! Decoded feed packets

use std::fmt;
use std::num::NonZeroU8;

use serde::{Deserialize, Serialize};

use super::catalogue::{CarPacketType, SystemPacketType};

/// 1-based identifier of a car, discovered as packets arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(try_from = "u8", into = "u8")]
pub struct CarId(NonZeroU8);

impl CarId {
    /// Returns `None` for 0, which the feed never uses for a car.
    pub fn new(id: u8) -> Option<Self> {
        NonZeroU8::new(id).map(Self)
    }

    pub fn get(self) -> u8 {
        self.0.get()
    }

    /// Slot of this car in 0-based storage.
    pub(crate) fn slot(self) -> usize {
        self.0.get() as usize - 1
    }

    pub(crate) fn from_slot(slot: usize) -> Option<Self> {
        u8::try_from(slot + 1).ok().and_then(Self::new)
    }
}

impl TryFrom<u8> for CarId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CarId::new(value).ok_or_else(|| "car id 0 is reserved".to_string())
    }
}

impl From<CarId> for u8 {
    fn from(id: CarId) -> Self {
        id.get()
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which entity a packet describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Car(CarId),
    System,
}

/// One decoded unit of the feed
///
/// `kind` is interpreted against the car or system catalogue depending on
/// `scope`. The payload is `None` when the packet carries no bytes at all,
/// which the feed signals with a negative length.
///
/// In recordings a car scope is written as a one-key map, `scope: { car: 3 }`,
/// and the system scope as `scope: system`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(with = "serde_yaml_ng::with::singleton_map")]
    pub scope: Scope,
    pub kind: u8,
    #[serde(default)]
    pub data: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

#[allow(clippy::len_without_is_empty)]
impl Packet {
    /// Create a car-scoped packet.
    pub fn car(car: CarId, kind: u8, data: i32, payload: Option<Vec<u8>>) -> Self {
        Self { scope: Scope::Car(car), kind, data, payload }
    }

    /// Create a system-scoped packet.
    pub fn system(kind: u8, data: i32, payload: Option<Vec<u8>>) -> Self {
        Self { scope: Scope::System, kind, data, payload }
    }

    /// Signed payload length; -1 when there is no payload.
    pub fn len(&self) -> i32 {
        match &self.payload {
            Some(bytes) => i32::try_from(bytes.len()).unwrap_or(i32::MAX),
            None => -1,
        }
    }

    /// Payload bytes, empty when there is no payload.
    pub fn bytes(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or_default()
    }

    /// Car catalogue view of `kind`, for car-scoped packets.
    pub fn car_type(&self) -> Option<(CarId, CarPacketType)> {
        match self.scope {
            Scope::Car(car) => Some((car, CarPacketType::from_raw(self.kind))),
            Scope::System => None,
        }
    }

    /// System catalogue view of `kind`, for system-scoped packets.
    pub fn system_type(&self) -> Option<SystemPacketType> {
        match self.scope {
            Scope::System => Some(SystemPacketType::from_raw(self.kind)),
            Scope::Car(_) => None,
        }
    }
}

//! Typed views over the feed's numeric catalogues

use serde::{Deserialize, Serialize};

use super::wire_codes as codes;

/// Identifier of one per-car field; indexes the car's atom table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(try_from = "u8", into = "u8")]
pub struct AtomField(u8);

impl AtomField {
    /// Wrap a raw car packet type, rejecting codes outside the atom table.
    pub fn new(raw: u8) -> Option<Self> {
        ((raw as usize) < codes::car::FIELD_COUNT).then_some(Self(raw))
    }

    /// Raw type code.
    pub fn raw(self) -> u8 {
        self.0
    }

    /// Slot of this field in a car's atom table.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Every slot of the atom table, in order.
    pub fn all() -> impl Iterator<Item = AtomField> {
        (0..codes::car::FIELD_COUNT as u8).map(AtomField)
    }

    /// Board column this field fills during a race.
    pub fn race_column(self) -> Option<RaceColumn> {
        RaceColumn::from_code(self.0)
    }

    /// Board column this field fills during practice.
    pub fn practice_column(self) -> Option<PracticeColumn> {
        PracticeColumn::from_code(self.0)
    }
}

impl TryFrom<u8> for AtomField {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        AtomField::new(raw).ok_or_else(|| format!("car packet type {raw} has no atom"))
    }
}

impl From<AtomField> for u8 {
    fn from(field: AtomField) -> Self {
        field.0
    }
}

/// Car-scoped packet types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarPacketType {
    /// The car moved to a new board row (data = row, 0 = off the board)
    PositionUpdate,
    /// Lap-by-lap position history; not reduced
    PositionHistory,
    /// Generic field atom (data = colour)
    Atom(AtomField),
    Unknown(u8),
}

impl CarPacketType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            codes::car::POSITION_UPDATE => CarPacketType::PositionUpdate,
            codes::car::POSITION_HISTORY => CarPacketType::PositionHistory,
            other => match AtomField::new(other) {
                Some(field) => CarPacketType::Atom(field),
                None => CarPacketType::Unknown(other),
            },
        }
    }
}

/// System-scoped packet types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPacketType {
    /// Start of a new event (session); payload is the event number
    EventId,
    /// Key frame marker; payload is a little-endian frame number
    KeyFrame,
    ValidMarker,
    Commentary,
    RefreshRate,
    Notice,
    Timestamp,
    /// Weather information; data selects the [`WeatherField`]
    Weather,
    Speed,
    /// Track status; data selects the [`TrackStatusField`]
    TrackStatus,
    Copyright,
    Unknown(u8),
}

impl SystemPacketType {
    pub fn from_raw(raw: u8) -> Self {
        use codes::system as sys;

        match raw {
            sys::EVENT_ID => SystemPacketType::EventId,
            sys::KEY_FRAME => SystemPacketType::KeyFrame,
            sys::VALID_MARKER => SystemPacketType::ValidMarker,
            sys::COMMENTARY => SystemPacketType::Commentary,
            sys::REFRESH_RATE => SystemPacketType::RefreshRate,
            sys::NOTICE => SystemPacketType::Notice,
            sys::TIMESTAMP => SystemPacketType::Timestamp,
            sys::WEATHER => SystemPacketType::Weather,
            sys::SPEED => SystemPacketType::Speed,
            sys::TRACK_STATUS => SystemPacketType::TrackStatus,
            sys::COPYRIGHT => SystemPacketType::Copyright,
            other => SystemPacketType::Unknown(other),
        }
    }
}

/// Sub-fields of a weather packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherField {
    /// Session time remaining, `H:MM:SS`
    SessionClock,
    TrackTemp,
    AirTemp,
    WetTrack,
    WindSpeed,
    Humidity,
    Pressure,
    WindDirection,
    Unknown(i32),
}

impl WeatherField {
    pub fn from_code(code: i32) -> Self {
        use codes::weather as w;

        match code {
            w::SESSION_CLOCK => WeatherField::SessionClock,
            w::TRACK_TEMP => WeatherField::TrackTemp,
            w::AIR_TEMP => WeatherField::AirTemp,
            w::WET_TRACK => WeatherField::WetTrack,
            w::WIND_SPEED => WeatherField::WindSpeed,
            w::HUMIDITY => WeatherField::Humidity,
            w::PRESSURE => WeatherField::Pressure,
            w::WIND_DIRECTION => WeatherField::WindDirection,
            other => WeatherField::Unknown(other),
        }
    }
}

/// Sub-fields of a track status packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatusField {
    Flag,
    Unknown(i32),
}

impl TrackStatusField {
    pub fn from_code(code: i32) -> Self {
        match code {
            codes::track_status::FLAG => TrackStatusField::Flag,
            other => TrackStatusField::Unknown(other),
        }
    }
}

/// Kind of timed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum EventKind {
    Race,
    Practice,
    /// No event seen yet, or a code this client does not know
    #[default]
    Unknown,
}

impl EventKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            codes::event::RACE => EventKind::Race,
            codes::event::PRACTICE => EventKind::Practice,
            _ => EventKind::Unknown,
        }
    }
}

/// Columns of the race board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum RaceColumn {
    Position,
    Number,
    Driver,
    Gap,
    Interval,
    LapTime,
    Sector1,
    LapStop,
    Sector2,
    LapInPit,
    Sector3,
    LapOut,
    NumPits,
}

impl RaceColumn {
    pub fn from_code(code: u8) -> Option<Self> {
        use codes::race as r;

        Some(match code {
            r::POSITION => RaceColumn::Position,
            r::NUMBER => RaceColumn::Number,
            r::DRIVER => RaceColumn::Driver,
            r::GAP => RaceColumn::Gap,
            r::INTERVAL => RaceColumn::Interval,
            r::LAP_TIME => RaceColumn::LapTime,
            r::SECTOR_1 => RaceColumn::Sector1,
            r::LAP_STOP => RaceColumn::LapStop,
            r::SECTOR_2 => RaceColumn::Sector2,
            r::LAP_IN_PIT => RaceColumn::LapInPit,
            r::SECTOR_3 => RaceColumn::Sector3,
            r::LAP_OUT => RaceColumn::LapOut,
            r::NUM_PITS => RaceColumn::NumPits,
            _ => return None,
        })
    }
}

/// Columns of the practice board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PracticeColumn {
    Position,
    Number,
    Driver,
    Best,
    Gap,
    Sector1,
    Sector2,
    Sector3,
    Laps,
}

impl PracticeColumn {
    pub fn from_code(code: u8) -> Option<Self> {
        use codes::practice as p;

        Some(match code {
            p::POSITION => PracticeColumn::Position,
            p::NUMBER => PracticeColumn::Number,
            p::DRIVER => PracticeColumn::Driver,
            p::BEST => PracticeColumn::Best,
            p::GAP => PracticeColumn::Gap,
            p::SECTOR_1 => PracticeColumn::Sector1,
            p::SECTOR_2 => PracticeColumn::Sector2,
            p::SECTOR_3 => PracticeColumn::Sector3,
            p::LAPS => PracticeColumn::Laps,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_field_deserialization_checks_range() {
        let field: AtomField = serde_yaml_ng::from_str("13").unwrap();
        assert_eq!(field.race_column(), Some(RaceColumn::NumPits));
        assert!(serde_yaml_ng::from_str::<AtomField>("16").is_err());
    }

    #[test]
    fn car_catalogue_splits_position_history_and_atoms() {
        assert_eq!(CarPacketType::from_raw(0), CarPacketType::PositionUpdate);
        assert_eq!(CarPacketType::from_raw(15), CarPacketType::PositionHistory);
        assert!(matches!(CarPacketType::from_raw(3), CarPacketType::Atom(f) if f.raw() == 3));
        assert_eq!(CarPacketType::from_raw(16), CarPacketType::Unknown(16));
        assert_eq!(CarPacketType::from_raw(200), CarPacketType::Unknown(200));
    }

    #[test]
    fn system_catalogue_leaves_gaps_unknown() {
        assert_eq!(SystemPacketType::from_raw(1), SystemPacketType::EventId);
        assert_eq!(SystemPacketType::from_raw(2), SystemPacketType::KeyFrame);
        assert_eq!(SystemPacketType::from_raw(8), SystemPacketType::Unknown(8));
        assert_eq!(SystemPacketType::from_raw(12), SystemPacketType::Copyright);
        assert_eq!(SystemPacketType::from_raw(0), SystemPacketType::Unknown(0));
    }

    #[test]
    fn same_field_means_different_columns_per_event() {
        let field = AtomField::new(4).unwrap();
        assert_eq!(field.race_column(), Some(RaceColumn::Gap));
        assert_eq!(field.practice_column(), Some(PracticeColumn::Best));

        let pits = AtomField::new(13).unwrap();
        assert_eq!(pits.race_column(), Some(RaceColumn::NumPits));
        assert_eq!(pits.practice_column(), None);
    }

    #[test]
    fn atom_table_covers_whole_car_catalogue() {
        assert_eq!(AtomField::all().count(), 16);
        assert!(AtomField::new(16).is_none());
    }

    #[test]
    fn sub_field_catalogues() {
        assert_eq!(WeatherField::from_code(0), WeatherField::SessionClock);
        assert_eq!(WeatherField::from_code(7), WeatherField::WindDirection);
        assert_eq!(WeatherField::from_code(8), WeatherField::Unknown(8));
        assert_eq!(TrackStatusField::from_code(1), TrackStatusField::Flag);
        assert_eq!(TrackStatusField::from_code(2), TrackStatusField::Unknown(2));
        assert_eq!(EventKind::from_code(1), EventKind::Race);
        assert_eq!(EventKind::from_code(2), EventKind::Practice);
        assert_eq!(EventKind::from_code(3), EventKind::Unknown);
    }
}

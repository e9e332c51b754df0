//! Raw numeric codes carried by the timing feed
//!
//! Car and system packets draw their type identifiers from two separate
//! numbering spaces; the same number means different things in each.

// Car packet types (4-bit type field of a car-scoped packet)
pub mod car {
    pub const POSITION_UPDATE: u8 = 0;
    pub const POSITION_HISTORY: u8 = 15;
    /// Size of the per-car atom table; every car type is below this.
    pub const FIELD_COUNT: usize = 16;
}

// Race board columns (car atom types during a race)
pub mod race {
    pub const POSITION: u8 = 1;
    pub const NUMBER: u8 = 2;
    pub const DRIVER: u8 = 3;
    pub const GAP: u8 = 4;
    pub const INTERVAL: u8 = 5;
    pub const LAP_TIME: u8 = 6;
    pub const SECTOR_1: u8 = 7;
    pub const LAP_STOP: u8 = 8;
    pub const SECTOR_2: u8 = 9;
    pub const LAP_IN_PIT: u8 = 10;
    pub const SECTOR_3: u8 = 11;
    pub const LAP_OUT: u8 = 12;
    pub const NUM_PITS: u8 = 13;
}

// Practice board columns (car atom types during practice)
pub mod practice {
    pub const POSITION: u8 = 1;
    pub const NUMBER: u8 = 2;
    pub const DRIVER: u8 = 3;
    pub const BEST: u8 = 4;
    pub const GAP: u8 = 5;
    pub const SECTOR_1: u8 = 6;
    pub const SECTOR_2: u8 = 7;
    pub const SECTOR_3: u8 = 8;
    pub const LAPS: u8 = 9;
}

// System packet types
pub mod system {
    pub const EVENT_ID: u8 = 1;
    pub const KEY_FRAME: u8 = 2;
    pub const VALID_MARKER: u8 = 3;
    pub const COMMENTARY: u8 = 4;
    pub const REFRESH_RATE: u8 = 5;
    pub const NOTICE: u8 = 6;
    pub const TIMESTAMP: u8 = 7;
    pub const WEATHER: u8 = 9;
    pub const SPEED: u8 = 10;
    pub const TRACK_STATUS: u8 = 11;
    pub const COPYRIGHT: u8 = 12;
}

// Weather sub-fields (data of a WEATHER packet)
pub mod weather {
    pub const SESSION_CLOCK: i32 = 0;
    pub const TRACK_TEMP: i32 = 1;
    pub const AIR_TEMP: i32 = 2;
    pub const WET_TRACK: i32 = 3;
    pub const WIND_SPEED: i32 = 4;
    pub const HUMIDITY: i32 = 5;
    pub const PRESSURE: i32 = 6;
    pub const WIND_DIRECTION: i32 = 7;
}

// Track status sub-fields (data of a TRACK_STATUS packet)
pub mod track_status {
    pub const FLAG: i32 = 1;
}

// Event kinds (data of an EVENT_ID packet)
pub mod event {
    pub const RACE: i32 = 1;
    pub const PRACTICE: i32 = 2;
}

// Track flags (ASCII digit payload of a TRACK_STATUS/FLAG packet)
pub mod flag {
    pub const GREEN: i32 = 1;
    pub const YELLOW: i32 = 2;
    pub const SAFETY_CAR_STANDBY: i32 = 3;
    pub const SAFETY_CAR_DEPLOYED: i32 = 4;
    pub const RED: i32 = 5;
}

// Atom colours (data of a car atom packet); 0 means the cell is empty
pub mod colour {
    pub const EMPTY: i32 = 0;
    pub const LATEST: i32 = 1;
    pub const PIT: i32 = 2;
    pub const BEST: i32 = 3;
    pub const RECORD: i32 = 4;
    pub const DATA: i32 = 5;
    pub const OLD: i32 = 6;
}

//! Current race state reduced from the feed
//!
//! [`RaceState`] owns everything the reducers know: session bookkeeping,
//! decryption bookkeeping and a table of cars grown as car ids appear.
//! Fields are private so the two table invariants hold at all times:
//!
//! - non-zero board rows are unique across cars
//! - every car id up to [`RaceState::num_cars`] has a full atom table

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::collaborators::DecryptionKey;
use crate::config::DEFAULT_MIN_BOARD_ROWS;
use crate::error::{FeedError, Result};
use crate::types::{Atom, AtomField, CarId, EventKind, TrackFlag, wire_codes};

/// Everything known about one car
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarEntry {
    /// Board row, 0 when the car is not on the board
    pub position: u32,
    atoms: [Atom; wire_codes::car::FIELD_COUNT],
}

impl CarEntry {
    pub fn atom(&self, field: AtomField) -> &Atom {
        &self.atoms[field.index()]
    }

    pub(crate) fn atom_mut(&mut self, field: AtomField) -> &mut Atom {
        &mut self.atoms[field.index()]
    }

    /// All atoms in field order.
    pub fn atoms(&self) -> impl Iterator<Item = (AtomField, &Atom)> {
        AtomField::all().zip(self.atoms.iter())
    }
}

/// Compact view of the session for status displays
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub event_no: u32,
    pub event_kind: EventKind,
    pub lap: u32,
    pub flag: TrackFlag,
    pub num_cars: usize,
    /// Rows the board needs, never fewer than the configured minimum
    pub board_rows: usize,
    /// Seconds remaining at the last clock update
    pub remaining_time: u32,
    /// When the session clock last ticked, if it is running
    pub epoch_time: Option<SystemTime>,
    pub frame: u32,
}

/// Race state for the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceState {
    host: String,
    cookie: String,
    min_board_rows: usize,

    event_no: u32,
    event_type: i32,
    lap: u32,
    flag: TrackFlag,
    epoch_time: Option<SystemTime>,
    remaining_time: u32,

    key: Option<DecryptionKey>,
    frame: u32,

    cars: Vec<CarEntry>,
}

impl Default for RaceState {
    fn default() -> Self {
        Self {
            host: String::new(),
            cookie: String::new(),
            min_board_rows: DEFAULT_MIN_BOARD_ROWS,
            event_no: 0,
            event_type: 0,
            lap: 0,
            flag: TrackFlag::default(),
            epoch_time: None,
            remaining_time: 0,
            key: None,
            frame: 0,
            cars: Vec::new(),
        }
    }
}

impl RaceState {
    /// Create an empty state for a connection to `host`.
    pub fn new(host: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self { host: host.into(), cookie: cookie.into(), ..Self::default() }
    }

    /// Set the minimum board height reported in [`SessionSummary::board_rows`].
    pub fn with_min_board_rows(mut self, rows: usize) -> Self {
        self.min_board_rows = rows;
        self
    }

    pub fn min_board_rows(&self) -> usize {
        self.min_board_rows
    }

    /// Grow the car table so that `car` is valid.
    ///
    /// Returns `true` when the table grew, which changes the board layout.
    /// Failing to allocate is fatal: there is no partial table to continue with.
    pub fn ensure_car(&mut self, car: CarId) -> Result<bool> {
        let wanted = car.slot() + 1;
        let missing = wanted.saturating_sub(self.cars.len());
        if missing == 0 {
            return Ok(false);
        }

        self.cars
            .try_reserve(missing)
            .map_err(|source| FeedError::TableGrowth { requested: wanted, source })?;
        self.cars.resize_with(wanted, CarEntry::default);
        Ok(true)
    }

    /// Move `car` to board `row`, first taking the row away from any car
    /// still holding it.
    ///
    /// Returns the row the car held before, or `None` if the car is unknown.
    pub(crate) fn assign_position(&mut self, car: CarId, row: u32) -> Option<u32> {
        let previous = self.cars.get(car.slot())?.position;

        for entry in &mut self.cars {
            if entry.position == row {
                entry.position = 0;
            }
        }

        self.cars[car.slot()].position = row;
        Some(previous)
    }

    /// Start a new session: entity table, clock, lap, key frame and key
    /// bookkeeping are all cleared in one step.
    pub(crate) fn reset_session(&mut self, event_no: u32, event_type: i32) {
        self.event_no = event_no;
        self.event_type = event_type;
        self.epoch_time = None;
        self.remaining_time = 0;
        self.lap = 0;
        self.key = None;
        self.frame = 0;
        self.cars = Vec::new();
    }

    pub fn num_cars(&self) -> usize {
        self.cars.len()
    }

    pub fn car(&self, car: CarId) -> Option<&CarEntry> {
        self.cars.get(car.slot())
    }

    pub(crate) fn car_mut(&mut self, car: CarId) -> Option<&mut CarEntry> {
        self.cars.get_mut(car.slot())
    }

    /// Every known car, in id order.
    pub fn cars(&self) -> impl Iterator<Item = (CarId, &CarEntry)> {
        self.cars
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| CarId::from_slot(slot).map(|id| (id, entry)))
    }

    /// Board row of `car`; 0 when it is off the board or unknown.
    pub fn position(&self, car: CarId) -> u32 {
        self.car(car).map_or(0, |entry| entry.position)
    }

    /// Car currently shown on board `row`.
    pub fn car_at(&self, row: u32) -> Option<CarId> {
        if row == 0 {
            return None;
        }
        self.cars().find(|(_, entry)| entry.position == row).map(|(id, _)| id)
    }

    pub fn atom(&self, car: CarId, field: AtomField) -> Option<&Atom> {
        self.car(car).map(|entry| entry.atom(field))
    }

    /// Rows the board needs to show every car, never fewer than `min_rows`.
    pub fn board_rows(&self, min_rows: usize) -> usize {
        let highest = self.cars.iter().map(|entry| entry.position as usize).max().unwrap_or(0);
        self.cars.len().max(min_rows).max(highest)
    }

    /// Session time left at `now`.
    ///
    /// The clock only counts down once it has ticked; before that the last
    /// reported value is returned unchanged.
    pub fn time_remaining(&self, now: SystemTime) -> Duration {
        let remaining = Duration::from_secs(u64::from(self.remaining_time));
        match self.epoch_time {
            Some(epoch) => {
                let elapsed = now.duration_since(epoch).unwrap_or_default();
                remaining.saturating_sub(elapsed)
            }
            None => remaining,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            event_no: self.event_no,
            event_kind: self.event_kind(),
            lap: self.lap,
            flag: self.flag,
            num_cars: self.cars.len(),
            board_rows: self.board_rows(self.min_board_rows),
            remaining_time: self.remaining_time,
            epoch_time: self.epoch_time,
            frame: self.frame,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn event_no(&self) -> u32 {
        self.event_no
    }

    /// Raw event type code from the last session start.
    pub fn event_type(&self) -> i32 {
        self.event_type
    }

    pub fn event_kind(&self) -> EventKind {
        EventKind::from_code(self.event_type)
    }

    pub fn lap(&self) -> u32 {
        self.lap
    }

    pub fn flag(&self) -> TrackFlag {
        self.flag
    }

    pub(crate) fn set_flag(&mut self, flag: TrackFlag) {
        self.flag = flag;
    }

    pub fn epoch_time(&self) -> Option<SystemTime> {
        self.epoch_time
    }

    pub(crate) fn set_epoch_time(&mut self, epoch: SystemTime) {
        self.epoch_time = Some(epoch);
    }

    pub fn remaining_time(&self) -> u32 {
        self.remaining_time
    }

    pub(crate) fn set_remaining_time(&mut self, seconds: u32) {
        self.remaining_time = seconds;
    }

    pub fn key(&self) -> Option<DecryptionKey> {
        self.key
    }

    pub(crate) fn set_key(&mut self, key: Option<DecryptionKey>) {
        self.key = key;
    }

    /// Key frame the stream is synchronised to; 0 before the first one.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub(crate) fn set_frame(&mut self, frame: u32) {
        self.frame = frame;
    }
}

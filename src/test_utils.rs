//! Test utilities: scripted collaborators and packet builders
//!
//! The collaborators record every call into a shared [`CallLog`] so tests can
//! assert on the exact sequence of key fetches, snapshot fetches and
//! decrypter resets a packet caused.

#![cfg(any(test, feature = "benchmark"))]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use crate::collaborators::{Clock, DecryptionKey, Decrypter, KeyFrameProvider, KeyProvider};
use crate::dispatcher::Dispatcher;
use crate::error::BoxError;
use crate::state::RaceState;
use crate::types::{CarId, Packet, wire_codes};

/// One call made to a collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Key { host: String, event: u32, cookie: String },
    KeyFrame { frame: u32, key: Option<DecryptionKey> },
    Reset(Option<DecryptionKey>),
}

/// Shared, ordered record of collaborator calls
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn entries(&self) -> MutexGuard<'_, Vec<Call>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, call: Call) {
        self.entries().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.entries().clone()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn resets(&self) -> usize {
        self.entries().iter().filter(|c| matches!(c, Call::Reset(_))).count()
    }

    pub fn key_frames(&self) -> usize {
        self.entries().iter().filter(|c| matches!(c, Call::KeyFrame { .. })).count()
    }
}

/// Key provider answering every event with the same key, or failing
#[derive(Debug, Clone)]
pub struct ScriptedKeys {
    log: CallLog,
    key: Option<DecryptionKey>,
}

impl KeyProvider for ScriptedKeys {
    fn obtain_decryption_key(
        &mut self,
        host: &str,
        event: u32,
        cookie: &str,
    ) -> Result<DecryptionKey, BoxError> {
        self.log.push(Call::Key { host: host.to_string(), event, cookie: cookie.to_string() });
        self.key.ok_or_else(|| format!("no key for event {event}").into())
    }
}

/// Key frame provider serving the same snapshot for every frame, or failing
#[derive(Debug, Clone)]
pub struct ScriptedKeyFrames {
    log: CallLog,
    snapshot: Option<Vec<Packet>>,
}

impl KeyFrameProvider for ScriptedKeyFrames {
    fn obtain_key_frame(
        &mut self,
        _host: &str,
        frame: u32,
        key: Option<DecryptionKey>,
    ) -> Result<Vec<Packet>, BoxError> {
        self.log.push(Call::KeyFrame { frame, key });
        self.snapshot.clone().ok_or_else(|| format!("key frame {frame} not found").into())
    }
}

/// Decrypter that only records its resets
#[derive(Debug, Clone)]
pub struct RecordingDecrypter {
    log: CallLog,
}

impl Decrypter for RecordingDecrypter {
    fn reset(&mut self, key: Option<DecryptionKey>) {
        self.log.push(Call::Reset(key));
    }
}

/// Manually advanced wall clock
#[derive(Debug, Clone)]
pub struct FixedClock(Arc<Mutex<SystemTime>>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))))
    }
}

impl FixedClock {
    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Dispatcher wired to scripted collaborators
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub log: CallLog,
    pub clock: FixedClock,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub const KEY: DecryptionKey = DecryptionKey(0x0DDC_0FFE);
    pub const HOST: &'static str = "timing.test";
    pub const COOKIE: &'static str = "c00kie";

    /// Keys always succeed and every snapshot is empty.
    pub fn new() -> Self {
        Self::build(Some(Self::KEY), Some(Vec::new()))
    }

    pub fn with_snapshot(snapshot: Vec<Packet>) -> Self {
        Self::build(Some(Self::KEY), Some(snapshot))
    }

    pub fn failing_keys() -> Self {
        Self::build(None, Some(Vec::new()))
    }

    pub fn failing_key_frames() -> Self {
        Self::build(Some(Self::KEY), None)
    }

    fn build(key: Option<DecryptionKey>, snapshot: Option<Vec<Packet>>) -> Self {
        let log = CallLog::default();
        let clock = FixedClock::default();
        let dispatcher = Dispatcher::new(
            RaceState::new(Self::HOST, Self::COOKIE),
            ScriptedKeys { log: log.clone(), key },
            ScriptedKeyFrames { log: log.clone(), snapshot },
            RecordingDecrypter { log: log.clone() },
        )
        .with_clock(clock.clone());

        Self { dispatcher, log, clock }
    }
}

pub fn car(id: u8) -> CarId {
    CarId::new(id).expect("car ids start at 1")
}

pub fn atom_packet(id: u8, kind: u8, colour: i32, text: &str) -> Packet {
    Packet::car(car(id), kind, colour, Some(text.as_bytes().to_vec()))
}

pub fn colour_only(id: u8, kind: u8, colour: i32) -> Packet {
    Packet::car(car(id), kind, colour, None)
}

pub fn position_update(id: u8, row: i32) -> Packet {
    Packet::car(car(id), wire_codes::car::POSITION_UPDATE, row, None)
}

/// Session start for `event`, payload prefixed with its format byte.
pub fn event_start(event: u32, kind: i32) -> Packet {
    let mut payload = vec![0x01];
    payload.extend_from_slice(event.to_string().as_bytes());
    Packet::system(wire_codes::system::EVENT_ID, kind, Some(payload))
}

/// Key frame marker with a little-endian frame number.
pub fn key_frame(frame: &[u8]) -> Packet {
    Packet::system(wire_codes::system::KEY_FRAME, 0, Some(frame.to_vec()))
}

pub fn session_clock(hms: &str) -> Packet {
    Packet::system(
        wire_codes::system::WEATHER,
        wire_codes::weather::SESSION_CLOCK,
        Some(hms.as_bytes().to_vec()),
    )
}

pub fn session_tick() -> Packet {
    Packet::system(wire_codes::system::WEATHER, wire_codes::weather::SESSION_CLOCK, None)
}

pub fn flag_packet(digit: u8) -> Packet {
    Packet::system(wire_codes::system::TRACK_STATUS, wire_codes::track_status::FLAG, Some(vec![digit]))
}

/// A plausible race: session start, grid, then `laps` laps of position
/// shuffles, lap times and gaps with a clock update every lap.
pub fn sample_race(cars: u8, laps: u32) -> Vec<Packet> {
    let mut packets = vec![event_start(7021, wire_codes::event::RACE), flag_packet(b'1')];

    for id in 1..=cars {
        packets.push(atom_packet(id, wire_codes::race::NUMBER, wire_codes::colour::DATA, &id.to_string()));
        packets.push(atom_packet(id, wire_codes::race::DRIVER, wire_codes::colour::DATA, &format!("DRIVER {id}")));
        packets.push(position_update(id, i32::from(id)));
    }
    packets.push(session_tick());

    for lap in 1..=laps {
        let minutes = 90u32.saturating_sub(lap * 2);
        packets.push(session_clock(&format!("{}:{:02}:00", minutes / 60, minutes % 60)));

        for id in 1..=cars {
            let time = format!("1:{:02}.{:03}", 20 + (u32::from(id) + lap) % 10, lap * 7 % 1000);
            packets.push(atom_packet(id, wire_codes::race::LAP_TIME, wire_codes::colour::LATEST, &time));
            packets.push(colour_only(id, wire_codes::race::SECTOR_1, wire_codes::colour::OLD));
            packets.push(atom_packet(id, wire_codes::race::GAP, wire_codes::colour::LATEST, &format!("{}.{}", id, lap % 10)));
        }

        // Adjacent cars swap, clearing before or after depending on the lap
        if cars >= 2 {
            let a = (lap % u32::from(cars - 1)) as u8 + 1;
            let b = a + 1;
            let (row_a, row_b) = (i32::from(a), i32::from(b));
            if lap % 2 == 0 {
                packets.push(position_update(a, 0));
                packets.push(position_update(b, row_a));
                packets.push(position_update(a, row_b));
            } else {
                packets.push(position_update(b, row_a));
                packets.push(position_update(a, row_b));
            }
        }
    }

    packets
}

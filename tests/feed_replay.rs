//! End-to-end reduction of recorded feeds through the public API

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use futures::StreamExt;
use livetiming::types::wire_codes;
use livetiming::{
    AtomField, BoxError, CarId, Clock, DecryptionKey, Decrypter, Dispatcher, FeedConnection,
    KeyFrameProvider, KeyProvider, Notification, Packet, RaceState, ReplaySource, TrackFlag,
    UpdateRate,
};

const PRACTICE: &str = r#"
- scope: system
  kind: 1
  data: 2
  payload: [1, 55, 48, 50, 49]
- scope: system
  kind: 11
  data: 1
  payload: [49]
- scope: { car: 1 }
  kind: 3
  data: 5
  payload: [66, 85, 84, 84, 79, 78]
- scope: { car: 1 }
  kind: 0
  data: 1
- scope: { car: 2 }
  kind: 3
  data: 5
  payload: [66, 65, 82, 82, 73, 67, 72, 69, 76, 76, 79]
- scope: { car: 2 }
  kind: 0
  data: 2
- scope: { car: 2 }
  kind: 0
  data: 1
- scope: { car: 1 }
  kind: 0
  data: 2
- scope: { car: 2 }
  kind: 4
  data: 3
- scope: system
  kind: 11
  data: 1
  payload: [50]
"#;

fn car(id: u8) -> CarId {
    CarId::new(id).unwrap()
}

#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct Keys(Log);

impl KeyProvider for Keys {
    fn obtain_decryption_key(
        &mut self,
        host: &str,
        event: u32,
        _cookie: &str,
    ) -> Result<DecryptionKey, BoxError> {
        self.0.push(format!("key {host} {event}"));
        Ok(DecryptionKey(event))
    }
}

struct Snapshot(Log, Vec<Packet>);

impl KeyFrameProvider for Snapshot {
    fn obtain_key_frame(
        &mut self,
        _host: &str,
        frame: u32,
        _key: Option<DecryptionKey>,
    ) -> Result<Vec<Packet>, BoxError> {
        self.0.push(format!("frame {frame}"));
        Ok(self.1.clone())
    }
}

struct Cipher(Log);

impl Decrypter for Cipher {
    fn reset(&mut self, key: Option<DecryptionKey>) {
        self.0.push(format!("reset {:?}", key.map(|k| k.0)));
    }
}

struct StoppedClock(SystemTime);

impl Clock for StoppedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

#[tokio::test]
async fn practice_recording_reduces_to_final_board() {
    let source = ReplaySource::from_yaml_str(PRACTICE).unwrap();
    let mut connection = FeedConnection::start(source, Dispatcher::plaintext(RaceState::default()));

    let notifications: Vec<_> = connection.notifications().collect().await;
    let state = connection.finish().await.unwrap();

    assert_eq!(state.event_no(), 7021);
    assert_eq!(state.flag(), TrackFlag::Yellow);
    assert_eq!(state.car_at(1), Some(car(2)));
    assert_eq!(state.car_at(2), Some(car(1)));

    let driver = AtomField::new(wire_codes::practice::DRIVER).unwrap();
    assert_eq!(state.atom(car(2), driver).unwrap().text.as_str(), "BARRICHELLO");

    // Colour-only update keeps the old text
    let best = AtomField::new(wire_codes::practice::BEST).unwrap();
    let best_atom = state.atom(car(2), best).unwrap();
    assert_eq!(best_atom.colour, wire_codes::colour::BEST);
    assert!(best_atom.text.is_empty());

    let layouts = notifications.iter().filter(|n| **n == Notification::LayoutChanged).count();
    // Session start, car 1 appears, car 2 appears
    assert_eq!(layouts, 3);
    // Car 1 was evicted from row 1 without a clear of its own
    assert!(notifications.contains(&Notification::RowCleared { car: car(2), row: 2 }));
}

#[tokio::test]
async fn live_session_bootstraps_from_key_frame() {
    let log = Log::default();
    let snapshot = vec![
        Packet::car(car(5), wire_codes::race::DRIVER, 1, Some(b"ALONSO".to_vec())),
        Packet::car(car(5), wire_codes::car::POSITION_UPDATE, 1, None),
        Packet::system(wire_codes::system::KEY_FRAME, 0, Some(vec![4, 0])),
    ];
    let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
    let dispatcher = Dispatcher::new(
        RaceState::new("timing.example", "cookie"),
        Keys(log.clone()),
        Snapshot(log.clone(), snapshot),
        Cipher(log.clone()),
    )
    .with_clock(StoppedClock(start));

    let source = ReplaySource::new(vec![
        Packet::system(wire_codes::system::EVENT_ID, wire_codes::event::RACE, Some(b"\x018".to_vec())),
        Packet::system(wire_codes::system::KEY_FRAME, 0, Some(vec![4, 0])),
        Packet::system(wire_codes::system::WEATHER, wire_codes::weather::SESSION_CLOCK, None),
        Packet::system(wire_codes::system::WEATHER, wire_codes::weather::SESSION_CLOCK, Some(b"1:30:00".to_vec())),
        Packet::system(wire_codes::system::KEY_FRAME, 0, Some(vec![5, 0])),
        Packet::car(car(2), wire_codes::car::POSITION_UPDATE, 1, None),
    ]);

    let connection = FeedConnection::start(source, dispatcher);
    let mut updates = connection.session_updates(UpdateRate::Native);
    let state = connection.finish().await.unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "key timing.example 8",
            "reset Some(8)",
            "reset Some(8)",
            "frame 4",
            "reset Some(8)",
            "reset Some(8)",
            "reset Some(8)",
        ]
    );

    assert_eq!(state.frame(), 5);
    assert_eq!(state.num_cars(), 5);
    assert_eq!(state.car_at(1), Some(car(2)));
    assert_eq!(state.position(car(5)), 0);
    assert_eq!(state.remaining_time(), 5400);
    assert_eq!(state.time_remaining(start + Duration::from_secs(60)), Duration::from_secs(5340));

    let last = updates.next().await.unwrap();
    assert_eq!(last.frame, 5);
}

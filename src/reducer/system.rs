//! System-scoped packet reduction
//!
//! Per session the reducer moves through three states:
//!
//! 1. a session start resets everything and fetches the event's key;
//! 2. until the first key frame marker arrives the frame counter is 0;
//! 3. the first marker fetches and replays the key frame snapshot, later
//!    markers only advance the counter.
//!
//! Every session start goes back to step 1.

use tracing::{debug, info, trace, warn};

use crate::dispatcher::Dispatcher;
use crate::error::{FeedError, Result};
use crate::notify::{Notification, Notify};
use crate::types::{
    Packet, SystemPacketType, TrackFlag, TrackStatusField, WeatherField, numeral,
};

impl Dispatcher {
    pub(crate) fn apply_system_packet(&mut self, packet: &Packet) -> Result<()> {
        let Some(kind) = packet.system_type() else {
            return Ok(());
        };

        match kind {
            SystemPacketType::EventId => self.start_session(packet),
            SystemPacketType::KeyFrame => self.key_frame(packet),
            SystemPacketType::Weather => {
                self.weather(packet);
                Ok(())
            }
            SystemPacketType::TrackStatus => {
                self.track_status(packet);
                Ok(())
            }
            SystemPacketType::Copyright => {
                debug!(target: "livetiming::notice", "{}", payload_text(packet));
                Ok(())
            }
            SystemPacketType::Notice => {
                let text = payload_text(packet);
                info!(target: "livetiming::notice", "{}", text);
                self.outbox.notify(Notification::Notice { text });
                Ok(())
            }
            other => {
                trace!(?other, data = packet.data, "Ignoring system packet");
                Ok(())
            }
        }
    }

    /// Payload: one format byte, then the event number in ASCII decimal.
    /// Data: event kind.
    fn start_session(&mut self, packet: &Packet) -> Result<()> {
        let event = numeral::decimal_after_marker(packet.bytes());
        info!(event, event_type = packet.data, "Begin new event");

        let key = self.keys.obtain_decryption_key(self.state.host(), event, self.state.cookie());

        self.state.reset_session(event, packet.data);
        let outcome = match key {
            Ok(key) => {
                self.state.set_key(Some(key));
                Ok(())
            }
            Err(source) => {
                warn!(event, error = %source, "No decryption key for event");
                Err(FeedError::key_retrieval_with_source(event, source))
            }
        };
        self.decrypter.reset(self.state.key());

        self.outbox.notify(Notification::LayoutChanged);
        self.outbox.notify(Notification::StatusChanged);
        outcome
    }

    /// Payload: little-endian frame number.
    fn key_frame(&mut self, packet: &Packet) -> Result<()> {
        let frame = numeral::little_endian_counter(packet.bytes());
        self.decrypter.reset(self.state.key());

        // Markers inside a snapshot never fetch another snapshot
        if self.state.frame() != 0 || self.replaying {
            trace!(frame, "Key frame marker");
            self.state.set_frame(frame);
            return Ok(());
        }

        debug!(frame, "First key frame of session, fetching snapshot");
        self.state.set_frame(frame);

        let snapshot =
            self.key_frames.obtain_key_frame(self.state.host(), frame, self.state.key());
        let outcome = match snapshot {
            Ok(packets) => self.replay_snapshot(frame, &packets),
            Err(source) => {
                warn!(frame, error = %source, "Key frame unavailable");
                Err(FeedError::key_frame_with_source(frame, source))
            }
        };

        self.decrypter.reset(self.state.key());
        outcome
    }

    fn replay_snapshot(&mut self, frame: u32, packets: &[Packet]) -> Result<()> {
        debug!(frame, packets = packets.len(), "Replaying key frame");
        self.replaying = true;

        let mut outcome = Ok(());
        for packet in packets {
            if let Err(error) = self.dispatch(packet) {
                if error.is_fatal() {
                    outcome = Err(error);
                    break;
                }
                warn!(frame, %error, "Key frame packet failed");
            }
        }

        self.replaying = false;
        // A session start inside the snapshot zeroes the counter
        if self.state.frame() == 0 {
            self.state.set_frame(frame);
        }
        outcome
    }

    /// Data: weather field. Only the session clock is reduced.
    fn weather(&mut self, packet: &Packet) {
        match WeatherField::from_code(packet.data) {
            WeatherField::SessionClock => {
                let now = self.clock.now();
                if packet.len() > 0 {
                    // Sent once a minute as H:MM:SS
                    let total = numeral::duration_seconds(packet.bytes());
                    if self.state.epoch_time().is_some() {
                        self.state.set_epoch_time(now);
                    }
                    self.state.set_remaining_time(total);
                } else {
                    // Bare tick marking the passing of a minute
                    self.state.set_epoch_time(now);
                }

                self.outbox.notify(Notification::PopupDismissRequested);
                self.outbox.notify(Notification::StatusChanged);
            }
            other => trace!(?other, "Unhandled weather field"),
        }
    }

    /// Data: track status field. Payload: ASCII digit.
    fn track_status(&mut self, packet: &Packet) {
        match TrackStatusField::from_code(packet.data) {
            TrackStatusField::Flag => match packet.bytes().first() {
                Some(&digit) => {
                    let flag = TrackFlag::from_digit(digit);
                    debug!(?flag, "Track flag");
                    self.state.set_flag(flag);
                    self.outbox.notify(Notification::StatusChanged);
                }
                None => trace!("Flag packet without payload"),
            },
            other => trace!(?other, "Unhandled track status field"),
        }
    }
}

/// Payload text up to its terminating NUL, otherwise unchanged.
fn payload_text(packet: &Packet) -> String {
    let bytes = packet.bytes();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use crate::collaborators::{Clock, DecryptionKey};
    use crate::notify::Notification;
    use crate::test_utils::{
        Call, Harness, atom_packet, car, event_start, flag_packet, key_frame, position_update,
        session_clock, session_tick,
    };
    use crate::FeedError;
    use crate::types::{EventKind, Packet, TrackFlag, wire_codes};
    use std::time::Duration;

    #[test]
    fn session_start_resets_everything_and_fetches_key() {
        let mut h = Harness::new();
        h.dispatcher.dispatch(&position_update(12, 1)).unwrap();
        h.dispatcher.dispatch(&session_clock("1:00:00")).unwrap();
        h.dispatcher.dispatch(&session_tick()).unwrap();
        h.log.clear();

        h.dispatcher.dispatch(&event_start(7021, wire_codes::event::RACE)).unwrap();

        let state = h.dispatcher.state();
        assert_eq!(state.event_no(), 7021);
        assert_eq!(state.event_kind(), EventKind::Race);
        assert_eq!(state.num_cars(), 0);
        assert_eq!(state.lap(), 0);
        assert_eq!(state.remaining_time(), 0);
        assert_eq!(state.epoch_time(), None);
        assert_eq!(state.frame(), 0);
        assert_eq!(state.key(), Some(Harness::KEY));

        assert_eq!(
            h.log.calls(),
            vec![
                Call::Key { host: "timing.test".into(), event: 7021, cookie: "c00kie".into() },
                Call::Reset(Some(Harness::KEY)),
            ]
        );
    }

    #[test]
    fn session_start_requests_layout_then_status() {
        let mut h = Harness::new();
        h.dispatcher.dispatch(&event_start(1, wire_codes::event::PRACTICE)).unwrap();
        assert_eq!(
            h.dispatcher.take_notifications(),
            vec![Notification::LayoutChanged, Notification::StatusChanged]
        );
    }

    #[test]
    fn failed_key_still_resets_session() {
        let mut h = Harness::failing_keys();
        h.dispatcher.dispatch(&position_update(3, 1)).unwrap();

        let err = h.dispatcher.dispatch(&event_start(99, wire_codes::event::RACE)).unwrap_err();
        assert!(matches!(err, FeedError::KeyRetrieval { event: 99, .. }));
        assert!(!err.is_fatal());

        assert_eq!(h.dispatcher.state().num_cars(), 0);
        assert_eq!(h.dispatcher.state().key(), None);
        assert_eq!(h.log.resets(), 1);

        // The feed keeps flowing afterwards
        h.dispatcher.dispatch(&position_update(1, 1)).unwrap();
        assert_eq!(h.dispatcher.state().num_cars(), 1);
    }

    #[test]
    fn first_key_frame_fetches_and_replays_snapshot() {
        let mut h = Harness::with_snapshot(vec![
            atom_packet(1, wire_codes::race::DRIVER, 1, "RAIKKONEN"),
            position_update(1, 1),
            atom_packet(2, wire_codes::race::DRIVER, 1, "ALONSO"),
            position_update(2, 2),
        ]);
        h.dispatcher.dispatch(&event_start(5, wire_codes::event::RACE)).unwrap();
        h.log.clear();

        h.dispatcher.dispatch(&key_frame(&[0x2A, 0x00])).unwrap();

        assert_eq!(h.dispatcher.state().frame(), 42);
        assert_eq!(h.dispatcher.state().car_at(2), Some(car(2)));
        assert_eq!(
            h.log.calls(),
            vec![
                Call::Reset(Some(Harness::KEY)),
                Call::KeyFrame { frame: 42, key: Some(Harness::KEY) },
                Call::Reset(Some(Harness::KEY)),
            ]
        );
    }

    #[test]
    fn later_key_frames_only_advance_counter() {
        let mut h = Harness::new();
        h.dispatcher.dispatch(&event_start(5, wire_codes::event::RACE)).unwrap();
        h.dispatcher.dispatch(&key_frame(&[0x01, 0x00])).unwrap();
        h.dispatcher.dispatch(&key_frame(&[0x00, 0x01])).unwrap();

        assert_eq!(h.log.key_frames(), 1);
        assert_eq!(h.dispatcher.state().frame(), 256);
    }

    #[test]
    fn new_session_fetches_snapshot_again() {
        let mut h = Harness::new();
        h.dispatcher.dispatch(&event_start(5, wire_codes::event::RACE)).unwrap();
        h.dispatcher.dispatch(&key_frame(&[7])).unwrap();
        h.dispatcher.dispatch(&event_start(6, wire_codes::event::RACE)).unwrap();
        h.dispatcher.dispatch(&key_frame(&[8])).unwrap();

        assert_eq!(h.log.key_frames(), 2);
    }

    #[test]
    fn snapshot_markers_do_not_refetch() {
        let mut h = Harness::with_snapshot(vec![
            event_start(5, wire_codes::event::RACE),
            key_frame(&[3]),
            position_update(1, 1),
        ]);
        h.dispatcher.dispatch(&event_start(5, wire_codes::event::RACE)).unwrap();
        h.dispatcher.dispatch(&key_frame(&[3])).unwrap();

        assert_eq!(h.log.key_frames(), 1);
        assert_eq!(h.dispatcher.state().frame(), 3);
        assert_eq!(h.dispatcher.state().position(car(1)), 1);

        h.dispatcher.dispatch(&key_frame(&[4])).unwrap();
        assert_eq!(h.log.key_frames(), 1);
    }

    #[test]
    fn failed_snapshot_is_not_retried() {
        let mut h = Harness::failing_key_frames();
        h.dispatcher.dispatch(&event_start(5, wire_codes::event::RACE)).unwrap();

        let err = h.dispatcher.dispatch(&key_frame(&[9])).unwrap_err();
        assert!(matches!(err, FeedError::KeyFrameRetrieval { frame: 9, .. }));
        assert_eq!(h.dispatcher.state().frame(), 9);

        h.dispatcher.dispatch(&key_frame(&[10])).unwrap();
        assert_eq!(h.log.key_frames(), 1);
        // session start, then two resets around the failed fetch, then one
        assert_eq!(h.log.resets(), 4);
    }

    #[test]
    fn session_clock_sets_remaining_time() {
        let mut h = Harness::new();
        h.dispatcher.dispatch(&session_clock("1:02:03")).unwrap();

        assert_eq!(h.dispatcher.state().remaining_time(), 3723);
        // The clock has not ticked yet so the epoch stays unset
        assert_eq!(h.dispatcher.state().epoch_time(), None);
        assert_eq!(
            h.dispatcher.take_notifications(),
            vec![Notification::PopupDismissRequested, Notification::StatusChanged]
        );
    }

    #[test]
    fn tick_starts_clock_and_later_values_refresh_epoch() {
        let mut h = Harness::new();
        let start = h.clock.now();

        h.dispatcher.dispatch(&session_tick()).unwrap();
        assert_eq!(h.dispatcher.state().epoch_time(), Some(start));

        h.clock.advance(Duration::from_secs(60));
        h.dispatcher.dispatch(&session_clock("0:59:00")).unwrap();

        let state = h.dispatcher.state();
        assert_eq!(state.epoch_time(), Some(start + Duration::from_secs(60)));
        assert_eq!(state.remaining_time(), 3540);
        assert_eq!(
            state.time_remaining(start + Duration::from_secs(90)),
            Duration::from_secs(3510)
        );
    }

    #[test]
    fn empty_clock_payload_counts_as_tick() {
        let mut h = Harness::new();
        let packet = Packet::system(wire_codes::system::WEATHER, 0, Some(Vec::new()));
        h.dispatcher.dispatch(&packet).unwrap();

        assert_eq!(h.dispatcher.state().epoch_time(), Some(h.clock.now()));
        assert_eq!(h.dispatcher.state().remaining_time(), 0);
        assert_eq!(
            h.dispatcher.take_notifications(),
            vec![Notification::PopupDismissRequested, Notification::StatusChanged]
        );

        h.dispatcher.dispatch(&session_tick()).unwrap();
        assert_eq!(
            h.dispatcher.take_notifications(),
            vec![Notification::PopupDismissRequested, Notification::StatusChanged]
        );
    }

    #[test]
    fn other_weather_fields_are_ignored() {
        let mut h = Harness::new();
        let air = Packet::system(wire_codes::system::WEATHER, wire_codes::weather::AIR_TEMP, Some(b"23".to_vec()));
        h.dispatcher.dispatch(&air).unwrap();

        assert!(h.dispatcher.take_notifications().is_empty());
        assert_eq!(h.dispatcher.state().remaining_time(), 0);
    }

    #[test]
    fn flag_updates_status() {
        let mut h = Harness::new();
        h.dispatcher.dispatch(&flag_packet(b'4')).unwrap();

        assert_eq!(h.dispatcher.state().flag(), TrackFlag::SafetyCarDeployed);
        assert_eq!(h.dispatcher.take_notifications(), vec![Notification::StatusChanged]);

        h.dispatcher.dispatch(&flag_packet(b'7')).unwrap();
        assert_eq!(h.dispatcher.state().flag(), TrackFlag::Unknown);
    }

    #[test]
    fn flag_without_payload_or_other_fields_is_ignored() {
        let mut h = Harness::new();
        h.dispatcher.dispatch(&flag_packet(b'5')).unwrap();
        h.dispatcher.take_notifications();

        let bare = Packet::system(wire_codes::system::TRACK_STATUS, wire_codes::track_status::FLAG, None);
        h.dispatcher.dispatch(&bare).unwrap();
        let other = Packet::system(wire_codes::system::TRACK_STATUS, 2, Some(b"1".to_vec()));
        h.dispatcher.dispatch(&other).unwrap();

        assert_eq!(h.dispatcher.state().flag(), TrackFlag::Red);
        assert!(h.dispatcher.take_notifications().is_empty());
    }

    #[test]
    fn notices_pass_through_without_state_change() {
        let mut h = Harness::new();
        let before = h.dispatcher.state().clone();

        let notice = Packet::system(wire_codes::system::NOTICE, 0, Some(b"  Session delayed\n\0junk".to_vec()));
        h.dispatcher.dispatch(&notice).unwrap();
        let copyright = Packet::system(wire_codes::system::COPYRIGHT, 0, Some(b"(c) FOM".to_vec()));
        h.dispatcher.dispatch(&copyright).unwrap();

        assert_eq!(h.dispatcher.state(), &before);
        assert_eq!(
            h.dispatcher.take_notifications(),
            vec![Notification::Notice { text: "  Session delayed\n".to_string() }]
        );
    }

    #[test]
    fn unknown_system_packets_are_ignored() {
        let mut h = Harness::new();
        let before = h.dispatcher.state().clone();
        for kind in [0, 3, 4, 5, 7, 8, 10, 13, 255] {
            h.dispatcher.dispatch(&Packet::system(kind, 1, Some(b"1".to_vec()))).unwrap();
        }
        assert_eq!(h.dispatcher.state(), &before);
        assert!(h.dispatcher.take_notifications().is_empty());
        assert!(h.log.calls().is_empty());
    }

    #[test]
    fn key_is_passed_to_decrypter_resets() {
        let mut h = Harness::new();
        h.dispatcher.dispatch(&event_start(1, wire_codes::event::RACE)).unwrap();
        assert!(h.log.calls().contains(&Call::Reset(Some(DecryptionKey(0x0DDC_0FFE)))));
    }
}

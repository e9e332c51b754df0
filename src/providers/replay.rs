//! Replay source for recorded packet streams

use std::collections::VecDeque;
use std::path::Path;
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::provider::PacketSource;
use crate::types::Packet;
use crate::{FeedError, Result};

/// Replays a recorded list of packets
///
/// Recordings are YAML sequences of packets. Without pacing every packet is
/// delivered immediately; with pacing one packet is delivered per tick.
pub struct ReplaySource {
    packets: VecDeque<Packet>,
    delivered: usize,
    total: usize,

    /// Packets per second at 1x, when paced
    base_rate: Option<f64>,
    speed: f64,
    interval: Option<Interval>,
}

impl ReplaySource {
    /// Replay packets already in memory, unpaced.
    pub fn new(packets: Vec<Packet>) -> Self {
        let total = packets.len();
        Self {
            packets: packets.into(),
            delivered: 0,
            total,
            base_rate: None,
            speed: 1.0,
            interval: None,
        }
    }

    /// Load a YAML recording.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FeedError::recording_error(path.to_path_buf(), e))?;
        let packets = Self::parse(&text)
            .map_err(|e| FeedError::parse_error(path.display().to_string(), e.to_string()))?;

        info!("Opened recording {}: {} packets", path.display(), packets.len());
        Ok(Self::new(packets))
    }

    /// Parse a YAML recording held in memory.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(Self::new(Self::parse(yaml)?))
    }

    fn parse(yaml: &str) -> std::result::Result<Vec<Packet>, serde_yaml_ng::Error> {
        if yaml.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_yaml_ng::from_str(yaml)
    }

    /// Deliver at most `packets_per_second` packets per second at 1x speed.
    pub fn paced(mut self, packets_per_second: f64) -> Self {
        if packets_per_second.is_finite() && packets_per_second > 0.0 {
            self.base_rate = Some(packets_per_second);
            self.rebuild_interval();
        }
        self
    }

    /// Set playback speed
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = if speed.is_finite() { speed.clamp(0.1, 10.0) } else { 1.0 };
        self.rebuild_interval();
        debug!("Playback speed set to {}x", self.speed);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn remaining(&self) -> usize {
        self.packets.len()
    }

    fn rebuild_interval(&mut self) {
        if let Some(rate) = self.base_rate {
            let mut ticks = interval(Duration::from_secs_f64(1.0 / (rate * self.speed)));
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.interval = Some(ticks);
        }
    }
}

#[async_trait::async_trait]
impl PacketSource for ReplaySource {
    async fn next_packet(&mut self) -> Result<Option<Packet>> {
        if self.packets.is_empty() {
            debug!("Reached end of recording");
            return Ok(None);
        }

        if let Some(ticks) = self.interval.as_mut() {
            ticks.tick().await;
        }

        let packet = self.packets.pop_front();
        if packet.is_some() {
            self.delivered += 1;
            trace!("Packet {}/{}", self.delivered, self.total);
        }
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{event_start, position_update};
    use crate::types::wire_codes;

    #[tokio::test]
    async fn delivers_in_order_then_ends() {
        let mut source = ReplaySource::new(vec![
            event_start(1, wire_codes::event::RACE),
            position_update(1, 1),
        ]);

        assert_eq!(source.next_packet().await.unwrap(), Some(event_start(1, wire_codes::event::RACE)));
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.next_packet().await.unwrap(), Some(position_update(1, 1)));
        assert_eq!(source.next_packet().await.unwrap(), None);
        assert_eq!(source.next_packet().await.unwrap(), None);
    }

    #[tokio::test]
    async fn yaml_recordings_parse() {
        let yaml = "- scope: system\n  kind: 11\n  data: 1\n  payload: [50]\n\
                    - scope: { car: 2 }\n  kind: 0\n  data: 1\n";
        let mut source = ReplaySource::from_yaml_str(yaml).unwrap();
        assert_eq!(source.remaining(), 2);
        assert!(source.next_packet().await.unwrap().is_some());

        assert_eq!(ReplaySource::from_yaml_str("").unwrap().remaining(), 0);
        assert!(matches!(ReplaySource::from_yaml_str("- nonsense"), Err(FeedError::Parse { .. })));
    }

    #[test]
    fn missing_recording_is_reported() {
        let result = ReplaySource::open("/nonexistent/recording.yaml");
        assert!(matches!(result, Err(FeedError::Recording { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_follows_speed() {
        let packets = (1..=5).map(|id| position_update(id, i32::from(id))).collect();
        let mut source = ReplaySource::new(packets).paced(10.0);
        source.set_speed(2.0);

        let start = tokio::time::Instant::now();
        while source.next_packet().await.unwrap().is_some() {}

        // First tick is immediate, then 50ms apart at 20 packets per second
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(250), "{elapsed:?}");
    }

    #[test]
    fn speed_is_clamped() {
        let mut source = ReplaySource::new(Vec::new());
        source.set_speed(100.0);
        assert_eq!(source.speed(), 10.0);
        source.set_speed(0.0);
        assert_eq!(source.speed(), 0.1);
        source.set_speed(f64::NAN);
        assert_eq!(source.speed(), 1.0);
    }
}

//! Packet dispatch into the reducers

use tracing::debug;

use crate::Result;
use crate::collaborators::{
    Clock, Decrypter, KeyFrameProvider, KeyProvider, NoKeyFrames, NoKeys, Plaintext, SystemClock,
};
use crate::config::FeedConfig;
use crate::notify::{Notification, Notify};
use crate::reducer::apply_car_packet;
use crate::state::RaceState;
use crate::types::{Packet, Scope};

/// Entry point for decoded packets
///
/// Owns the race state and the collaborators the reducers call, and collects
/// the notifications they produce until the caller drains them.
///
/// ```rust
/// use livetiming::{CarId, Dispatcher, Notification, Packet, RaceState};
///
/// let mut dispatcher = Dispatcher::plaintext(RaceState::default());
/// let car = CarId::new(2).unwrap();
/// dispatcher.dispatch(&Packet::car(car, 0, 1, None)).unwrap();
///
/// assert_eq!(dispatcher.state().position(car), 1);
/// assert_eq!(
///     dispatcher.take_notifications(),
///     vec![Notification::LayoutChanged, Notification::RowChanged { car }]
/// );
/// ```
pub struct Dispatcher {
    pub(crate) state: RaceState,
    pub(crate) keys: Box<dyn KeyProvider>,
    pub(crate) key_frames: Box<dyn KeyFrameProvider>,
    pub(crate) decrypter: Box<dyn Decrypter>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) outbox: Vec<Notification>,
    /// Set while a key frame snapshot is being replayed
    pub(crate) replaying: bool,
}

impl Dispatcher {
    pub fn new(
        state: RaceState,
        keys: impl KeyProvider + 'static,
        key_frames: impl KeyFrameProvider + 'static,
        decrypter: impl Decrypter + 'static,
    ) -> Self {
        Self {
            state,
            keys: Box::new(keys),
            key_frames: Box::new(key_frames),
            decrypter: Box::new(decrypter),
            clock: Box::new(SystemClock),
            outbox: Vec::new(),
            replaying: false,
        }
    }

    /// Dispatcher with an empty state seeded from `config`.
    pub fn from_config(
        config: &FeedConfig,
        keys: impl KeyProvider + 'static,
        key_frames: impl KeyFrameProvider + 'static,
        decrypter: impl Decrypter + 'static,
    ) -> Self {
        let state = RaceState::new(config.host.clone(), config.cookie.clone())
            .with_min_board_rows(config.min_board_rows);
        Self::new(state, keys, key_frames, decrypter)
    }

    /// Dispatcher for unencrypted sources such as recordings.
    pub fn plaintext(state: RaceState) -> Self {
        Self::new(state, NoKeys, NoKeyFrames, Plaintext)
    }

    /// Replace the wall clock used for the session clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Reduce one packet.
    ///
    /// Errors from collaborators leave the state consistent and the next
    /// packet can be dispatched as usual; check [`FeedError::is_fatal`]
    /// before giving up.
    ///
    /// [`FeedError::is_fatal`]: crate::FeedError::is_fatal
    pub fn dispatch(&mut self, packet: &Packet) -> Result<()> {
        match packet.scope {
            Scope::Car(car) => {
                // Layout settles before the car reducer emits any cell change
                if self.state.ensure_car(car)? {
                    debug!(cars = self.state.num_cars(), "Car table grew");
                    self.outbox.notify(Notification::LayoutChanged);
                }
                apply_car_packet(&mut self.state, packet, &mut self.outbox)
            }
            Scope::System => self.apply_system_packet(packet),
        }
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    pub fn into_state(self) -> RaceState {
        self.state
    }

    /// Notifications produced since the last call, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state)
            .field("pending", &self.outbox.len())
            .field("replaying", &self.replaying)
            .finish_non_exhaustive()
    }
}

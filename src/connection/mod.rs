//! Connection to a running feed
//!
//! A [`FeedConnection`] owns the driver task and hands out streams of what
//! it produces: display notifications in order, and session summaries at
//! whatever rate the subscriber can handle.

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{UnboundedReceiverStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::dispatcher::Dispatcher;
use crate::driver::Driver;
use crate::notify::Notification;
use crate::provider::PacketSource;
use crate::providers::ReplaySource;
use crate::state::{RaceState, SessionSummary};
use crate::stream::ThrottleExt;
use crate::types::UpdateRate;
use crate::{FeedError, Result};


/// Handle on a feed being reduced in the background
pub struct FeedConnection {
    notifications: Option<mpsc::UnboundedReceiver<Notification>>,
    sessions: watch::Receiver<Option<Arc<SessionSummary>>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<RaceState>>,
}

impl FeedConnection {
    /// Start reducing `source` with `dispatcher`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S: PacketSource>(source: S, dispatcher: Dispatcher) -> Self {
        let channels = Driver::spawn(source, dispatcher);
        Self {
            notifications: Some(channels.notifications),
            sessions: channels.sessions,
            cancel: channels.cancel,
            handle: Some(channels.handle),
        }
    }

    /// Replay a YAML recording as plaintext, `replay_rate` packets per
    /// second scaled by `replay_speed`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open_recording<P: AsRef<Path>>(path: P, config: &FeedConfig) -> Result<Self> {
        let mut source = ReplaySource::open(path)?.paced(config.replay_rate);
        source.set_speed(config.replay_speed);

        let state = RaceState::new(config.host.clone(), config.cookie.clone())
            .with_min_board_rows(config.min_board_rows);
        info!("Replaying recording with {} packets", source.remaining());
        Ok(Self::start(source, Dispatcher::plaintext(state)))
    }

    /// Display notifications in reduction order.
    ///
    /// There is a single notification stream per connection; later calls
    /// get an empty stream.
    pub fn notifications(&mut self) -> BoxStream<'static, Notification> {
        match self.notifications.take() {
            Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
            None => {
                warn!("Notification stream already taken");
                stream::empty().boxed()
            }
        }
    }

    /// Session summaries as they change, throttled to `rate`.
    pub fn session_updates(
        &self,
        rate: UpdateRate,
    ) -> impl Stream<Item = Arc<SessionSummary>> + 'static {
        let summaries = WatchStream::new(self.sessions.clone()).filter_map(|opt| async move { opt });

        match rate.throttle_interval() {
            None => summaries.boxed(),
            Some(period) => summaries.throttle(period).boxed(),
        }
    }

    /// Latest published summary, if any packet has been reduced yet.
    pub fn current_session(&self) -> Option<Arc<SessionSummary>> {
        self.sessions.borrow().clone()
    }

    /// Wait for the feed to end and return the final race state.
    pub async fn finish(mut self) -> Result<RaceState> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| FeedError::source_failed("driver task already joined"))?;

        handle.await.map_err(|e| FeedError::Source {
            reason: "driver task failed".to_string(),
            source: Some(Box::new(e)),
        })
    }

    /// Stop reducing and return the race state as it stands.
    pub async fn stop(self) -> Result<RaceState> {
        self.cancel.cancel();
        self.finish().await
    }
}

impl Drop for FeedConnection {
    fn drop(&mut self) {
        debug!("Dropping feed connection");
        self.cancel.cancel();
    }
}

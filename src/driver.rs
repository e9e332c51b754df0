//! Driver spawns and manages the packet reduction task

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::dispatcher::Dispatcher;
use crate::notify::{Notification, Notify};
use crate::provider::PacketSource;
use crate::state::{RaceState, SessionSummary};
use crate::types::{Packet, SystemPacketType};

/// Consecutive source failures tolerated before the driver gives up
pub const MAX_SOURCE_ERRORS: u32 = 10;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Display notifications, in reduction order
    pub notifications: mpsc::UnboundedReceiver<Notification>,
    /// Latest session summary, published when it changes
    pub sessions: watch::Receiver<Option<Arc<SessionSummary>>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Resolves to the final race state once the task ends
    pub handle: JoinHandle<RaceState>,
}

/// Driver moves packets from a source through a dispatcher
///
/// The dispatcher is synchronous. Packets that reach the key or key frame
/// providers are reduced on the blocking pool so a slow fetch never stalls a
/// runtime worker; the packets queued behind it still wait for it to finish.
pub struct Driver;

impl Driver {
    /// Spawn the reduction task for `source`.
    pub fn spawn<S>(source: S, dispatcher: Dispatcher) -> DriverChannels
    where
        S: PacketSource,
    {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let cancel_task = cancel.clone();
        let handle = tokio::spawn(async move {
            Self::reduce_task(source, dispatcher, notify_tx, session_tx, cancel_task).await
        });

        DriverChannels { notifications: notify_rx, sessions: session_rx, cancel, handle }
    }

    async fn reduce_task<S>(
        mut source: S,
        mut dispatcher: Dispatcher,
        mut notify_tx: mpsc::UnboundedSender<Notification>,
        session_tx: watch::Sender<Option<Arc<SessionSummary>>>,
        cancel: CancellationToken,
    ) -> RaceState
    where
        S: PacketSource,
    {
        info!("Reduce task started");
        let mut packet_count = 0u64;
        let mut error_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!("Reduce task cancelled");
                break;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Reduce task cancelled during read");
                    break;
                }
                result = source.next_packet() => result,
            };

            match result {
                Ok(Some(packet)) => {
                    packet_count += 1;
                    error_count = 0;
                    trace!(packet_count, scope = ?packet.scope, kind = packet.kind, "Packet");

                    let outcome = if calls_collaborators(&packet) {
                        let reduced = tokio::task::spawn_blocking(move || {
                            let outcome = dispatcher.dispatch(&packet);
                            (dispatcher, outcome)
                        })
                        .await;
                        match reduced {
                            Ok((returned, outcome)) => {
                                dispatcher = returned;
                                outcome
                            }
                            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                            Err(e) => {
                                error!("Blocking reduction aborted, state lost: {}", e);
                                return RaceState::default();
                            }
                        }
                    } else {
                        dispatcher.dispatch(&packet)
                    };
                    for notification in dispatcher.take_notifications() {
                        notify_tx.notify(notification);
                    }

                    if let Err(e) = outcome {
                        if e.is_fatal() {
                            error!("Race state lost, stopping: {}", e);
                            notify_tx.notify(Notification::Notice { text: e.to_string() });
                            break;
                        }
                        warn!("Packet {} not fully reduced: {}", packet_count, e);
                        notify_tx.notify(Notification::Notice { text: e.to_string() });
                    }

                    publish_summary(&session_tx, dispatcher.state().summary());
                }
                Ok(None) => {
                    info!("Source ended after {} packets", packet_count);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    error!("Source error ({}/{}): {}", error_count, MAX_SOURCE_ERRORS, e);

                    if error_count >= MAX_SOURCE_ERRORS {
                        error!("Too many source errors, shutting down");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ... capped at 3.2s
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(6)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        info!("Reduce task ended (processed {} packets)", packet_count);
        dispatcher.into_state()
    }
}

/// Session starts fetch a key and key frames fetch a snapshot.
fn calls_collaborators(packet: &Packet) -> bool {
    matches!(packet.system_type(), Some(SystemPacketType::EventId | SystemPacketType::KeyFrame))
}

fn publish_summary(tx: &watch::Sender<Option<Arc<SessionSummary>>>, summary: SessionSummary) {
    let changed = tx.send_if_modified(|current| {
        if current.as_deref() == Some(&summary) {
            return false;
        }
        *current = Some(Arc::new(summary.clone()));
        true
    });
    if changed {
        debug!(event = summary.event_no, cars = summary.num_cars, "Session summary changed");
    }
}

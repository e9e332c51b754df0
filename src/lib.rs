//! Packet reduction engine for live motorsport timing feeds.
//!
//! The timing feed is a stream of small packets, each scoped to a car or to
//! the session as a whole. This crate folds those packets into a
//! [`RaceState`] (board positions, per-car timing cells, session clock, track
//! flag) and describes every change as a [`Notification`] so a display can
//! redraw exactly what changed.
//!
//! # Features
//!
//! - **Synchronous core**: [`Dispatcher::dispatch`] reduces one packet at a time
//! - **Pluggable collaborators**: key, key frame and decryption services are traits
//! - **Async shell**: [`FeedConnection`] drives any [`PacketSource`] on tokio
//! - **Replay**: YAML recordings via [`ReplaySource`]
//!
//! ## Example
//!
//! ```rust
//! use livetiming::{CarId, Dispatcher, Notification, Packet, RaceState};
//! use livetiming::types::wire_codes;
//!
//! let mut dispatcher = Dispatcher::plaintext(RaceState::new("timing.local", ""));
//! let car = CarId::new(1).unwrap();
//!
//! let driver = Packet::car(car, wire_codes::race::DRIVER, 1, Some(b"BUTTON".to_vec()));
//! dispatcher.dispatch(&driver).unwrap();
//!
//! assert_eq!(dispatcher.state().num_cars(), 1);
//! assert!(matches!(
//!     dispatcher.take_notifications().last(),
//!     Some(Notification::CellChanged { .. })
//! ));
//! ```
//!
//! ## Example (recording replay)
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use livetiming::{FeedConfig, FeedConnection};
//!
//! #[tokio::main]
//! async fn main() -> livetiming::Result<()> {
//!     let config = FeedConfig::load("livetiming.yaml")?;
//!     livetiming::logging::init(&config.log_filter);
//!
//!     let mut connection = FeedConnection::open_recording("race.yaml", &config)?;
//!     let mut notifications = connection.notifications();
//!     while let Some(notification) = notifications.next().await {
//!         println!("{:?}", notification);
//!     }
//!
//!     let state = connection.finish().await?;
//!     println!("{} cars", state.num_cars());
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod collaborators;
pub mod config;
mod dispatcher;
mod error;
pub mod logging;
mod notify;
mod reducer;
mod state;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Stream-based feed architecture
pub mod connection;
pub mod driver;
pub mod provider;
pub mod providers;
pub mod stream;

// Core exports
pub use collaborators::{Clock, DecryptionKey, Decrypter, KeyFrameProvider, KeyProvider};
pub use config::FeedConfig;
pub use dispatcher::Dispatcher;
pub use error::*;
pub use notify::{Notification, Notify};
pub use reducer::apply_car_packet;
pub use state::{CarEntry, RaceState, SessionSummary};
pub use types::*;

// Main API exports
pub use connection::FeedConnection;
pub use provider::PacketSource;
pub use providers::ReplaySource;

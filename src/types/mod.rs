//! Core types for live timing packets and their payloads.
//!
//! ## Architecture
//!
//! The feed delivers one generic packet shape whose meaning depends on scope:
//! - [`Packet`] is a decoded packet, scoped to a car ([`CarId`]) or to the system
//! - [`CarPacketType`] and [`SystemPacketType`] are the two disjoint catalogues
//!   the packet's `kind` is read against
//! - [`Atom`] holds the last known value of one field of one car, with text
//!   bounded by [`AtomText::CAPACITY`]
//! - [`numeral`] decodes the decimal, little-endian and duration encodings
//!   found in payloads
//!
//! ## Usage Example
//!
//! ```rust
//! use livetiming::types::{CarId, CarPacketType, Packet};
//!
//! let car = CarId::new(7).unwrap();
//! let packet = Packet::car(car, 3, 1, Some(b"RAIKKONEN".to_vec()));
//!
//! match packet.car_type() {
//!     Some((id, CarPacketType::Atom(field))) => {
//!         assert_eq!(id, car);
//!         assert_eq!(field.raw(), 3);
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

mod atom;
mod catalogue;
mod flag;
pub mod numeral;
mod packet;
mod update_rate;
pub mod wire_codes;

// Re-export all public types
pub use atom::{Atom, AtomColour, AtomText, TextUpdate};
pub use catalogue::{
    AtomField, CarPacketType, EventKind, PracticeColumn, RaceColumn, SystemPacketType,
    TrackStatusField, WeatherField,
};
pub use flag::TrackFlag;
pub use packet::{CarId, Packet, Scope};
pub use update_rate::UpdateRate;

//! Packet reducers
//!
//! Car packets are reduced by a free function over [`RaceState`](crate::RaceState)
//! since they never call out. System packets need the collaborators and the
//! ability to replay key frame snapshots, so they are reduced by methods on
//! [`Dispatcher`](crate::Dispatcher).

mod car;
mod system;

pub use car::apply_car_packet;

//! Car-scoped packet reduction

use tracing::{debug, trace};

use crate::Result;
use crate::notify::{Notification, Notify};
use crate::state::RaceState;
use crate::types::{AtomField, CarId, CarPacketType, Packet, TextUpdate};

/// Apply a car-scoped packet to the race state.
///
/// System-scoped packets are ignored. The car table is grown first; when it
/// grows, `LayoutChanged` is emitted before any row or cell notification.
pub fn apply_car_packet(
    state: &mut RaceState,
    packet: &Packet,
    out: &mut impl Notify,
) -> Result<()> {
    let Some((car, kind)) = packet.car_type() else {
        return Ok(());
    };

    if state.ensure_car(car)? {
        debug!(cars = state.num_cars(), "Car table grew");
        out.notify(Notification::LayoutChanged);
    }

    match kind {
        CarPacketType::PositionUpdate => update_position(state, car, packet.data, out),
        CarPacketType::PositionHistory => {
            trace!(%car, "Position history not reduced");
        }
        CarPacketType::Atom(field) => update_atom(state, car, field, packet, out),
        CarPacketType::Unknown(code) => {
            trace!(%car, code, "Ignoring unknown car packet");
        }
    }

    Ok(())
}

/// Position updates tend to arrive in pairs (leave old row, take new row)
/// but not reliably in that order, so the new row is taken from whichever
/// car still holds it.
fn update_position(state: &mut RaceState, car: CarId, data: i32, out: &mut impl Notify) {
    let Ok(row) = u32::try_from(data) else {
        debug!(%car, data, "Ignoring negative board position");
        return;
    };

    let current = state.position(car);
    if current != 0 {
        out.notify(Notification::RowCleared { car, row: current });
    }

    state.assign_position(car, row);

    if row != 0 {
        out.notify(Notification::RowChanged { car });
    }
}

/// Atoms without a payload only change colour.
fn update_atom(
    state: &mut RaceState,
    car: CarId,
    field: AtomField,
    packet: &Packet,
    out: &mut impl Notify,
) {
    let Some(entry) = state.car_mut(car) else {
        return;
    };
    let atom = entry.atom_mut(field);
    atom.colour = packet.data;

    if let Some(payload) = &packet.payload {
        if atom.offer_text(payload) == TextUpdate::Rejected {
            debug!(%car, field = field.raw(), len = payload.len(), "Atom text too long, kept previous");
        }
    }

    out.notify(Notification::CellChanged { car, field });
}

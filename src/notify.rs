//! Display notifications produced while reducing packets
//!
//! Reducers never draw anything. They describe what changed and the display
//! decides how to redraw it.

use serde::{Deserialize, Serialize};

use crate::types::{AtomField, CarId};

/// One change the display should reflect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// Car count or event kind changed; the whole board must be rebuilt
    LayoutChanged,
    /// One field of one car changed
    CellChanged { car: CarId, field: AtomField },
    /// Every field of a car should be redrawn on its current row
    RowChanged { car: CarId },
    /// The car left `row`, which should be blanked
    RowCleared { car: CarId, row: u32 },
    /// Flag, lap or session clock changed
    StatusChanged,
    /// Any transient popup should be closed
    PopupDismissRequested,
    /// Text the user should see, from the feed or from a failed collaborator
    Notice { text: String },
}

/// Sink for notifications
pub trait Notify {
    fn notify(&mut self, notification: Notification);
}

impl Notify for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

impl Notify for tokio::sync::mpsc::UnboundedSender<Notification> {
    fn notify(&mut self, notification: Notification) {
        // A closed receiver means nobody is displaying anything any more
        let _ = self.send(notification);
    }
}

//! Source trait for decoded packets

use crate::Result;
use crate::types::Packet;

/// Anything that yields decoded feed packets
///
/// Sources handle their own pacing: a network source waits on the socket, a
/// recording waits on its playback interval.
#[async_trait::async_trait]
pub trait PacketSource: Send + 'static {
    /// Get the next packet
    ///
    /// Returns:
    /// - `Ok(Some(packet))` - next packet, already decrypted and decoded
    /// - `Ok(None)` - feed ended
    /// - `Err(e)` - delivery failed; the caller may ask again
    async fn next_packet(&mut self) -> Result<Option<Packet>>;
}

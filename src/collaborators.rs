//! Services the reducers call out to
//!
//! Fetching keys and key frames involves the network and decrypting the
//! stream involves a cipher. Neither belongs to the reducers, which only see
//! these traits. All calls are synchronous: reduction of the current packet
//! waits for them to return.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::BoxError;
use crate::types::Packet;

/// Per-event key for the stream cipher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecryptionKey(pub u32);

/// Fetches the decryption key of an event
pub trait KeyProvider: Send {
    fn obtain_decryption_key(
        &mut self,
        host: &str,
        event: u32,
        cookie: &str,
    ) -> std::result::Result<DecryptionKey, BoxError>;
}

/// Fetches the key frame snapshot for a frame number
///
/// The snapshot is returned as decoded packets; the dispatcher replays them
/// through the reducers to bootstrap the race state.
pub trait KeyFrameProvider: Send {
    fn obtain_key_frame(
        &mut self,
        host: &str,
        frame: u32,
        key: Option<DecryptionKey>,
    ) -> std::result::Result<Vec<Packet>, BoxError>;
}

/// Keyed stream transform applied upstream of packet decoding
pub trait Decrypter: Send {
    /// Rewind the transform to its initial position for `key`.
    fn reset(&mut self, key: Option<DecryptionKey>);
}

/// Source of wall clock time
pub trait Clock: Send {
    fn now(&self) -> SystemTime;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Key frame provider for feeds that are never encrypted, such as recordings
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeyFrames;

impl KeyFrameProvider for NoKeyFrames {
    fn obtain_key_frame(
        &mut self,
        _host: &str,
        _frame: u32,
        _key: Option<DecryptionKey>,
    ) -> std::result::Result<Vec<Packet>, BoxError> {
        Ok(Vec::new())
    }
}

/// Key provider for feeds that are never encrypted
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeys;

impl KeyProvider for NoKeys {
    fn obtain_decryption_key(
        &mut self,
        _host: &str,
        _event: u32,
        _cookie: &str,
    ) -> std::result::Result<DecryptionKey, BoxError> {
        Ok(DecryptionKey(0))
    }
}

/// Decrypter that does nothing, for plaintext sources
#[derive(Debug, Clone, Copy, Default)]
pub struct Plaintext;

impl Decrypter for Plaintext {
    fn reset(&mut self, _key: Option<DecryptionKey>) {}
}

//! Error types for feed processing.
//!
//! All errors implement `std::error::Error` and carry enough context to tell
//! the user what went wrong with the feed.
//!
//! ## Error Categories
//!
//! - **Collaborator Errors**: decryption key or key frame retrieval failed
//! - **Resource Errors**: the car table could not grow
//! - **Source Errors**: the packet source failed to deliver the next packet
//! - **Recording / Config Errors**: files on disk could not be read or parsed
//!
//! ## Recovery
//!
//! Only table growth failures are fatal. Everything else leaves the race state
//! usable and the feed keeps running:
//!
//! ```rust
//! use livetiming::FeedError;
//!
//! let error = FeedError::key_retrieval(7021, "server returned 503");
//! assert!(!error.is_fatal());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for feed operations.
pub type Result<T, E = FeedError> = std::result::Result<T, E>;

/// Main error type for feed operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FeedError {
    #[error("Failed to obtain decryption key for event {event}: {reason}")]
    KeyRetrieval {
        event: u32,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Failed to obtain key frame {frame}: {reason}")]
    KeyFrameRetrieval {
        frame: u32,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Car table could not grow to {requested} cars")]
    TableGrowth {
        requested: usize,
        #[source]
        source: std::collections::TryReserveError,
    },

    #[error("Packet source failed: {reason}")]
    Source {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Recording file error: {path}")]
    Recording {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl FeedError {
    /// Returns whether the operation may succeed if attempted again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::KeyRetrieval { .. } => true,
            FeedError::KeyFrameRetrieval { .. } => true,
            FeedError::Source { .. } => true,
            FeedError::TableGrowth { .. } => false,
            FeedError::Recording { .. } => false,
            FeedError::Parse { .. } => false,
            FeedError::Config { .. } => false,
        }
    }

    /// Returns whether the race state can no longer be trusted.
    ///
    /// The driver stops on fatal errors and keeps going on everything else.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FeedError::TableGrowth { .. })
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            FeedError::KeyRetrieval { .. } => vec![
                "Check the login cookie is still valid",
                "Verify the timing host is reachable",
                "Wait for the next session start to fetch a fresh key",
            ],
            FeedError::KeyFrameRetrieval { .. } => vec![
                "Verify the timing host is reachable",
                "Timing will catch up as new packets arrive",
            ],
            FeedError::TableGrowth { .. } => {
                vec!["Free memory and restart the client", "Check the feed is not corrupt"]
            }
            FeedError::Source { .. } => vec![
                "Check the network connection",
                "Reconnect to the timing feed",
            ],
            FeedError::Recording { .. } => vec![
                "Check the recording file exists and is readable",
                "Check file permissions",
            ],
            FeedError::Parse { .. } => vec![
                "Check the file was written by a compatible version",
                "Verify source data integrity",
            ],
            FeedError::Config { .. } => vec![
                "Check the configuration file for typos",
                "Remove the offending key to fall back to the default",
            ],
        }
    }

    /// Helper constructor for key retrieval failures.
    pub fn key_retrieval(event: u32, reason: impl Into<String>) -> Self {
        FeedError::KeyRetrieval { event, reason: reason.into(), source: None }
    }

    /// Helper constructor for key retrieval failures reported by a collaborator.
    pub fn key_retrieval_with_source(event: u32, source: BoxError) -> Self {
        FeedError::KeyRetrieval { event, reason: source.to_string(), source: Some(source) }
    }

    /// Helper constructor for key frame retrieval failures reported by a collaborator.
    pub fn key_frame_with_source(frame: u32, source: BoxError) -> Self {
        FeedError::KeyFrameRetrieval { frame, reason: source.to_string(), source: Some(source) }
    }

    /// Helper constructor for packet source failures.
    pub fn source_failed(reason: impl Into<String>) -> Self {
        FeedError::Source { reason: reason.into(), source: None }
    }

    /// Helper constructor for recording file errors with path context.
    pub fn recording_error(path: PathBuf, source: std::io::Error) -> Self {
        FeedError::Recording { path, source }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        FeedError::Parse { context: context.into(), details: details.into() }
    }
}

impl From<serde_yaml_ng::Error> for FeedError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        FeedError::Parse { context: "YAML document".to_string(), details: err.to_string() }
    }
}

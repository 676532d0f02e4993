//! Error types for the watch channel.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watch operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors that can occur on a watch channel.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The OS could not allocate the notification descriptor.
    #[error("notification channel unavailable: {source}")]
    ChannelUnavailable {
        /// Underlying OS error.
        source: io::Error,
    },

    /// The path could not be registered for watching.
    #[error("path not watchable: {}: {source}", .path.display())]
    PathNotWatchable {
        /// Path that was passed to `subscribe`.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The per-user watch limit was reached.
    #[error("subscription limit exceeded: too many watches")]
    SubscriptionLimitExceeded,

    /// The blocking read on the channel failed.
    #[error("read on notification channel failed: {source}")]
    ReadError {
        /// Underlying OS error.
        source: io::Error,
    },

    /// The raw event stream was malformed; `offset` is the byte position
    /// of the record that did not fit the read.
    #[error("corrupt event stream at offset {offset}")]
    CorruptEventStream {
        /// Byte offset of the offending record.
        offset: usize,
    },

    /// Operation on a channel that has already been closed.
    #[error("channel is closed")]
    ChannelClosed,
}

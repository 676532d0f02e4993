//! # dirnotify
//!
//! Blocking single-directory change notification over Linux inotify.
//! The crate wraps the raw notification descriptor in an owned channel,
//! decodes the kernel's packed event stream, and reports entry creation
//! and deletion in delivery order.
//!
//! ## Features
//!
//! - **Scoped Channel**: the descriptor is released on every exit path
//! - **Raw Decoding**: the packed event records are parsed directly,
//!   with a guard against malformed streams
//! - **Ordered Batches**: one blocking read yields one batch of events
//!   in the order the kernel observed the mutations
//! - **Deadline Variant**: an optional poll deadline for callers that
//!   cannot block forever
//!
//! ## Architecture
//!
//! ```text
//! WatchChannel ──► blocking read ──► decode_batch ──► Vec<Event>
//!      │
//!      ▼
//! WatchToken (one per subscribed directory)
//! ```
//!
//! Linux only: the channel is a thin layer over `inotify(7)`.

pub mod channel;
pub mod decode;
pub mod error;
pub mod event;

pub use channel::{ChannelState, WatchChannel, WatchToken};
pub use decode::{EVENT_BUF_LEN, decode_batch};
pub use error::{Result, WatchError};
pub use event::{Event, EventKind, Interest};

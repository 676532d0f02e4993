//! Decoded filesystem events and the subscription interest mask.

use std::ffi::OsString;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Event kinds a subscription registers interest in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Interest: u32 {
        /// Entry created inside the watched directory.
        const CREATE = libc::IN_CREATE;

        /// Entry deleted from the watched directory.
        const DELETE = libc::IN_DELETE;
    }
}

impl Default for Interest {
    fn default() -> Self {
        Self::CREATE | Self::DELETE
    }
}

/// Kind of change reported for a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Entry was created.
    Created,

    /// Entry was deleted.
    Deleted,
}

/// A single decoded change notification.
///
/// Produced by scanning one read of the raw notification stream; events
/// within a batch keep the order the kernel delivered them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The kind of change.
    pub kind: EventKind,

    /// Whether the affected entry is a directory.
    pub is_dir: bool,

    /// Entry name relative to the watched directory. Never empty:
    /// nameless administrative records are filtered during decoding.
    pub name: OsString,
}

impl Event {
    /// Create a new event.
    pub fn new(kind: EventKind, is_dir: bool, name: impl Into<OsString>) -> Self {
        Self {
            kind,
            is_dir,
            name: name.into(),
        }
    }
}

impl fmt::Display for Event {
    /// Renders as `<entity-kind> <name> <action>`, e.g. `file a.txt created`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entity = if self.is_dir { "directory" } else { "file" };
        let action = match self.kind {
            EventKind::Created => "created",
            EventKind::Deleted => "deleted",
        };
        write!(f, "{entity} {} {action}", self.name.to_string_lossy())
    }
}

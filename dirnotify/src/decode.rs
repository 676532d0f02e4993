//! Decoding of the raw inotify event stream.
//!
//! A read from the notification descriptor returns a packed sequence of
//! variable-length records. Each record is a fixed 16-byte header
//! (`wd: i32`, `mask: u32`, `cookie: u32`, `len: u32`, native endian)
//! followed by `len` bytes of NUL-padded entry name. A `len` of zero
//! marks an administrative record (queue overflow, watch removal) with
//! no entry to report.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;

use crate::error::{Result, WatchError};
use crate::event::{Event, EventKind};

/// Size of the fixed per-record header.
pub const EVENT_HEADER_LEN: usize = std::mem::size_of::<libc::inotify_event>();

/// Longest entry name a record can carry (`NAME_MAX`).
pub const MAX_NAME_LEN: usize = 255;

/// Capacity of the reusable read buffer: room for many typical records,
/// and always more than one maximal record so the kernel never has to
/// truncate a record at the end of a read.
pub const EVENT_BUF_LEN: usize = 1024 * (EVENT_HEADER_LEN + 16);

const _: () = assert!(EVENT_BUF_LEN >= EVENT_HEADER_LEN + MAX_NAME_LEN + 1);

/// Decode every record in `buf` into an ordered batch of events.
///
/// `buf` must be exactly the bytes returned by one read of the channel,
/// never the buffer's full capacity: bytes past the read length are
/// stale and must not be scanned.
///
/// Nameless administrative records contribute nothing to the batch, as
/// do records whose mask carries neither the create nor the delete bit.
/// A record that does not fit inside `buf` aborts decoding with
/// [`WatchError::CorruptEventStream`]; nothing from that read is kept.
pub fn decode_batch(buf: &[u8]) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        if buf.len() - offset < EVENT_HEADER_LEN {
            return Err(WatchError::CorruptEventStream { offset });
        }

        let mask = read_u32(buf, offset + 4);
        let name_len = read_u32(buf, offset + 12) as usize;

        let name_start = offset + EVENT_HEADER_LEN;
        let name_end = name_start.saturating_add(name_len);
        if name_end > buf.len() {
            return Err(WatchError::CorruptEventStream { offset });
        }

        if name_len > 0 {
            if let Some(event) = classify(mask, &buf[name_start..name_end]) {
                events.push(event);
            }
        }

        offset = name_end;
    }

    Ok(events)
}

/// Map one record's mask bits and padded name field to a reportable event.
///
/// The create bit is checked before the delete bit. The two are mutually
/// exclusive in practice, but the order makes classification deterministic
/// if they ever co-occur.
fn classify(mask: u32, padded_name: &[u8]) -> Option<Event> {
    let name = match padded_name.iter().position(|&b| b == 0) {
        Some(end) => &padded_name[..end],
        None => padded_name,
    };
    if name.is_empty() {
        return None;
    }

    let kind = if mask & libc::IN_CREATE != 0 {
        EventKind::Created
    } else if mask & libc::IN_DELETE != 0 {
        EventKind::Deleted
    } else {
        return None;
    };

    let is_dir = mask & libc::IN_ISDIR != 0;
    Some(Event::new(kind, is_dir, OsStr::from_bytes(name)))
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    u32::from_ne_bytes(raw)
}

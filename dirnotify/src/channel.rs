//! The watch channel: an owned inotify descriptor plus its subscriptions.

use std::collections::HashMap;
use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::decode::{EVENT_BUF_LEN, decode_batch};
use crate::error::{Result, WatchError};
use crate::event::{Event, Interest};

/// Token identifying one directory subscription on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchToken(RawFd);

/// Lifecycle state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Open, no subscriptions.
    Idle,

    /// Open with at least one subscription.
    Active,

    /// Closed; only a repeated `close` is accepted.
    Closed,
}

/// A blocking, single-owner channel to the kernel's change-notification
/// facility.
///
/// The channel owns the notification descriptor and a reusable read
/// buffer. All methods take `&mut self`: the design assumes
/// single-threaded ownership, and callers that need to share a channel
/// must synchronize externally.
///
/// Dropping the channel releases the descriptor, so every exit path,
/// including early errors after [`WatchChannel::open`], cleans up.
pub struct WatchChannel {
    /// Notification descriptor; `None` once closed.
    fd: Option<OwnedFd>,

    /// Live subscriptions by token.
    subscriptions: HashMap<WatchToken, PathBuf>,

    /// Reusable read buffer. Only the bytes of the most recent read are
    /// ever parsed; the tail beyond the read length is stale.
    buffer: Vec<u8>,
}

impl WatchChannel {
    /// Open a new notification channel in the [`ChannelState::Idle`] state.
    pub fn open() -> Result<Self> {
        // SAFETY: no pointer arguments.
        let fd = unsafe { libc::inotify_init1(libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(WatchError::ChannelUnavailable {
                source: io::Error::last_os_error(),
            });
        }

        debug!(fd, "opened notification channel");
        Ok(Self {
            // SAFETY: the descriptor was just returned by inotify_init1
            // and nothing else owns it.
            fd: Some(unsafe { OwnedFd::from_raw_fd(fd) }),
            subscriptions: HashMap::new(),
            buffer: vec![0u8; EVENT_BUF_LEN],
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChannelState {
        match (&self.fd, self.subscriptions.is_empty()) {
            (None, _) => ChannelState::Closed,
            (Some(_), true) => ChannelState::Idle,
            (Some(_), false) => ChannelState::Active,
        }
    }

    /// Paths with a live subscription.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.subscriptions.values().cloned().collect()
    }

    /// Register interest in events under `path`.
    ///
    /// The caller is responsible for verifying that `path` exists and is
    /// a directory; the channel does not pre-validate and forwards
    /// whatever the kernel reports as [`WatchError::PathNotWatchable`].
    pub fn subscribe(&mut self, path: &Path, interest: Interest) -> Result<WatchToken> {
        let fd = self.descriptor()?;
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            WatchError::PathNotWatchable {
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::InvalidInput),
            }
        })?;

        // SAFETY: c_path is a valid NUL-terminated string for the
        // duration of the call.
        let wd = unsafe { libc::inotify_add_watch(fd, c_path.as_ptr(), interest.bits()) };
        if wd < 0 {
            let source = io::Error::last_os_error();
            return Err(match source.raw_os_error() {
                Some(libc::ENOSPC) => WatchError::SubscriptionLimitExceeded,
                _ => WatchError::PathNotWatchable {
                    path: path.to_path_buf(),
                    source,
                },
            });
        }

        let token = WatchToken(wd);
        self.subscriptions.insert(token, path.to_path_buf());
        info!(path = %path.display(), wd, "subscribed");
        Ok(token)
    }

    /// Remove one subscription.
    ///
    /// Idempotent: an unknown or already-removed token is an `Ok` no-op.
    /// Removing the last subscription returns the channel to
    /// [`ChannelState::Idle`].
    pub fn unsubscribe(&mut self, token: WatchToken) -> Result<()> {
        let fd = self.descriptor()?;
        let Some(path) = self.subscriptions.remove(&token) else {
            return Ok(());
        };

        // SAFETY: plain descriptor syscall, no pointers.
        if unsafe { libc::inotify_rm_watch(fd, token.0) } < 0 {
            // The kernel drops watches on its own when the watched
            // directory disappears; the table entry was the only thing
            // left to clean up.
            debug!(wd = token.0, "watch already removed by the kernel");
        }
        info!(path = %path.display(), wd = token.0, "unsubscribed");
        Ok(())
    }

    /// Block until at least one reportable event arrives, then return the
    /// whole decoded batch in delivery order.
    ///
    /// A read that decodes to only administrative records blocks again,
    /// so a successful return always carries at least one event.
    pub fn poll_events(&mut self) -> Result<Vec<Event>> {
        loop {
            let len = self.read_blocking()?;
            let events = decode_batch(&self.buffer[..len])?;
            if !events.is_empty() {
                return Ok(events);
            }
            debug!(len, "read carried no reportable events, blocking again");
        }
    }

    /// Like [`WatchChannel::poll_events`], but gives up once `timeout`
    /// has elapsed, returning `Ok(None)` if nothing reportable arrived.
    pub fn poll_events_timeout(&mut self, timeout: Duration) -> Result<Option<Vec<Event>>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !self.wait_readable(remaining)? {
                return Ok(None);
            }

            let len = self.read_blocking()?;
            let events = decode_batch(&self.buffer[..len])?;
            if !events.is_empty() {
                return Ok(Some(events));
            }
        }
    }

    /// Close the channel: release every subscription, then the descriptor.
    ///
    /// Idempotent; after the first call every operation except `close`
    /// fails with [`WatchError::ChannelClosed`].
    pub fn close(&mut self) {
        let Some(fd) = self.fd.take() else {
            return;
        };

        for (token, path) in self.subscriptions.drain() {
            // SAFETY: plain descriptor syscall, no pointers.
            if unsafe { libc::inotify_rm_watch(fd.as_raw_fd(), token.0) } < 0 {
                debug!(wd = token.0, path = %path.display(), "watch already gone at close");
            }
        }

        info!("closed notification channel");
        // `fd` drops here and releases the descriptor.
    }

    fn descriptor(&self) -> Result<RawFd> {
        match &self.fd {
            Some(fd) => Ok(fd.as_raw_fd()),
            None => Err(WatchError::ChannelClosed),
        }
    }

    /// One blocking read into the reusable buffer, retried on EINTR.
    /// Returns the number of bytes actually read.
    fn read_blocking(&mut self) -> Result<usize> {
        let fd = self.descriptor()?;
        loop {
            // SAFETY: the buffer is valid for writes of its full length
            // for the duration of the call.
            let n = unsafe { libc::read(fd, self.buffer.as_mut_ptr().cast(), self.buffer.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }

            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            warn!(error = %err, "read on notification channel failed");
            return Err(WatchError::ReadError { source: err });
        }
    }

    /// Wait until the descriptor is readable or `timeout` elapses.
    fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        let fd = self.descriptor()?;
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let mut pollfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };

        loop {
            // SAFETY: `pollfd` points at one valid struct for the call.
            let rc = unsafe { libc::poll(&mut pollfd, 1, millis) };
            if rc >= 0 {
                return Ok(rc > 0);
            }

            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(WatchError::ReadError { source: err });
        }
    }
}

impl Drop for WatchChannel {
    fn drop(&mut self) {
        self.close();
    }
}

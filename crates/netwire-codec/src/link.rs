//! Exact transfer over a shared channel slot.
//!
//! A [`Link`] owns the channel on behalf of every reader and writer cloned
//! from it. Each transfer loops the channel's partial send/receive until the
//! whole buffer has moved. Any transport fault shuts the channel down and
//! clears the slot before the error reaches the caller, so no further I/O is
//! ever attempted through a failed channel.

use std::io::{ErrorKind as IoErrorKind, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use netwire_transport::Channel;
use tracing::debug;

use crate::error::{AttachError, Result, WireError};

enum Slot<C> {
    Vacant,
    Open(Arc<C>),
    Released,
}

/// Shared handle to one channel.
///
/// Clones refer to the same slot; tearing down through any clone releases
/// the channel for all of them.
pub struct Link<C> {
    slot: Arc<Mutex<Slot<C>>>,
}

impl<C> Clone for Link<C> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<C: Channel> Link<C> {
    /// Wrap an already-connected channel.
    pub fn new(channel: C) -> Self {
        Self::with_slot(Slot::Open(Arc::new(channel)))
    }

    /// A link with no channel yet. Every transfer fails with
    /// [`WireError::NotAttached`] until [`Link::attach`] is called.
    pub fn detached() -> Self {
        Self::with_slot(Slot::Vacant)
    }

    fn with_slot(slot: Slot<C>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(slot)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<C>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach a channel to a detached link.
    ///
    /// A link that already carried a channel cannot be reused. A refused
    /// channel is returned inside the error, never shut down or dropped.
    pub fn attach(&self, channel: C) -> std::result::Result<(), AttachError<C>> {
        let mut slot = self.lock();
        match *slot {
            Slot::Vacant => {
                *slot = Slot::Open(Arc::new(channel));
                Ok(())
            }
            Slot::Open(_) => Err(AttachError::new(WireError::AlreadyAttached, channel)),
            Slot::Released => Err(AttachError::new(WireError::Released, channel)),
        }
    }

    fn channel(&self) -> Result<Arc<C>> {
        match &*self.lock() {
            Slot::Open(channel) => Ok(Arc::clone(channel)),
            Slot::Vacant => Err(WireError::NotAttached),
            Slot::Released => Err(WireError::Released),
        }
    }

    /// Whether a channel was ever attached.
    pub fn is_attached(&self) -> bool {
        !matches!(*self.lock(), Slot::Vacant)
    }

    /// Whether the channel is open and still reports a peer.
    pub fn is_connected(&self) -> bool {
        match &*self.lock() {
            Slot::Open(channel) => channel.is_connected(),
            Slot::Vacant | Slot::Released => false,
        }
    }

    /// Fill `dest` completely from the channel.
    ///
    /// An empty `dest` returns immediately without touching the channel.
    pub fn receive_exact(&self, dest: &mut [u8]) -> Result<()> {
        if dest.is_empty() {
            return Ok(());
        }
        let channel = self.channel()?;
        self.fill(&channel, dest, 0, dest.len())
    }

    /// Send all of `src` over the channel.
    ///
    /// An empty `src` returns immediately without touching the channel.
    pub fn send_exact(&self, src: &[u8]) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        let channel = self.channel()?;

        let mut offset = 0usize;
        while offset < src.len() {
            match channel.send_some(&src[offset..]) {
                Ok(0) => {
                    return Err(self.fail(WireError::ConnectionReset {
                        expected: src.len(),
                        transferred: offset,
                    }))
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == IoErrorKind::Interrupted => continue,
                Err(err) => return Err(self.fail(classify(err, src.len(), offset))),
            }
        }
        Ok(())
    }

    /// Receive exactly `len` bytes and write them to `sink` as they arrive.
    ///
    /// `chunk` bounds how much is buffered between channel and sink. The
    /// call fails unless all `len` bytes arrive, even though earlier chunks
    /// may already have been written to the sink.
    pub fn receive_into<W: Write + ?Sized>(
        &self,
        sink: &mut W,
        len: usize,
        chunk: &mut [u8],
    ) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        debug_assert!(!chunk.is_empty(), "relay chunk must not be empty");
        let channel = self.channel()?;

        let mut done = 0usize;
        while done < len {
            let want = chunk.len().min(len - done);
            self.fill(&channel, &mut chunk[..want], done, len)?;
            sink.write_all(&chunk[..want]).map_err(WireError::Stream)?;
            done += want;
        }
        Ok(())
    }

    fn fill(&self, channel: &C, dest: &mut [u8], base: usize, total: usize) -> Result<()> {
        let mut filled = 0usize;
        while filled < dest.len() {
            match channel.receive_some(&mut dest[filled..]) {
                Ok(0) => {
                    return Err(self.fail(WireError::ConnectionReset {
                        expected: total,
                        transferred: base + filled,
                    }))
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == IoErrorKind::Interrupted => continue,
                Err(err) => return Err(self.fail(classify(err, total, base + filled))),
            }
        }
        Ok(())
    }

    /// Route an error through the teardown policy and hand it back.
    pub fn fail(&self, err: WireError) -> WireError {
        if err.is_transport_fault() && self.teardown() {
            debug!(error = %err, "channel torn down after transport fault");
        }
        err
    }

    /// Shut down and release the channel if it is open.
    ///
    /// Best-effort: a failing shutdown is logged and discarded. Returns
    /// `true` only for the call that actually released the channel.
    pub fn teardown(&self) -> bool {
        let channel = {
            let mut slot = self.lock();
            match std::mem::replace(&mut *slot, Slot::Released) {
                Slot::Open(channel) => channel,
                other => {
                    *slot = other;
                    return false;
                }
            }
        };

        if let Err(err) = channel.shutdown() {
            debug!(error = %err, "ignoring channel shutdown error");
        }
        drop(channel);
        true
    }

    /// Explicit disconnect.
    ///
    /// Idempotent once a channel was attached; a link that never carried a
    /// channel reports [`WireError::NotAttached`].
    pub fn disconnect(&self) -> Result<()> {
        if !self.is_attached() {
            return Err(WireError::NotAttached);
        }
        if self.teardown() {
            debug!("channel disconnected");
        }
        Ok(())
    }
}

fn classify(err: std::io::Error, expected: usize, transferred: usize) -> WireError {
    match err.kind() {
        IoErrorKind::ConnectionReset
        | IoErrorKind::ConnectionAborted
        | IoErrorKind::BrokenPipe
        | IoErrorKind::UnexpectedEof => WireError::ConnectionReset {
            expected,
            transferred,
        },
        _ => WireError::Transport(err),
    }
}

impl<C> std::fmt::Debug for Link<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match *self.slot.lock().unwrap_or_else(PoisonError::into_inner) {
            Slot::Vacant => "vacant",
            Slot::Open(_) => "open",
            Slot::Released => "released",
        };
        f.debug_struct("Link").field("state", &state).finish()
    }
}

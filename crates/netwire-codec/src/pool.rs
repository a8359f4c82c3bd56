//! Scratch buffers for variable-length encode/decode.
//!
//! A [`Scratch`] is borrowed from a [`ScratchPool`] for exactly one read or
//! write call and goes back to the pool when dropped, including when the
//! call bails out with an error.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Buffers whose capacity grew past this are freed instead of pooled.
pub const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// Upper bound on idle buffers kept by one pool.
pub const MAX_IDLE_BUFFERS: usize = 64;

const DEFAULT_BUFFER_CAPACITY: usize = 1024;

type Idle = Arc<Mutex<Vec<Vec<u8>>>>;

/// A pooled byte buffer sized for one call.
pub struct Scratch {
    buffer: Vec<u8>,
    idle: Idle,
}

impl Deref for Scratch {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for Scratch {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if self.buffer.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        self.buffer.clear();
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE_BUFFERS {
            idle.push(std::mem::take(&mut self.buffer));
        }
    }
}

/// Thread-safe pool of scratch buffers.
///
/// Cloning a pool yields another handle to the same idle set.
#[derive(Clone)]
pub struct ScratchPool {
    idle: Idle,
}

impl ScratchPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            idle: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The process-wide pool shared by every reader and writer that was not
    /// given its own.
    pub fn shared() -> Self {
        static SHARED: OnceLock<ScratchPool> = OnceLock::new();
        SHARED.get_or_init(ScratchPool::new).clone()
    }

    /// Borrow a zero-filled buffer of exactly `len` bytes.
    pub fn acquire(&self, len: usize) -> Scratch {
        let mut buffer = self.acquire_empty();
        buffer.resize(len, 0);
        buffer
    }

    /// Borrow an empty buffer for incremental encoding.
    pub fn acquire_empty(&self) -> Scratch {
        let buffer = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(DEFAULT_BUFFER_CAPACITY));

        Scratch {
            buffer,
            idle: Arc::clone(&self.idle),
        }
    }

    /// Number of idle buffers ready for reuse.
    pub fn available(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScratchPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchPool")
            .field("available", &self.available())
            .finish()
    }
}

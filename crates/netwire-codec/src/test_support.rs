use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use netwire_transport::Channel;

/// In-memory channel that hands out inbound bytes at most `max_chunk` at a
/// time and records everything sent through it.
///
/// An empty inbound queue reads as a closed peer.
pub(crate) struct ScriptedChannel {
    inbound: Mutex<VecDeque<u8>>,
    outbound: Mutex<Vec<u8>>,
    max_chunk: usize,
    receive_error: Mutex<Option<io::ErrorKind>>,
    send_error: Mutex<Option<io::ErrorKind>>,
    shutdown_error: Mutex<Option<io::ErrorKind>>,
    interrupt_next: AtomicBool,
    receive_calls: AtomicUsize,
    send_calls: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl ScriptedChannel {
    pub(crate) fn new(inbound: &[u8]) -> Arc<Self> {
        Self::fragmented(inbound, usize::MAX)
    }

    pub(crate) fn fragmented(inbound: &[u8], max_chunk: usize) -> Arc<Self> {
        Arc::new(Self {
            inbound: Mutex::new(inbound.iter().copied().collect()),
            outbound: Mutex::new(Vec::new()),
            max_chunk,
            receive_error: Mutex::new(None),
            send_error: Mutex::new(None),
            shutdown_error: Mutex::new(None),
            interrupt_next: AtomicBool::new(false),
            receive_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
        })
    }

    pub(crate) fn push_inbound(&self, bytes: &[u8]) {
        self.inbound.lock().unwrap().extend(bytes.iter().copied());
    }

    pub(crate) fn fail_receive(&self, kind: io::ErrorKind) {
        *self.receive_error.lock().unwrap() = Some(kind);
    }

    pub(crate) fn fail_send(&self, kind: io::ErrorKind) {
        *self.send_error.lock().unwrap() = Some(kind);
    }

    /// Make every shutdown fail with `kind` after it has been counted.
    pub(crate) fn fail_shutdown(&self, kind: io::ErrorKind) {
        *self.shutdown_error.lock().unwrap() = Some(kind);
    }

    pub(crate) fn interrupt_next(&self) {
        self.interrupt_next.store(true, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<u8> {
        self.outbound.lock().unwrap().clone()
    }

    pub(crate) fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl Channel for ScriptedChannel {
    fn send_some(&self, buf: &[u8]) -> io::Result<usize> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.interrupt_next.swap(false, Ordering::SeqCst) {
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        if let Some(kind) = *self.send_error.lock().unwrap() {
            return Err(io::Error::from(kind));
        }
        let n = buf.len().min(self.max_chunk);
        self.outbound.lock().unwrap().extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn receive_some(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        if self.interrupt_next.swap(false, Ordering::SeqCst) {
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        if let Some(kind) = *self.receive_error.lock().unwrap() {
            return Err(io::Error::from(kind));
        }
        let mut inbound = self.inbound.lock().unwrap();
        let n = buf.len().min(self.max_chunk).min(inbound.len());
        for slot in buf.iter_mut().take(n) {
            *slot = inbound.pop_front().unwrap();
        }
        Ok(n)
    }

    fn shutdown(&self) -> io::Result<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        match *self.shutdown_error.lock().unwrap() {
            Some(kind) => Err(io::Error::from(kind)),
            None => Ok(()),
        }
    }

    fn is_connected(&self) -> bool {
        self.shutdowns.load(Ordering::SeqCst) == 0
    }
}

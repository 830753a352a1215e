use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::SerialPort;

/// One direction of an in-memory link.
#[derive(Debug, Default)]
struct Lane {
    buf: BytesMut,
    closed: bool,
}

type SharedLane = Arc<Mutex<Lane>>;

/// In-memory serial port.
///
/// Each port has an inbound lane it reads from and an outbound lane it writes
/// to. Depending on the constructor the lanes are private to the port
/// ([`new`](MemoryPort::new)), crossed with a second port
/// ([`pair`](MemoryPort::pair)), or the same lane
/// ([`loopback`](MemoryPort::loopback)).
///
/// Clones made with [`SerialPort::try_clone`] share the lanes, so a receiver and
/// a writer can each own a handle onto one link.
#[derive(Debug, Clone)]
pub struct MemoryPort {
    inbound: SharedLane,
    outbound: SharedLane,
    read_limit: Option<usize>,
    flushes: Arc<AtomicUsize>,
}

impl MemoryPort {
    /// A standalone port: inbound bytes come from [`inject`](Self::inject),
    /// outbound bytes are collected for [`take_written`](Self::take_written).
    pub fn new() -> Self {
        Self::from_lanes(SharedLane::default(), SharedLane::default())
    }

    /// Two ports wired back to back, like the two ends of a null-modem cable.
    pub fn pair() -> (Self, Self) {
        let a_to_b = SharedLane::default();
        let b_to_a = SharedLane::default();
        let left = Self::from_lanes(Arc::clone(&b_to_a), Arc::clone(&a_to_b));
        let right = Self::from_lanes(a_to_b, b_to_a);
        (left, right)
    }

    /// A port whose writes arrive on its own inbound side.
    pub fn loopback() -> Self {
        let lane = SharedLane::default();
        Self::from_lanes(Arc::clone(&lane), lane)
    }

    fn from_lanes(inbound: SharedLane, outbound: SharedLane) -> Self {
        Self {
            inbound,
            outbound,
            read_limit: None,
            flushes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Cap the number of bytes a single `read` call returns.
    ///
    /// Simulates a driver that hands data over in small pieces.
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit.max(1));
        self
    }

    /// Append bytes to this port's inbound lane, as if the peer had sent them.
    pub fn inject(&self, bytes: &[u8]) {
        self.inbound.lock().buf.extend_from_slice(bytes);
    }

    /// Remove and return everything written to the outbound lane so far.
    pub fn take_written(&self) -> Vec<u8> {
        let mut lane = self.outbound.lock();
        let written = lane.buf.to_vec();
        lane.buf.clear();
        written
    }

    /// Number of bytes sitting in the outbound lane.
    pub fn pending_output(&self) -> usize {
        self.outbound.lock().buf.len()
    }

    /// How many times `flush` has been called through any handle of this port.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Mark both lanes closed. Subsequent operations through any handle fail
    /// with [`TransportError::Disconnected`].
    pub fn disconnect(&self) {
        self.inbound.lock().closed = true;
        self.outbound.lock().closed = true;
        debug!("memory port disconnected");
    }
}

impl Default for MemoryPort {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialPort for MemoryPort {
    fn bytes_available(&self) -> Result<usize> {
        let lane = self.inbound.lock();
        if lane.closed {
            return Err(TransportError::Disconnected);
        }
        Ok(lane.buf.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut lane = self.inbound.lock();
        if lane.closed {
            return Err(TransportError::Disconnected);
        }
        let mut n = buf.len().min(lane.buf.len());
        if let Some(limit) = self.read_limit {
            n = n.min(limit);
        }
        lane.buf.copy_to_slice(&mut buf[..n]);
        trace!(bytes = n, "memory port read");
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let mut lane = self.outbound.lock();
        if lane.closed {
            return Err(TransportError::Disconnected);
        }
        lane.buf.extend_from_slice(buf);
        trace!(bytes = buf.len(), "memory port write");
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.outbound.lock().closed {
            return Err(TransportError::Disconnected);
        }
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn discard_input(&mut self) -> Result<()> {
        let mut lane = self.inbound.lock();
        if lane.closed {
            return Err(TransportError::Disconnected);
        }
        debug!(bytes = lane.buf.len(), "discarding inbound buffer");
        lane.buf.clear();
        Ok(())
    }

    fn try_clone(&self) -> Result<Self> {
        if self.inbound.lock().closed {
            return Err(TransportError::Disconnected);
        }
        Ok(self.clone())
    }
}

//! In-process broadcast segment.
//!
//! Every link attached to a [`MemorySegment`] sees every frame sent on it,
//! including its own, the way a packet socket sees its own outgoing
//! broadcasts. Short payloads are zero-padded to the Ethernet minimum before
//! delivery so receivers exercise the same padding removal as on a real wire.

use super::{strip_padding, FrameLink, TransportError, MIN_ETHERNET_PAYLOAD};
use parking_lot::Mutex;
use pnet_base::MacAddr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Default receive poll interval for attached links.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Default payload limit (Ethernet MTU).
pub const DEFAULT_MAX_PAYLOAD: usize = 1500;

struct Port {
    id: u32,
    tx: Sender<Vec<u8>>,
}

#[derive(Default)]
struct SegmentState {
    ports: Vec<Port>,
    next_id: u32,
}

impl SegmentState {
    /// Deliver a wire payload to every port, dropping ports whose link is gone.
    fn broadcast(&mut self, wire: &[u8]) -> usize {
        self.ports.retain(|port| port.tx.send(wire.to_vec()).is_ok());
        self.ports.len()
    }
}

/// A simulated broadcast domain.
#[derive(Clone)]
pub struct MemorySegment {
    state: Arc<Mutex<SegmentState>>,
    poll_interval: Duration,
    max_payload: usize,
}

impl MemorySegment {
    /// Create an empty segment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SegmentState::default())),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Set how long attached links wait in `recv` before returning `None`.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the largest payload attached links accept.
    #[must_use]
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Attach a new link with its own locally administered hardware address.
    #[must_use]
    pub fn attach(&self) -> MemoryLink {
        let (tx, rx) = mpsc::channel();
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.ports.push(Port { id, tx });

        let [a, b, c, d] = id.to_be_bytes();
        MemoryLink {
            id,
            mac: MacAddr::new(0x02, 0x00, a, b, c, d),
            segment: Arc::clone(&self.state),
            rx: Mutex::new(rx),
            poll_interval: self.poll_interval,
            max_payload: self.max_payload,
        }
    }

    /// Put raw payload bytes on the wire as if some station had sent them.
    ///
    /// The bytes are delivered unmodified (no padding added), so tests can
    /// inject garbage or hand-padded payloads. Returns the receiver count.
    pub fn inject(&self, wire: &[u8]) -> usize {
        self.state.lock().broadcast(wire)
    }

    /// Number of attached links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.state.lock().ports.len()
    }
}

impl Default for MemorySegment {
    fn default() -> Self {
        Self::new()
    }
}

/// A link attached to a [`MemorySegment`].
pub struct MemoryLink {
    id: u32,
    mac: MacAddr,
    segment: Arc<Mutex<SegmentState>>,
    rx: Mutex<Receiver<Vec<u8>>>,
    poll_interval: Duration,
    max_payload: usize,
}

impl FrameLink for MemoryLink {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        if payload.len() > self.max_payload {
            return Err(TransportError::PayloadTooLarge {
                len: payload.len(),
                max: self.max_payload,
            });
        }

        let mut wire = payload.to_vec();
        if wire.len() < MIN_ETHERNET_PAYLOAD {
            wire.resize(MIN_ETHERNET_PAYLOAD, 0);
        }

        let receivers = self.segment.lock().broadcast(&wire);
        trace!(link = self.id, bytes = wire.len(), receivers, "Frame sent on segment");
        Ok(())
    }

    fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        match self.rx.lock().recv_timeout(self.poll_interval) {
            Ok(wire) => Ok(Some(strip_padding(&wire))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
        }
    }

    fn hardware_addr(&self) -> MacAddr {
        self.mac
    }

    fn max_payload(&self) -> usize {
        self.max_payload
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        let id = self.id;
        self.segment.lock().ports.retain(|port| port.id != id);
    }
}

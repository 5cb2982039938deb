//! # Frame Transport
//!
//! The link-layer port the bus sends and receives through.
//!
//! ## Available Links
//!
//! - `ethernet` - raw broadcast frames on a named network interface
//! - `memory` - an in-process broadcast segment for tests and local wiring
//!
//! Both links return frame payloads with padding already removed.

pub mod ethernet;
pub mod memory;

pub use ethernet::EthernetLink;
pub use memory::{MemoryLink, MemorySegment};

use pnet_base::MacAddr;
use thiserror::Error;

/// Ethernet header length (destination, source, EtherType).
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Minimum Ethernet payload; shorter payloads are zero-padded on the wire.
pub const MIN_ETHERNET_PAYLOAD: usize = 46;

/// Errors from the link layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No interface with this name exists.
    #[error("could not detect interface {name}")]
    InterfaceNotFound {
        /// The requested interface name.
        name: String,
    },

    /// The interface has no hardware address to send from.
    #[error("interface {name} has no hardware address")]
    NoHardwareAddress {
        /// The interface name.
        name: String,
    },

    /// The raw channel could not be opened (commonly a privilege problem).
    #[error("failed to open link on {name}: {source}")]
    Connect {
        /// The interface name.
        name: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The interface produced a channel that does not carry Ethernet frames.
    #[error("interface {name} does not provide an Ethernet channel")]
    UnsupportedChannel {
        /// The interface name.
        name: String,
    },

    /// The payload does not fit in a single frame.
    #[error("payload of {len} bytes exceeds frame limit of {max} bytes")]
    PayloadTooLarge {
        /// Payload length.
        len: usize,
        /// Maximum payload for this link.
        max: usize,
    },

    /// The outgoing frame could not be built.
    #[error("failed to build frame: {reason}")]
    FrameBuild {
        /// Error description.
        reason: String,
    },

    /// Writing a frame failed.
    #[error("failed to send frame: {0}")]
    Send(#[source] std::io::Error),

    /// Reading a frame failed.
    #[error("failed to receive frame: {0}")]
    Receive(#[source] std::io::Error),

    /// A received frame could not be parsed.
    #[error("malformed frame of {len} bytes")]
    MalformedFrame {
        /// Length of the raw frame.
        len: usize,
    },

    /// The link has been detached or closed.
    #[error("link closed")]
    Closed,
}

/// A broadcast-capable link-layer connection.
///
/// # Thread Safety
///
/// The publish path calls `send` while the dispatcher thread blocks in
/// `recv`; implementations must allow both concurrently.
pub trait FrameLink: Send + Sync {
    /// Broadcast `payload` as a single frame.
    fn send(&self, payload: &[u8]) -> Result<(), TransportError>;

    /// Wait for the next frame addressed to this link's protocol.
    ///
    /// Returns `Ok(None)` when the poll interval elapses without one, so the
    /// caller can check for shutdown. Returned payloads are padding-free.
    fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Hardware address frames are sent from.
    fn hardware_addr(&self) -> MacAddr;

    /// Largest payload `send` accepts.
    fn max_payload(&self) -> usize;
}

/// Remove link padding from a received payload.
///
/// Drops every zero byte. Envelopes are JSON, which never contains a raw
/// zero byte, so this recovers the original bytes exactly.
#[must_use]
pub fn strip_padding(payload: &[u8]) -> Vec<u8> {
    payload.iter().copied().filter(|&b| b != 0).collect()
}

//! Raw Ethernet link.
//!
//! Opens a layer-2 channel on a named interface. Every frame is sent to the
//! broadcast address; received frames of other EtherTypes are skipped.

use super::{strip_padding, FrameLink, TransportError, ETHERNET_HEADER_LEN};
use crate::config::BusConfig;
use parking_lot::Mutex;
use pnet_base::MacAddr;
use pnet_datalink::{Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};
use pnet_packet::ethernet::{EtherType, EthernetPacket, MutableEthernetPacket};
use pnet_packet::Packet;
use std::io::ErrorKind;
use tracing::{debug, trace};

/// Find an interface by exact name.
pub fn resolve_interface(name: &str) -> Result<NetworkInterface, TransportError> {
    pnet_datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| TransportError::InterfaceNotFound {
            name: name.to_string(),
        })
}

/// Build a broadcast frame carrying `payload`.
pub fn build_frame(
    source: MacAddr,
    ether_type: u16,
    payload: &[u8],
) -> Result<Vec<u8>, TransportError> {
    let mut buffer = vec![0u8; ETHERNET_HEADER_LEN + payload.len()];
    let mut frame =
        MutableEthernetPacket::new(&mut buffer).ok_or_else(|| TransportError::FrameBuild {
            reason: format!("buffer of {} bytes too short", ETHERNET_HEADER_LEN + payload.len()),
        })?;

    frame.set_destination(MacAddr::broadcast());
    frame.set_source(source);
    frame.set_ethertype(EtherType::new(ether_type));
    frame.set_payload(payload);

    Ok(buffer)
}

/// Extract the payload of a raw frame.
///
/// Returns `Ok(None)` for frames of another EtherType.
pub fn parse_frame(raw: &[u8], ether_type: u16) -> Result<Option<Vec<u8>>, TransportError> {
    let frame =
        EthernetPacket::new(raw).ok_or(TransportError::MalformedFrame { len: raw.len() })?;

    if frame.get_ethertype() != EtherType::new(ether_type) {
        return Ok(None);
    }

    Ok(Some(strip_padding(frame.payload())))
}

/// Broadcast link bound to one network interface.
///
/// The send and receive halves sit behind separate locks, so a publish
/// never waits on a blocked receive.
pub struct EthernetLink {
    interface: NetworkInterface,
    source: MacAddr,
    ether_type: u16,
    max_payload: usize,
    tx: Mutex<Box<dyn DataLinkSender>>,
    rx: Mutex<Box<dyn DataLinkReceiver>>,
}

impl EthernetLink {
    /// Resolve the configured interface and open a raw channel on it.
    ///
    /// # Errors
    ///
    /// - `InterfaceNotFound` / `NoHardwareAddress` if the interface is unusable
    /// - `Connect` if the channel cannot be opened (e.g. missing privilege)
    pub fn open(config: &BusConfig) -> Result<Self, TransportError> {
        let interface = resolve_interface(&config.interface)?;
        let source = interface
            .mac
            .ok_or_else(|| TransportError::NoHardwareAddress {
                name: interface.name.clone(),
            })?;

        let channel_config = pnet_datalink::Config {
            read_timeout: Some(config.read_timeout),
            ..Default::default()
        };

        let (tx, rx) = match pnet_datalink::channel(&interface, channel_config) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => {
                return Err(TransportError::UnsupportedChannel {
                    name: interface.name.clone(),
                })
            }
            Err(e) => {
                return Err(TransportError::Connect {
                    name: interface.name.clone(),
                    source: e,
                })
            }
        };

        debug!(
            interface = %interface.name,
            mac = %source,
            ether_type = %format!("{:#06x}", config.ether_type),
            "Ethernet link opened"
        );

        Ok(Self {
            interface,
            source,
            ether_type: config.ether_type,
            max_payload: config.max_payload,
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
        })
    }

    /// Name of the bound interface.
    #[must_use]
    pub fn interface_name(&self) -> &str {
        &self.interface.name
    }
}

impl FrameLink for EthernetLink {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        if payload.len() > self.max_payload {
            return Err(TransportError::PayloadTooLarge {
                len: payload.len(),
                max: self.max_payload,
            });
        }

        let frame = build_frame(self.source, self.ether_type, payload)?;

        match self.tx.lock().send_to(&frame, None) {
            Some(Ok(())) => {
                trace!(bytes = frame.len(), "Frame sent");
                Ok(())
            }
            Some(Err(e)) => Err(TransportError::Send(e)),
            None => Err(TransportError::Send(std::io::Error::new(
                ErrorKind::Other,
                "sender rejected frame",
            ))),
        }
    }

    fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut rx = self.rx.lock();
        match rx.next() {
            Ok(raw) => parse_frame(raw, self.ether_type),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(None),
            Err(e) => Err(TransportError::Receive(e)),
        }
    }

    fn hardware_addr(&self) -> MacAddr {
        self.source
    }

    fn max_payload(&self) -> usize {
        self.max_payload
    }
}

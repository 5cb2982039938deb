//! # Ether Bus - Publish/Subscribe over Ethernet Broadcast
//!
//! Participants on one LAN segment exchange topic-tagged messages as raw
//! Ethernet broadcast frames with a dedicated EtherType. There is no broker:
//! every participant sees every frame and filters against its own
//! subscriptions.
//!
//! ## Message Path
//!
//! ```text
//! ┌──────────────┐   publish()    ┌──────────────┐
//! │  Publisher   │ ─── encode ──► │  FrameLink   │ ══ broadcast frame ══╗
//! └──────────────┘                └──────────────┘                      ║
//!                                                                       ▼
//! ┌──────────────┐   deliver      ┌──────────────┐   recv + strip  ┌──────────┐
//! │ MessageStream│ ◄── match ──── │  Dispatcher  │ ◄── padding ─── │ FrameLink│
//! └──────────────┘                └──────────────┘                 └──────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ether_bus::Bus;
//!
//! let mut bus = Bus::new("wlan0")?;
//! bus.subscribe("fermenter")?;
//! let mut messages = bus.listen()?;
//! while let Some(msg) = messages.blocking_recv() {
//!     println!("{}: {}", msg.topic(), msg.payload());
//! }
//! ```
//!
//! ## Delivery Semantics
//!
//! - No durability, acknowledgement or retry
//! - Receive order is preserved on the delivery stream
//! - Topic matching is exact and case-sensitive
//! - A topic subscribed N times is delivered N times

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod publisher;
pub mod registry;
pub mod stream;
pub mod transport;

// Re-export main types
pub use bus::{Bus, DispatcherState};
pub use config::{BusConfig, DEFAULT_ETHER_TYPE};
pub use dispatcher::{Dispatcher, DispatcherHandle, StatsSnapshot};
pub use envelope::{CodecError, Message};
pub use error::BusError;
pub use publisher::{PublishError, Publisher};
pub use registry::{SubscriptionError, SubscriptionRegistry};
pub use stream::{MessageStream, StreamError};
pub use transport::{EthernetLink, FrameLink, MemoryLink, MemorySegment, TransportError};

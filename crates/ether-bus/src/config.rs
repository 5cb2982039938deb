//! Bus configuration.

use std::env;
use std::time::Duration;

/// EtherType reserved for bus traffic.
pub const DEFAULT_ETHER_TYPE: u16 = 0xCCCC;

/// Default interface when none is configured.
pub const DEFAULT_INTERFACE: &str = "eth0";

/// Largest envelope carried in one frame (Ethernet MTU).
pub const DEFAULT_MAX_PAYLOAD: usize = 1500;

/// How long a receive waits before the dispatcher re-checks for shutdown.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Messages buffered between the dispatcher and the consumer.
pub const DEFAULT_DELIVERY_CAPACITY: usize = 1000;

/// Configuration for a bus instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Network interface to bind (e.g. `eth0`, `wlan0`).
    pub interface: String,
    /// EtherType stamped on every frame and used to filter incoming ones.
    pub ether_type: u16,
    /// Maximum envelope size in bytes.
    pub max_payload: usize,
    /// Receive poll interval.
    pub read_timeout: Duration,
    /// Delivery stream capacity; the dispatcher stalls while it is full.
    pub delivery_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            interface: DEFAULT_INTERFACE.to_string(),
            ether_type: DEFAULT_ETHER_TYPE,
            max_payload: DEFAULT_MAX_PAYLOAD,
            read_timeout: DEFAULT_READ_TIMEOUT,
            delivery_capacity: DEFAULT_DELIVERY_CAPACITY,
        }
    }
}

impl BusConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ETHER_BUS_INTERFACE`: interface name (default: eth0)
    /// - `ETHER_BUS_ETHER_TYPE`: EtherType, hex (`0xCCCC`) or decimal (default: 0xCCCC)
    /// - `ETHER_BUS_MAX_PAYLOAD`: maximum envelope bytes (default: 1500)
    /// - `ETHER_BUS_READ_TIMEOUT_MS`: receive poll interval (default: 250)
    /// - `ETHER_BUS_DELIVERY_CAPACITY`: delivery stream capacity (default: 1000)
    ///
    /// Unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            interface: env::var("ETHER_BUS_INTERFACE").unwrap_or(defaults.interface),

            ether_type: env::var("ETHER_BUS_ETHER_TYPE")
                .ok()
                .and_then(|v| parse_ether_type(&v))
                .unwrap_or(defaults.ether_type),

            max_payload: env::var("ETHER_BUS_MAX_PAYLOAD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_payload),

            read_timeout: env::var("ETHER_BUS_READ_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.read_timeout),

            delivery_capacity: env::var("ETHER_BUS_DELIVERY_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.delivery_capacity),
        }
    }

    /// Config with short timeouts for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            interface: "test0".to_string(),
            read_timeout: Duration::from_millis(20),
            delivery_capacity: 64,
            ..Self::default()
        }
    }

    /// Set the interface name.
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Set the EtherType.
    #[must_use]
    pub fn with_ether_type(mut self, ether_type: u16) -> Self {
        self.ether_type = ether_type;
        self
    }

    /// Set the maximum envelope size.
    #[must_use]
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Set the receive poll interval.
    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Set the delivery stream capacity (at least 1).
    #[must_use]
    pub fn with_delivery_capacity(mut self, capacity: usize) -> Self {
        self.delivery_capacity = capacity.max(1);
        self
    }
}

/// Parse an EtherType written as hex (`0xCCCC`) or decimal (`52428`).
pub fn parse_ether_type(value: &str) -> Option<u16> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

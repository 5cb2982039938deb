//! # Ether Telemetry
//!
//! Logging setup for processes that embed the bus.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ether_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     init_logging(&TelemetryConfig::from_env()).expect("Failed to init logging");
//!     // bus code here
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ETHER_BUS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `ETHER_BUS_JSON_LOGS` | `false` | Emit JSON lines |
//! | `ETHER_BUS_LOG_TARGETS` | `true` | Include the module target |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_logging, try_init_test_logging};

use thiserror::Error;

/// Errors from telemetry setup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed.
    #[error("failed to install subscriber: {0}")]
    Init(String),
}

//! Bus-level errors.

use crate::publisher::PublishError;
use crate::registry::SubscriptionError;
use crate::transport::TransportError;
use thiserror::Error;

/// Errors surfaced by [`crate::Bus`].
#[derive(Debug, Error)]
pub enum BusError {
    /// The interface name did not resolve to a usable interface.
    #[error("interface resolution failed: {0}")]
    InterfaceResolution(#[source] TransportError),

    /// The raw broadcast connection could not be opened.
    #[error("connection failed: {0}")]
    Connection(#[source] TransportError),

    /// A publish failed.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// A subscription change was rejected.
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    /// `listen` was already called on this bus.
    #[error("bus is already listening")]
    AlreadyListening,

    /// The dispatcher thread could not be started.
    #[error("failed to start dispatcher: {0}")]
    Spawn(#[source] std::io::Error),
}

impl BusError {
    /// Classify a transport failure that happened while opening the bus.
    #[must_use]
    pub fn from_open(error: TransportError) -> Self {
        match error {
            TransportError::InterfaceNotFound { .. } | TransportError::NoHardwareAddress { .. } => {
                Self::InterfaceResolution(error)
            }
            other => Self::Connection(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_classification() {
        let missing = BusError::from_open(TransportError::InterfaceNotFound {
            name: "bad1".into(),
        });
        assert!(matches!(missing, BusError::InterfaceResolution(_)));
        assert_eq!(
            missing.to_string(),
            "interface resolution failed: could not detect interface bad1"
        );

        let denied = BusError::from_open(TransportError::Connect {
            name: "eth0".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });
        assert!(matches!(denied, BusError::Connection(_)));
    }
}

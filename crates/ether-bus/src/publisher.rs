//! # Publisher
//!
//! Encodes a message and broadcasts it as one frame. A single attempt per
//! call; retry policy belongs to the caller.

use crate::envelope::{self, CodecError};
use crate::transport::{FrameLink, TransportError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The message could not be encoded.
    #[error("publish: {0}")]
    Encode(#[from] CodecError),

    /// The frame could not be sent.
    #[error("publish: {0}")]
    Send(#[from] TransportError),
}

/// Sending half of the bus.
#[derive(Clone)]
pub struct Publisher {
    link: Arc<dyn FrameLink>,
    published: Arc<AtomicU64>,
}

impl Publisher {
    /// Create a publisher over a link.
    pub fn new(link: Arc<dyn FrameLink>) -> Self {
        Self {
            link,
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Broadcast `payload` under `topic`.
    pub fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError> {
        let bytes = envelope::encode(topic, payload)?;

        if let Err(e) = self.link.send(&bytes) {
            warn!(topic = %topic, error = %e, "Publish failed");
            return Err(e.into());
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        debug!(topic = %topic, bytes = bytes.len(), "Message published");
        Ok(())
    }

    /// Messages successfully handed to the link.
    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

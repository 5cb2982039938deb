//! # Dispatcher
//!
//! Background receive loop: read a frame, decode the envelope, match the
//! topic against the current subscriptions, push matches to the delivery
//! stream.
//!
//! ## Failure Policy
//!
//! Nothing a single frame contains can stop the loop. Receive failures are
//! logged at WARN, undecodable frames at DEBUG; both are dropped and never
//! reach the delivery stream.
//!
//! ## Lifecycle
//!
//! The loop runs on a dedicated thread until one of:
//! - the stop flag is raised (checked before every receive)
//! - the delivery stream is dropped
//! - the link reports it is closed

use crate::envelope::{self, Message};
use crate::registry::SubscriptionRegistry;
use crate::stream::MessageStream;
use crate::transport::{FrameLink, TransportError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, trace, warn};

/// Name of the dispatcher thread.
pub const DISPATCHER_THREAD_NAME: &str = "ether-bus-dispatcher";

/// Pause after a failed receive before reading again.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// First retry interval while the delivery stream is full.
const DELIVERY_RETRY_MIN: Duration = Duration::from_millis(1);

/// Longest retry interval while the delivery stream is full.
const DELIVERY_RETRY_MAX: Duration = Duration::from_millis(50);

/// Whether the loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next frame.
    Continue,
    /// Leave the loop.
    Halt,
}

/// What happened to one received payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Delivered this many copies (one per matching subscription entry).
    Delivered(usize),
    /// Decoded, but no subscription matched.
    Unmatched,
    /// Not a valid envelope; dropped.
    Undecodable,
    /// The dispatcher is stopping or the stream is gone; not delivered.
    Halted,
}

/// Counters maintained by the dispatcher.
#[derive(Debug, Default)]
pub struct DispatcherStats {
    frames_received: AtomicU64,
    receive_errors: AtomicU64,
    decode_errors: AtomicU64,
    messages_delivered: AtomicU64,
}

/// Point-in-time copy of [`DispatcherStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames of our EtherType read from the link.
    pub frames_received: u64,
    /// Failed reads.
    pub receive_errors: u64,
    /// Frames that were not valid envelopes.
    pub decode_errors: u64,
    /// Messages pushed to the delivery stream, duplicates included.
    pub messages_delivered: u64,
}

impl DispatcherStats {
    /// Read all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
        }
    }
}

/// Number of snapshot entries exactly equal to `topic`.
///
/// Case-sensitive, no wildcards. Duplicate entries each count.
#[must_use]
pub fn count_matches(snapshot: &[String], topic: &str) -> usize {
    snapshot.iter().filter(|t| *t == topic).count()
}

/// Next retry interval for a full stream: doubles up to [`DELIVERY_RETRY_MAX`].
fn next_delivery_backoff(current: Duration) -> Duration {
    (current * 2).min(DELIVERY_RETRY_MAX)
}

/// The receive loop and its state.
pub struct Dispatcher {
    link: Arc<dyn FrameLink>,
    registry: SubscriptionRegistry,
    sender: mpsc::Sender<Message>,
    stop: Arc<AtomicBool>,
    stats: Arc<DispatcherStats>,
}

impl Dispatcher {
    /// Create a dispatcher and the stream it delivers to.
    ///
    /// `capacity` is clamped to at least 1.
    pub fn new(
        link: Arc<dyn FrameLink>,
        registry: SubscriptionRegistry,
        capacity: usize,
    ) -> (Self, MessageStream) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let dispatcher = Self {
            link,
            registry,
            sender,
            stop: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(DispatcherStats::default()),
        };
        (dispatcher, MessageStream::new(receiver))
    }

    /// Shared counters.
    #[must_use]
    pub fn stats(&self) -> Arc<DispatcherStats> {
        Arc::clone(&self.stats)
    }

    /// Run the loop on a named thread.
    pub fn spawn(self) -> std::io::Result<DispatcherHandle> {
        let stop = Arc::clone(&self.stop);
        let stats = Arc::clone(&self.stats);

        let thread = thread::Builder::new()
            .name(DISPATCHER_THREAD_NAME.to_string())
            .spawn(move || self.run())?;

        Ok(DispatcherHandle {
            stop,
            stats,
            thread: Some(thread),
        })
    }

    /// Run the loop on the current thread until it halts.
    pub fn run(&self) {
        debug!("Dispatcher started");

        while !self.stop.load(Ordering::Acquire) {
            if self.step() == Flow::Halt {
                break;
            }
        }

        let stats = self.stats.snapshot();
        info!(
            frames = stats.frames_received,
            delivered = stats.messages_delivered,
            receive_errors = stats.receive_errors,
            decode_errors = stats.decode_errors,
            "Dispatcher stopped"
        );
    }

    /// One loop iteration: receive at most one frame and route it.
    pub fn step(&self) -> Flow {
        if self.sender.is_closed() {
            debug!("Delivery stream dropped");
            return Flow::Halt;
        }

        let payload = match self.link.recv() {
            Ok(Some(payload)) => payload,
            Ok(None) => return Flow::Continue,
            Err(TransportError::Closed) => {
                warn!("Link closed, dispatcher exiting");
                return Flow::Halt;
            }
            Err(e) => {
                self.stats.receive_errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Failed to receive frame");
                thread::sleep(RECEIVE_ERROR_BACKOFF);
                return Flow::Continue;
            }
        };

        self.stats.frames_received.fetch_add(1, Ordering::Relaxed);

        match self.route(&payload) {
            Routed::Halted => Flow::Halt,
            _ => Flow::Continue,
        }
    }

    /// Decode a padding-free payload and deliver it once per matching
    /// subscription entry.
    pub fn route(&self, payload: &[u8]) -> Routed {
        let message = match envelope::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                self.stats.decode_errors.fetch_add(1, Ordering::Relaxed);
                debug!(error = %e, bytes = payload.len(), "Dropping undecodable frame");
                return Routed::Undecodable;
            }
        };

        let snapshot = self.registry.snapshot();
        let matches = count_matches(&snapshot, message.topic());
        if matches == 0 {
            trace!(topic = %message.topic(), "No subscription for topic");
            return Routed::Unmatched;
        }

        let topic = message.topic().to_string();
        for copy in vec![message; matches] {
            if !self.deliver(copy) {
                return Routed::Halted;
            }
            self.stats.messages_delivered.fetch_add(1, Ordering::Relaxed);
        }

        debug!(topic = %topic, copies = matches, "Message delivered");
        Routed::Delivered(matches)
    }

    /// Push onto the stream, waiting while it is full.
    ///
    /// The wait backs off exponentially while the consumer stays stalled. The
    /// stop flag is checked between attempts. Returns `false` if the stream
    /// is gone or a stop was requested.
    fn deliver(&self, message: Message) -> bool {
        let mut pending = message;
        let mut backoff = DELIVERY_RETRY_MIN;
        loop {
            match self.sender.try_send(pending) {
                Ok(()) => return true,
                Err(TrySendError::Closed(_)) => return false,
                Err(TrySendError::Full(message)) => {
                    if self.stop.load(Ordering::Acquire) {
                        return false;
                    }
                    pending = message;
                    thread::sleep(backoff);
                    backoff = next_delivery_backoff(backoff);
                }
            }
        }
    }
}

/// Handle to a running dispatcher thread.
///
/// Dropping the handle stops the thread and waits for it.
pub struct DispatcherHandle {
    stop: Arc<AtomicBool>,
    stats: Arc<DispatcherStats>,
    thread: Option<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// Ask the loop to exit before its next receive.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Stop the loop and wait for the thread to finish.
    pub fn shutdown(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Dispatcher thread panicked");
            }
        }
    }

    /// Whether the thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

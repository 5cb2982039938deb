//! # Delivery Stream
//!
//! Consumer side of the channel between the dispatcher and client code.

use crate::envelope::Message;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_stream::Stream;

/// Errors from the delivery stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The dispatcher has stopped and every buffered message was read.
    #[error("delivery stream closed")]
    Closed,
}

/// Messages matching the local subscriptions, in receive order.
///
/// Yields `None` once the dispatcher has stopped and the buffer is drained.
/// Dropping the stream stops the dispatcher at its next frame.
pub struct MessageStream {
    receiver: mpsc::Receiver<Message>,
}

impl MessageStream {
    pub(crate) fn new(receiver: mpsc::Receiver<Message>) -> Self {
        Self { receiver }
    }

    /// Wait for the next message.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Wait for the next message from synchronous code.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<Message> {
        self.receiver.blocking_recv()
    }

    /// Take a message if one is buffered.
    ///
    /// - `Ok(Some(message))` - a message was ready
    /// - `Ok(None)` - nothing buffered yet
    /// - `Err(StreamError::Closed)` - the dispatcher has stopped
    pub fn try_recv(&mut self) -> Result<Option<Message>, StreamError> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(StreamError::Closed),
        }
    }
}

impl Stream for MessageStream {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

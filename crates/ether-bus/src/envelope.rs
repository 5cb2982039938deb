//! # Envelope Codec
//!
//! Encodes a `(topic, payload)` pair into the bytes carried by one Ethernet
//! frame, and decodes them back.
//!
//! ## Wire Format
//!
//! The envelope is a UTF-8 JSON object:
//!
//! ```text
//! {"tpc":"fermenter","Payload":"20.5"}
//! ```
//!
//! Publishers already deployed on the wire emit the payload under the
//! `Payload` key. Decoding also accepts `pyld` and `payload`. Unknown keys
//! are ignored.
//!
//! JSON escapes control characters, so an encoded envelope never contains a
//! raw zero byte. Zero bytes seen by the receiver are therefore always link
//! padding (see [`crate::transport::strip_padding`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from encoding or decoding an envelope.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The message could not be serialized.
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    /// The bytes are not a valid envelope.
    #[error("failed to decode envelope: {0}")]
    Decode(#[source] serde_json::Error),

    /// The envelope carries an empty topic.
    #[error("envelope topic is empty")]
    EmptyTopic,
}

/// A topic-tagged message.
///
/// Immutable once constructed; equality is by field values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "tpc")]
    topic: String,

    #[serde(rename = "Payload", alias = "pyld", alias = "payload")]
    payload: String,
}

impl Message {
    /// Create a message.
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// The topic this message was published under.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The message body.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Split into `(topic, payload)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.topic, self.payload)
    }
}

/// Borrowed view used on the encode path so publishing does not copy strings.
#[derive(Serialize)]
struct EnvelopeRef<'a> {
    #[serde(rename = "tpc")]
    topic: &'a str,
    #[serde(rename = "Payload")]
    payload: &'a str,
}

/// Encode a topic and payload into envelope bytes.
pub fn encode(topic: &str, payload: &str) -> Result<Vec<u8>, CodecError> {
    if topic.is_empty() {
        return Err(CodecError::EmptyTopic);
    }
    serde_json::to_vec(&EnvelopeRef { topic, payload }).map_err(CodecError::Encode)
}

/// Encode an existing message.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, CodecError> {
    encode(message.topic(), message.payload())
}

/// Decode envelope bytes into a message.
///
/// Fails on malformed JSON, a missing field, or an empty topic.
pub fn decode(bytes: &[u8]) -> Result<Message, CodecError> {
    let message: Message = serde_json::from_slice(bytes).map_err(CodecError::Decode)?;
    if message.topic.is_empty() {
        return Err(CodecError::EmptyTopic);
    }
    Ok(message)
}

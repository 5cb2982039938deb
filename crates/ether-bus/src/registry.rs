//! # Subscription Registry
//!
//! Ordered list of topics the local bus delivers. Duplicates are kept: a
//! topic added twice is matched, and delivered, twice.
//!
//! The list is shared between the bus handle and the dispatcher thread
//! behind a reader-writer lock, so subscriptions may change while the
//! dispatcher runs. Changes apply from the next received frame.

use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Empty topics can never be delivered.
    #[error("topic must not be empty")]
    EmptyTopic,
}

/// Shared, ordered topic list.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    topics: Arc<RwLock<Vec<String>>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a topic.
    pub fn add(&self, topic: impl Into<String>) -> Result<(), SubscriptionError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(SubscriptionError::EmptyTopic);
        }
        self.topics.write().push(topic);
        Ok(())
    }

    /// Remove every entry equal to `topic`. Returns how many were removed.
    pub fn remove(&self, topic: &str) -> usize {
        let mut topics = self.topics.write();
        let before = topics.len();
        topics.retain(|t| t != topic);
        before - topics.len()
    }

    /// Copy of the current topics, in subscription order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.topics.read().clone()
    }

    /// Whether at least one entry equals `topic`.
    #[must_use]
    pub fn contains(&self, topic: &str) -> bool {
        self.topics.read().iter().any(|t| t == topic)
    }

    /// Number of entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.read().len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.read().is_empty()
    }
}

//! Subscription Entities
//!
//! Addresses, resource handles, subscriptions and the per-analyst record
//! that keeps subscribers in two mirrored structures.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of an analyst or subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque identifier of a provisioned subscription resource.
///
/// The registry stores and returns it; it never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionHandle(String);

impl SubscriptionHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One subscriber's active relationship with one analyst.
///
/// Immutable once created; `calls` is the budget granted at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub subscriber: Address,
    pub analyst: Address,
    pub calls: u64,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(handle: SubscriptionHandle, subscriber: Address, analyst: Address, calls: u64) -> Self {
        Self {
            handle,
            subscriber,
            analyst,
            calls,
            created_at: Utc::now(),
        }
    }
}

/// Everything the registry knows about one analyst.
///
/// `subscribers` holds exactly the keys of `subscriptions`, without
/// duplicates. A subscriber's position in `subscribers` is its index for
/// index-based lookups, and that position changes whenever anyone
/// unsubscribes (see [`AnalystRecord::remove`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalystRecord {
    subscribers: Vec<Address>,
    subscriptions: HashMap<Address, Subscription>,
}

impl AnalystRecord {
    pub fn count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn subscribers(&self) -> &[Address] {
        &self.subscribers
    }

    pub fn contains(&self, subscriber: &Address) -> bool {
        self.subscriptions.contains_key(subscriber)
    }

    pub fn subscription(&self, subscriber: &Address) -> Option<&Subscription> {
        self.subscriptions.get(subscriber)
    }

    /// Subscriber at `index`; `None` for negative or out-of-range positions.
    pub fn subscriber_at(&self, index: i64) -> Option<&Address> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.subscribers.get(i))
    }

    /// Appends a subscriber; its index is the previous count.
    ///
    /// Returns `false` and changes nothing if the subscriber is already present.
    #[must_use]
    pub(crate) fn insert(&mut self, subscription: Subscription) -> bool {
        if self.contains(&subscription.subscriber) {
            return false;
        }
        self.subscribers.push(subscription.subscriber.clone());
        self.subscriptions
            .insert(subscription.subscriber.clone(), subscription);
        true
    }

    /// Removes a subscriber with swap-and-truncate: the last subscriber moves
    /// into the vacated slot. Indices held by callers are invalid afterwards.
    pub(crate) fn remove(&mut self, subscriber: &Address) -> Option<Subscription> {
        let position = self.subscribers.iter().position(|s| s == subscriber)?;
        let subscription = self.subscriptions.remove(subscriber)?;
        self.subscribers.swap_remove(position);
        Some(subscription)
    }

    /// True when both structures hold the same subscribers, once each.
    pub fn is_consistent(&self) -> bool {
        self.subscribers.len() == self.subscriptions.len()
            && self.subscribers.iter().all(|s| {
                self.subscriptions
                    .get(s)
                    .is_some_and(|sub| &sub.subscriber == s)
            })
    }
}

//! Registry Notifications
//!
//! Fan-out of committed events over a broadcast channel. Notifications are an
//! observable side channel; nothing in the registry reads them back.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::operations::events::{Subscribed, Unsubscribed};
use crate::usecase::DomainEvent;

/// Default buffer size of the notification channel.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum RegistryNotification {
    Subscribed(Subscribed),
    Unsubscribed(Unsubscribed),
}

impl RegistryNotification {
    pub fn event(&self) -> &dyn DomainEvent {
        match self {
            Self::Subscribed(e) => e,
            Self::Unsubscribed(e) => e,
        }
    }
}

impl From<Subscribed> for RegistryNotification {
    fn from(event: Subscribed) -> Self {
        Self::Subscribed(event)
    }
}

impl From<Unsubscribed> for RegistryNotification {
    fn from(event: Unsubscribed) -> Self {
        Self::Unsubscribed(event)
    }
}

/// Broadcasts notifications to every live listener.
///
/// Slow listeners that fall more than `capacity` notifications behind see
/// `RecvError::Lagged`; the registry itself never waits on them.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<RegistryNotification>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn listen(&self) -> broadcast::Receiver<RegistryNotification> {
        self.sender.subscribe()
    }

    /// Returns how many listeners received the notification.
    pub fn publish(&self, notification: RegistryNotification) -> usize {
        let event_type = notification.event().event_type().to_string();
        match self.sender.send(notification) {
            Ok(listeners) => {
                trace!(event_type = %event_type, listeners, "Published notification");
                listeners
            }
            Err(_) => {
                debug!(event_type = %event_type, "No notification listeners");
                0
            }
        }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

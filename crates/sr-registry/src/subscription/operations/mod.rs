//! Subscription Operations
//!
//! Commands that change the registry. Reads live on
//! [`SubscriptionRegistry`](crate::SubscriptionRegistry).

pub mod events;
pub mod subscribe;
pub mod unsubscribe;

pub use events::*;
pub use subscribe::{SubscribeCommand, SubscribeUseCase};
pub use unsubscribe::{UnsubscribeCommand, UnsubscribeUseCase};

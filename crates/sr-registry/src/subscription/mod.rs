//! Subscription Aggregate
//!
//! Analyst/subscriber relationships, the registry that indexes them and the
//! commands that change it.

pub mod entity;
pub mod factory;
pub mod registry;
pub mod notifications;
pub mod operations;

pub use entity::{Address, AnalystRecord, Subscription, SubscriptionHandle};
pub use factory::{SubscriptionFactory, TsidSubscriptionFactory};
pub use registry::{RegistryChange, RegistryState, SubscriptionRegistry};
pub use notifications::{NotificationBus, RegistryNotification};

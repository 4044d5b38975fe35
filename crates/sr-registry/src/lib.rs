//! Subscription Registry
//!
//! Records which subscribers follow which analysts and provisions one
//! subscription resource per relationship. Every operation runs as an
//! explicit principal (the caller identity in [`ExecutionContext`]) and is
//! atomic: it either applies all of its effects or none.
//!
//! ## Module Organization
//!
//! - `subscription` - entities, the registry, factory seam, notifications, operations
//! - `usecase` - execution context, results, errors, domain events, unit of work
//! - `audit` - audit trail of committed commands
//! - `shared` - registry errors and TSID generation
//!
//! ## Roles
//!
//! | Operation                        | Caller acts as |
//! |----------------------------------|----------------|
//! | `subscribe`, `unsubscribe`       | subscriber     |
//! | `get_subscription_from_address`  | subscriber     |
//! | `count_subscriptions`, `list_subscribers` | analyst |
//! | `get_subscriber_by_index`, `get_subscription_by_index` | analyst |
//! | `get_subscription_by_address`, `get_subscription_record` | analyst |

pub mod audit;
pub mod service;
pub mod shared;
pub mod subscription;
pub mod usecase;

pub use shared::error::{ProvisioningError, RegistryError, Result};
pub use shared::tsid::TsidGenerator;

pub use usecase::{
    DomainEvent, EventMetadata, ExecutionContext, InMemoryUnitOfWork, UnitOfWork, UseCaseError,
    UseCaseResult,
};

pub use audit::AuditEntry;
pub use service::RegistryService;
pub use subscription::{
    Address, AnalystRecord, NotificationBus, RegistryChange, RegistryNotification, RegistryState,
    Subscription, SubscriptionFactory, SubscriptionHandle, SubscriptionRegistry,
    TsidSubscriptionFactory,
};
pub use subscription::factory::DEFAULT_HANDLE_PREFIX;
pub use subscription::notifications::DEFAULT_NOTIFICATION_CAPACITY;
pub use subscription::operations::{
    SubscribeCommand, SubscribeUseCase, Subscribed, UnsubscribeCommand, UnsubscribeUseCase,
    Unsubscribed,
};

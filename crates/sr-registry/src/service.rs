//! Registry Service
//!
//! Wires the registry, the factory and the unit of work into one handle for
//! callers that do not need to assemble use cases themselves.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::audit::AuditEntry;
use crate::subscription::entity::Address;
use crate::subscription::factory::{SubscriptionFactory, TsidSubscriptionFactory};
use crate::subscription::notifications::{
    NotificationBus, RegistryNotification, DEFAULT_NOTIFICATION_CAPACITY,
};
use crate::subscription::operations::{
    SubscribeCommand, SubscribeUseCase, Subscribed, UnsubscribeCommand, UnsubscribeUseCase,
    Unsubscribed,
};
use crate::subscription::registry::SubscriptionRegistry;
use crate::usecase::{ExecutionContext, InMemoryUnitOfWork, UseCaseResult};

pub struct RegistryService {
    registry: Arc<SubscriptionRegistry>,
    unit_of_work: Arc<InMemoryUnitOfWork>,
    subscribe: SubscribeUseCase<InMemoryUnitOfWork>,
    unsubscribe: UnsubscribeUseCase<InMemoryUnitOfWork>,
}

impl RegistryService {
    pub fn new(factory: Arc<dyn SubscriptionFactory>, notification_capacity: usize) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let unit_of_work = Arc::new(InMemoryUnitOfWork::new(NotificationBus::new(
            notification_capacity,
        )));

        Self {
            subscribe: SubscribeUseCase::new(registry.clone(), factory, unit_of_work.clone()),
            unsubscribe: UnsubscribeUseCase::new(registry.clone(), unit_of_work.clone()),
            registry,
            unit_of_work,
        }
    }

    /// Service with the TSID handle factory and default channel capacity.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(TsidSubscriptionFactory::default()),
            DEFAULT_NOTIFICATION_CAPACITY,
        )
    }

    pub fn subscribe(
        &self,
        ctx: &ExecutionContext,
        analyst: impl Into<Address>,
        calls: i64,
    ) -> UseCaseResult<Subscribed> {
        let command = SubscribeCommand {
            analyst: analyst.into(),
            calls,
        };
        self.subscribe.execute(command, ctx)
    }

    pub fn unsubscribe(
        &self,
        ctx: &ExecutionContext,
        analyst: impl Into<Address>,
    ) -> UseCaseResult<Unsubscribed> {
        let command = UnsubscribeCommand {
            analyst: analyst.into(),
        };
        self.unsubscribe.execute(command, ctx)
    }

    /// Read side: counts, index and address lookups.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// New receiver for every notification committed from now on.
    pub fn notifications(&self) -> broadcast::Receiver<RegistryNotification> {
        self.unit_of_work.bus().listen()
    }

    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.unit_of_work.audit_log()
    }
}

impl Default for RegistryService {
    fn default() -> Self {
        Self::with_defaults()
    }
}

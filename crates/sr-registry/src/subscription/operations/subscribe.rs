//! Subscribe Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::events::Subscribed;
use crate::subscription::entity::{Address, Subscription};
use crate::subscription::factory::SubscriptionFactory;
use crate::subscription::registry::{RegistryChange, SubscriptionRegistry};
use crate::shared::error::RegistryError;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

/// The caller subscribes itself to `analyst`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeCommand {
    pub analyst: Address,

    /// Call budget; must be at least 1
    pub calls: i64,
}

pub struct SubscribeUseCase<U: UnitOfWork> {
    registry: Arc<SubscriptionRegistry>,
    factory: Arc<dyn SubscriptionFactory>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> SubscribeUseCase<U> {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        factory: Arc<dyn SubscriptionFactory>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            registry,
            factory,
            unit_of_work,
        }
    }

    /// Checks run in order: not self, budget >= 1, not already subscribed.
    /// The resource is provisioned before anything is written, so a factory
    /// failure leaves the registry untouched.
    pub fn execute(&self, command: SubscribeCommand, ctx: &ExecutionContext) -> UseCaseResult<Subscribed> {
        let requester = ctx.principal();
        debug!(%requester, analyst = %command.analyst, calls = command.calls, "Subscribe requested");

        self.registry.transaction(|state| {
            let calls = match state.check_subscribe(&requester, &command.analyst, command.calls) {
                Ok(calls) => calls,
                Err(e) => {
                    warn!(%requester, code = e.code(), error = %e, "Subscribe rejected");
                    return UseCaseResult::failure(e.into());
                }
            };

            let handle = match self.factory.provision(&requester, &command.analyst, calls) {
                Ok(handle) => handle,
                Err(e) => {
                    error!(%requester, analyst = %command.analyst, error = %e, "Provisioning failed");
                    return UseCaseResult::failure(UseCaseError::from(RegistryError::from(e)));
                }
            };

            let subscription = Subscription::new(handle, requester.clone(), command.analyst.clone(), calls);
            let event = Subscribed::new(ctx, &subscription);

            self.unit_of_work
                .commit(state, RegistryChange::Subscribe(subscription), event, &command)
        })
    }
}

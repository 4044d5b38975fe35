//! Unsubscribe Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::events::Unsubscribed;
use crate::subscription::entity::Address;
use crate::subscription::registry::{RegistryChange, SubscriptionRegistry};
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseResult};

/// The caller drops its own subscription to `analyst`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeCommand {
    pub analyst: Address,
}

pub struct UnsubscribeUseCase<U: UnitOfWork> {
    registry: Arc<SubscriptionRegistry>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> UnsubscribeUseCase<U> {
    pub fn new(registry: Arc<SubscriptionRegistry>, unit_of_work: Arc<U>) -> Self {
        Self {
            registry,
            unit_of_work,
        }
    }

    /// Removes the caller with swap-and-truncate, so the analyst's last
    /// subscriber takes over the caller's index. The resource behind the
    /// handle is left to its owner.
    pub fn execute(&self, command: UnsubscribeCommand, ctx: &ExecutionContext) -> UseCaseResult<Unsubscribed> {
        let requester = ctx.principal();
        debug!(%requester, analyst = %command.analyst, "Unsubscribe requested");

        self.registry.transaction(|state| {
            let subscription = match state.active_subscription(&command.analyst, &requester) {
                Ok(subscription) => subscription.clone(),
                Err(e) => {
                    warn!(%requester, code = e.code(), error = %e, "Unsubscribe rejected");
                    return UseCaseResult::failure(e.into());
                }
            };

            let event = Unsubscribed::new(ctx, &subscription);

            self.unit_of_work
                .commit(state, RegistryChange::Unsubscribe(subscription), event, &command)
        })
    }
}

//! Subscription Registry
//!
//! Owns every [`AnalystRecord`] behind a single lock. Commands run their
//! checks, provisioning and mutation inside one [`transaction`], so no
//! operation ever observes a half-applied change.
//!
//! Read operations below treat the caller as the analyst inspecting its own
//! record, except [`get_subscription_from_address`] where the caller is the
//! subscriber.
//!
//! [`transaction`]: SubscriptionRegistry::transaction
//! [`get_subscription_from_address`]: SubscriptionRegistry::get_subscription_from_address

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::entity::{Address, AnalystRecord, Subscription, SubscriptionHandle};
use crate::shared::error::{RegistryError, Result};
use crate::usecase::ExecutionContext;

/// A change the unit of work applies to [`RegistryState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryChange {
    Subscribe(Subscription),
    Unsubscribe(Subscription),
}

impl RegistryChange {
    pub fn subscription(&self) -> &Subscription {
        match self {
            Self::Subscribe(s) | Self::Unsubscribe(s) => s,
        }
    }
}

/// Analyst address -> record. Records are created on first subscribe and
/// never dropped, so "unknown analyst" stays distinct from "no subscribers".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryState {
    analysts: HashMap<Address, AnalystRecord>,
}

impl RegistryState {
    pub fn record(&self, analyst: &Address) -> Option<&AnalystRecord> {
        self.analysts.get(analyst)
    }

    pub fn analyst_count(&self) -> usize {
        self.analysts.len()
    }

    fn known(&self, analyst: &Address) -> Result<&AnalystRecord> {
        self.analysts
            .get(analyst)
            .ok_or_else(|| RegistryError::UnknownAnalyst { analyst: analyst.clone() })
    }

    /// Preconditions of `subscribe`, in order. Returns the validated budget.
    pub(crate) fn check_subscribe(
        &self,
        requester: &Address,
        analyst: &Address,
        calls: i64,
    ) -> Result<u64> {
        if requester == analyst {
            return Err(RegistryError::SelfSubscription { address: requester.clone() });
        }

        let budget = match u64::try_from(calls) {
            Ok(budget) if budget >= 1 => budget,
            _ => return Err(RegistryError::InvalidCallBudget { calls }),
        };

        if self.analysts.get(analyst).is_some_and(|r| r.contains(requester)) {
            return Err(RegistryError::AlreadySubscribed {
                analyst: analyst.clone(),
                subscriber: requester.clone(),
            });
        }

        Ok(budget)
    }

    /// The subscription `subscriber` holds with `analyst`, for `unsubscribe`.
    pub(crate) fn active_subscription(
        &self,
        analyst: &Address,
        subscriber: &Address,
    ) -> Result<&Subscription> {
        self.known(analyst)?
            .subscription(subscriber)
            .ok_or_else(|| RegistryError::NotSubscribed {
                analyst: analyst.clone(),
                subscriber: subscriber.clone(),
            })
    }

    /// Applies `change` to both mirrored structures, or to neither.
    pub(crate) fn apply(&mut self, change: &RegistryChange) -> Result<()> {
        match change {
            RegistryChange::Subscribe(subscription) => {
                let analyst = &subscription.analyst;
                let inserted = self
                    .analysts
                    .entry(analyst.clone())
                    .or_default()
                    .insert(subscription.clone());
                if inserted {
                    Ok(())
                } else {
                    // a duplicate implies the record already existed, so nothing was created
                    Err(RegistryError::AlreadySubscribed {
                        analyst: analyst.clone(),
                        subscriber: subscription.subscriber.clone(),
                    })
                }
            }
            RegistryChange::Unsubscribe(subscription) => {
                let analyst = &subscription.analyst;
                let subscriber = &subscription.subscriber;
                let record = self
                    .analysts
                    .get_mut(analyst)
                    .ok_or_else(|| RegistryError::UnknownAnalyst { analyst: analyst.clone() })?;
                record
                    .remove(subscriber)
                    .map(|_| ())
                    .ok_or_else(|| RegistryError::NotSubscribed {
                        analyst: analyst.clone(),
                        subscriber: subscriber.clone(),
                    })
            }
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.analysts.values().all(AnalystRecord::is_consistent)
    }
}

/// The registry: one lock around all state.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    state: Mutex<RegistryState>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with exclusive access to the whole registry.
    ///
    /// `f` must not call back into this registry; the lock is not reentrant.
    pub(crate) fn transaction<R>(&self, f: impl FnOnce(&mut RegistryState) -> R) -> R {
        let mut state = self.state.lock();
        f(&mut state)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> RegistryState {
        self.state.lock().clone()
    }

    pub fn is_consistent(&self) -> bool {
        self.state.lock().is_consistent()
    }

    /// Number of subscribers of the calling analyst; 0 when it has no record.
    pub fn count_subscriptions(&self, ctx: &ExecutionContext) -> usize {
        let analyst = ctx.principal();
        let count = self
            .state
            .lock()
            .record(&analyst)
            .map_or(0, AnalystRecord::count);
        debug!(%analyst, count, "Counted subscriptions");
        count
    }

    /// Subscribers of the calling analyst in index order; empty when it has no record.
    pub fn list_subscribers(&self, ctx: &ExecutionContext) -> Vec<Address> {
        let analyst = ctx.principal();
        self.state
            .lock()
            .record(&analyst)
            .map(|r| r.subscribers().to_vec())
            .unwrap_or_default()
    }

    /// Subscriber at `index` in the calling analyst's list.
    ///
    /// Indices are only valid until the next `unsubscribe` by anyone.
    pub fn get_subscriber_by_index(&self, ctx: &ExecutionContext, index: i64) -> Result<Address> {
        let analyst = ctx.principal();
        let state = self.state.lock();
        Self::at_index(&state, &analyst, index).map(|s| s.subscriber.clone())
    }

    /// Handle of the subscription at `index` in the calling analyst's list.
    pub fn get_subscription_by_index(
        &self,
        ctx: &ExecutionContext,
        index: i64,
    ) -> Result<SubscriptionHandle> {
        let analyst = ctx.principal();
        let state = self.state.lock();
        Self::at_index(&state, &analyst, index).map(|s| s.handle.clone())
    }

    /// Handle of `subscriber`'s subscription to the calling analyst.
    pub fn get_subscription_by_address(
        &self,
        ctx: &ExecutionContext,
        subscriber: &Address,
    ) -> Result<SubscriptionHandle> {
        self.get_subscription_record(ctx, subscriber).map(|s| s.handle)
    }

    /// Full record of `subscriber`'s subscription to the calling analyst.
    pub fn get_subscription_record(
        &self,
        ctx: &ExecutionContext,
        subscriber: &Address,
    ) -> Result<Subscription> {
        let analyst = ctx.principal();
        let state = self.state.lock();
        Self::lookup(&state, &analyst, subscriber).cloned()
    }

    /// Handle of the caller's own subscription to `analyst`.
    pub fn get_subscription_from_address(
        &self,
        ctx: &ExecutionContext,
        analyst: &Address,
    ) -> Result<SubscriptionHandle> {
        let subscriber = ctx.principal();
        let state = self.state.lock();
        Self::lookup(&state, analyst, &subscriber).map(|s| s.handle.clone())
    }

    fn at_index<'a>(
        state: &'a RegistryState,
        analyst: &Address,
        index: i64,
    ) -> Result<&'a Subscription> {
        let record = Self::logged(state.known(analyst))?;
        let found = record
            .subscriber_at(index)
            .and_then(|s| record.subscription(s))
            .ok_or(RegistryError::IndexOutOfRange { index, count: record.count() });
        Self::logged(found)
    }

    fn lookup<'a>(
        state: &'a RegistryState,
        analyst: &Address,
        subscriber: &Address,
    ) -> Result<&'a Subscription> {
        let record = Self::logged(state.known(analyst))?;
        let found = record
            .subscription(subscriber)
            .ok_or_else(|| RegistryError::UnknownSubscriber {
                analyst: analyst.clone(),
                subscriber: subscriber.clone(),
            });
        Self::logged(found)
    }

    fn logged<T>(result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(code = e.code(), error = %e, "Registry lookup rejected");
        }
        result
    }
}

//! Subscription Factory
//!
//! Provisions the resource that backs each subscription. The registry only
//! keeps the returned handle.

use tracing::debug;

use super::entity::{Address, SubscriptionHandle};
use crate::shared::error::ProvisioningError;
use crate::TsidGenerator;

/// Default prefix for handles minted by [`TsidSubscriptionFactory`].
pub const DEFAULT_HANDLE_PREFIX: &str = "sub";

/// Provisions one resource per subscription.
///
/// Called synchronously while the registry lock is held, so implementations
/// must not block for long and must not call back into the registry. A
/// failure aborts the whole `subscribe`.
pub trait SubscriptionFactory: Send + Sync {
    fn provision(
        &self,
        subscriber: &Address,
        analyst: &Address,
        calls: u64,
    ) -> Result<SubscriptionHandle, ProvisioningError>;
}

/// Mints `{prefix}-{TSID}` handles without backing infrastructure.
#[derive(Debug, Clone)]
pub struct TsidSubscriptionFactory {
    prefix: String,
}

impl TsidSubscriptionFactory {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for TsidSubscriptionFactory {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLE_PREFIX)
    }
}

impl SubscriptionFactory for TsidSubscriptionFactory {
    fn provision(
        &self,
        subscriber: &Address,
        analyst: &Address,
        calls: u64,
    ) -> Result<SubscriptionHandle, ProvisioningError> {
        if calls < 1 {
            return Err(ProvisioningError::InvalidCalls { calls });
        }

        let handle = SubscriptionHandle::new(format!("{}-{}", self.prefix, TsidGenerator::generate()));
        debug!(%subscriber, %analyst, calls, %handle, "Provisioned subscription resource");
        Ok(handle)
    }
}

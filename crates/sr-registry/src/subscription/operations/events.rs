//! Subscription Domain Events

use serde::{Deserialize, Serialize};

use crate::impl_domain_event;
use crate::subscription::entity::{Address, Subscription, SubscriptionHandle};
use crate::usecase::domain_event::EventMetadata;
use crate::usecase::ExecutionContext;

const SPEC_VERSION: &str = "1.0";
const SOURCE: &str = "registry:subscription";

fn metadata(ctx: &ExecutionContext, event_type: &str, subscription: &Subscription) -> EventMetadata {
    EventMetadata::from_context(
        ctx,
        event_type,
        SPEC_VERSION,
        SOURCE,
        format!("registry.subscription.{}", subscription.handle),
        format!("registry:analyst:{}", subscription.analyst),
    )
}

/// Emitted exactly once per successful `subscribe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscribed {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub requester: Address,
    pub subscriber: Address,
    pub analyst: Address,
    pub calls: u64,
    pub subscription: SubscriptionHandle,
}

impl_domain_event!(Subscribed);

impl Subscribed {
    pub const EVENT_TYPE: &'static str = "registry:subscription:subscribed";

    pub fn new(ctx: &ExecutionContext, subscription: &Subscription) -> Self {
        Self {
            metadata: metadata(ctx, Self::EVENT_TYPE, subscription),
            requester: ctx.principal(),
            subscriber: subscription.subscriber.clone(),
            analyst: subscription.analyst.clone(),
            calls: subscription.calls,
            subscription: subscription.handle.clone(),
        }
    }
}

/// Emitted exactly once per successful `unsubscribe`; `calls` is the
/// budget the subscription was created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unsubscribed {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub requester: Address,
    pub subscriber: Address,
    pub analyst: Address,
    pub calls: u64,
    pub subscription: SubscriptionHandle,
}

impl_domain_event!(Unsubscribed);

impl Unsubscribed {
    pub const EVENT_TYPE: &'static str = "registry:subscription:unsubscribed";

    pub fn new(ctx: &ExecutionContext, subscription: &Subscription) -> Self {
        Self {
            metadata: metadata(ctx, Self::EVENT_TYPE, subscription),
            requester: ctx.principal(),
            subscriber: subscription.subscriber.clone(),
            analyst: subscription.analyst.clone(),
            calls: subscription.calls,
            subscription: subscription.handle.clone(),
        }
    }
}

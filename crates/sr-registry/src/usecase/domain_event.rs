//! Domain Event Trait
//!
//! Notifications emitted by registry commands. Named in past tense
//! (`Subscribed`, not `Subscribe`).
//!
//! - Event type: `{app}:{aggregate}:{action}`, e.g. `registry:subscription:subscribed`
//! - Subject: `{app}.{aggregate}.{id}`, e.g. `registry.subscription.sub-0HZXEQ5Y8JY5Z`
//! - Message group: events in the same group are delivered in commit order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub trait DomainEvent: Send + Sync {
    fn event_id(&self) -> &str;

    fn event_type(&self) -> &str;

    fn spec_version(&self) -> &str;

    fn source(&self) -> &str;

    fn subject(&self) -> &str;

    fn time(&self) -> DateTime<Utc>;

    fn execution_id(&self) -> &str;

    fn correlation_id(&self) -> &str;

    fn causation_id(&self) -> Option<&str>;

    /// Principal whose command produced this event.
    fn principal_id(&self) -> &str;

    fn message_group(&self) -> &str;

    /// Serialize the event-specific data payload to JSON.
    fn to_data_json(&self) -> String;
}

/// Common metadata for domain events.
///
/// Event structs embed this as a `metadata` field and get the trait via
/// [`impl_domain_event!`](crate::impl_domain_event).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub event_id: String,
    pub event_type: String,
    pub spec_version: String,
    pub source: String,
    pub subject: String,
    pub time: DateTime<Utc>,
    pub execution_id: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
    pub principal_id: String,
    pub message_group: String,
}

impl EventMetadata {
    /// Build metadata for an event raised inside `ctx`.
    pub fn from_context(
        ctx: &super::ExecutionContext,
        event_type: &str,
        spec_version: &str,
        source: &str,
        subject: String,
        message_group: String,
    ) -> Self {
        Self {
            event_id: crate::TsidGenerator::generate(),
            event_type: event_type.to_string(),
            spec_version: spec_version.to_string(),
            source: source.to_string(),
            subject,
            time: Utc::now(),
            execution_id: ctx.execution_id.clone(),
            correlation_id: ctx.correlation_id.clone(),
            causation_id: ctx.causation_id.clone(),
            principal_id: ctx.principal_id.clone(),
            message_group,
        }
    }
}

/// Implements [`DomainEvent`] by delegating to a field named `metadata`.
#[macro_export]
macro_rules! impl_domain_event {
    ($event_type:ty) => {
        impl $crate::usecase::DomainEvent for $event_type {
            fn event_id(&self) -> &str {
                &self.metadata.event_id
            }

            fn event_type(&self) -> &str {
                &self.metadata.event_type
            }

            fn spec_version(&self) -> &str {
                &self.metadata.spec_version
            }

            fn source(&self) -> &str {
                &self.metadata.source
            }

            fn subject(&self) -> &str {
                &self.metadata.subject
            }

            fn time(&self) -> chrono::DateTime<chrono::Utc> {
                self.metadata.time
            }

            fn execution_id(&self) -> &str {
                &self.metadata.execution_id
            }

            fn correlation_id(&self) -> &str {
                &self.metadata.correlation_id
            }

            fn causation_id(&self) -> Option<&str> {
                self.metadata.causation_id.as_deref()
            }

            fn principal_id(&self) -> &str {
                &self.metadata.principal_id
            }

            fn message_group(&self) -> &str {
                &self.metadata.message_group
            }

            fn to_data_json(&self) -> String {
                serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
            }
        }
    };
}

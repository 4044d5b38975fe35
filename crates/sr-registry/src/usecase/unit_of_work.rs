//! Unit of Work
//!
//! Applies a registry change, records its audit entry and publishes its
//! event as one step, inside the caller's registry transaction.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info};

use super::domain_event::DomainEvent;
use super::error::UseCaseError;
use super::result::UseCaseResult;
use crate::audit::AuditEntry;
use crate::subscription::notifications::{NotificationBus, RegistryNotification};
use crate::subscription::registry::{RegistryChange, RegistryState};

/// The only way to produce a successful [`UseCaseResult`].
///
/// Called with the registry lock held, after every precondition passed and
/// the resource was provisioned:
///
/// ```ignore
/// self.registry.transaction(|state| {
///     let budget = state.check_subscribe(&requester, &command.analyst, command.calls)?;
///     let handle = self.factory.provision(&requester, &command.analyst, budget)?;
///     let subscription = Subscription::new(handle, requester, analyst, budget);
///     let event = Subscribed::new(ctx, &subscription);
///     self.unit_of_work.commit(state, RegistryChange::Subscribe(subscription), event, &command)
/// })
/// ```
///
/// The trait is sealed: committing needs crate-internal access to the
/// registry state, so only this crate provides implementations.
///
/// ```compile_fail
/// use sr_registry::UnitOfWork;
///
/// struct Outside;
///
/// impl UnitOfWork for Outside {
///     fn commit<E, C>(
///         &self,
///         _state: &mut sr_registry::RegistryState,
///         _change: sr_registry::RegistryChange,
///         event: E,
///         _command: &C,
///     ) -> sr_registry::UseCaseResult<E>
///     where
///         E: sr_registry::DomainEvent + serde::Serialize + Clone + Into<sr_registry::RegistryNotification>,
///         C: serde::Serialize,
///     {
///         unimplemented!()
///     }
/// }
/// ```
pub trait UnitOfWork: sealed::Sealed + Send + Sync {
    /// If applying `change` fails nothing is recorded or published and the
    /// state is unchanged.
    fn commit<E, C>(
        &self,
        state: &mut RegistryState,
        change: RegistryChange,
        event: E,
        command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Clone + Into<RegistryNotification>,
        C: Serialize;
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::InMemoryUnitOfWork {}
}

/// In-process unit of work: in-memory audit trail plus a notification bus.
#[derive(Debug, Default)]
pub struct InMemoryUnitOfWork {
    bus: NotificationBus,
    audit: Mutex<Vec<AuditEntry>>,
}

impl InMemoryUnitOfWork {
    pub fn new(bus: NotificationBus) -> Self {
        Self {
            bus,
            audit: Mutex::new(Vec::new()),
        }
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.audit.lock().clone()
    }

    fn create_audit_entry<E: DomainEvent, C: Serialize>(
        change: &RegistryChange,
        event: &E,
        command: &C,
    ) -> AuditEntry {
        let command_name = std::any::type_name::<C>()
            .rsplit("::")
            .next()
            .unwrap_or("Unknown")
            .to_string();

        AuditEntry::new(
            change.subscription().handle.as_str(),
            command_name,
            serde_json::to_string(command).ok(),
            event.principal_id(),
        )
        .with_performed_at(event.time())
    }
}

impl UnitOfWork for InMemoryUnitOfWork {
    fn commit<E, C>(
        &self,
        state: &mut RegistryState,
        change: RegistryChange,
        event: E,
        command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Clone + Into<RegistryNotification>,
        C: Serialize,
    {
        if let Err(e) = state.apply(&change) {
            error!(code = e.code(), error = %e, event_type = event.event_type(), "Commit rejected");
            return UseCaseResult::failure(UseCaseError::from(e));
        }

        self.audit
            .lock()
            .push(Self::create_audit_entry(&change, &event, command));

        let listeners = self.bus.publish(event.clone().into());
        info!(
            event_type = event.event_type(),
            subject = event.subject(),
            principal = event.principal_id(),
            listeners,
            "Committed registry change"
        );

        UseCaseResult::success(event)
    }
}

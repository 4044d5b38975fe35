//! Execution Context
//!
//! The principal a registry operation runs as, plus tracing IDs. The calling
//! layer (an authenticated session, a connection, the dev console) builds the
//! context; operations never take the caller's identity from anywhere else.

use chrono::{DateTime, Utc};

use crate::shared::tsid::TsidGenerator;
use crate::subscription::entity::Address;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique ID for this execution (generated)
    pub execution_id: String,
    /// ID for distributed tracing (usually from original request)
    pub correlation_id: String,
    /// ID of the event that caused this execution (if any)
    pub causation_id: Option<String>,
    /// Caller identity
    pub principal_id: String,
    pub initiated_at: DateTime<Utc>,
}

impl ExecutionContext {
    /// Context for a fresh request; correlation starts as the execution ID.
    pub fn create(principal_id: impl Into<String>) -> Self {
        let exec_id = format!("exec-{}", TsidGenerator::generate());
        Self {
            execution_id: exec_id.clone(),
            correlation_id: exec_id,
            causation_id: None,
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }

    /// Context carrying a correlation ID from an upstream system.
    pub fn with_correlation(
        principal_id: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            execution_id: format!("exec-{}", TsidGenerator::generate()),
            correlation_id: correlation_id.into(),
            causation_id: None,
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }

    /// Child context within the same execution, caused by `causing_event_id`.
    pub fn with_causation(&self, causing_event_id: impl Into<String>) -> Self {
        Self {
            execution_id: self.execution_id.clone(),
            correlation_id: self.correlation_id.clone(),
            causation_id: Some(causing_event_id.into()),
            principal_id: self.principal_id.clone(),
            initiated_at: Utc::now(),
        }
    }

    /// The caller as a registry address.
    pub fn principal(&self) -> Address {
        Address::new(self.principal_id.as_str())
    }
}

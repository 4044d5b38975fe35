//! Audit Entry Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TsidGenerator;

/// One committed command. Rejected commands leave no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,

    /// Resource handle of the subscription the command touched
    pub entity_id: String,

    /// Command type name, e.g. "SubscribeCommand"
    pub operation: String,

    /// Full command payload as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_json: Option<String>,

    pub principal_id: String,

    pub performed_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        entity_id: impl Into<String>,
        operation: impl Into<String>,
        operation_json: Option<String>,
        principal_id: impl Into<String>,
    ) -> Self {
        Self {
            id: TsidGenerator::generate(),
            entity_id: entity_id.into(),
            operation: operation.into(),
            operation_json,
            principal_id: principal_id.into(),
            performed_at: Utc::now(),
        }
    }

    pub fn with_performed_at(mut self, performed_at: DateTime<Utc>) -> Self {
        self.performed_at = performed_at;
        self
    }
}

//! Audit trail of committed registry commands.

pub mod entity;

pub use entity::AuditEntry;

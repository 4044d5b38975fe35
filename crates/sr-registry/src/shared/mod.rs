//! Shared building blocks: error types and ID generation.

pub mod error;
pub mod tsid;

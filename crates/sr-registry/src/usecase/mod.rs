//! Use Case Infrastructure
//!
//! - `UseCaseResult<T>` - sealed result type for command outcomes
//! - `UseCaseError` - categorized error types for consistent handling
//! - `DomainEvent` - trait for the notifications a command emits
//! - `ExecutionContext` - principal and tracing IDs for one invocation
//! - `UnitOfWork` - atomic apply of registry change + audit entry + event

pub mod result;
pub mod error;
pub mod domain_event;
pub mod execution_context;
pub mod unit_of_work;

pub use result::UseCaseResult;
pub use error::UseCaseError;
pub use domain_event::{DomainEvent, EventMetadata};
pub use execution_context::ExecutionContext;
pub use unit_of_work::{InMemoryUnitOfWork, UnitOfWork};

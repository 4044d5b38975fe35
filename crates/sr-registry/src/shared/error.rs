//! Registry Error Types

use thiserror::Error;

use crate::subscription::entity::Address;
use crate::usecase::UseCaseError;
use crate::details;

/// Failure reported by a [`SubscriptionFactory`](crate::SubscriptionFactory).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("Cannot provision a subscription with {calls} calls")]
    InvalidCalls { calls: u64 },

    #[error("Subscription resource unavailable: {message}")]
    Unavailable { message: String },
}

impl ProvisioningError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }
}

/// Every way a registry operation can be rejected.
///
/// A rejected operation leaves the registry exactly as it found it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Self-subscription is not allowed: {address}")]
    SelfSubscription { address: Address },

    #[error("Invalid call budget: {calls} (must be at least 1)")]
    InvalidCallBudget { calls: i64 },

    #[error("Unknown analyst: {analyst}")]
    UnknownAnalyst { analyst: Address },

    #[error("Index {index} out of range for {count} subscribers")]
    IndexOutOfRange { index: i64, count: usize },

    #[error("Unknown subscriber {subscriber} for analyst {analyst}")]
    UnknownSubscriber { analyst: Address, subscriber: Address },

    #[error("{subscriber} is not subscribed to {analyst}")]
    NotSubscribed { analyst: Address, subscriber: Address },

    #[error("{subscriber} is already subscribed to {analyst}")]
    AlreadySubscribed { analyst: Address, subscriber: Address },

    #[error("Provisioning failed: {0}")]
    Provisioning(#[from] ProvisioningError),
}

impl RegistryError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SelfSubscription { .. } => "SELF_SUBSCRIPTION",
            Self::InvalidCallBudget { .. } => "INVALID_CALL_BUDGET",
            Self::UnknownAnalyst { .. } => "UNKNOWN_ANALYST",
            Self::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            Self::UnknownSubscriber { .. } => "UNKNOWN_SUBSCRIBER",
            Self::NotSubscribed { .. } => "NOT_SUBSCRIBED",
            Self::AlreadySubscribed { .. } => "ALREADY_SUBSCRIBED",
            Self::Provisioning(_) => "PROVISIONING_FAILED",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl From<RegistryError> for UseCaseError {
    fn from(err: RegistryError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match &err {
            RegistryError::SelfSubscription { address } => UseCaseError::validation_with_details(
                code,
                message,
                details! { "address" => address.as_str() },
            ),
            RegistryError::InvalidCallBudget { calls } => UseCaseError::validation_with_details(
                code,
                message,
                details! { "calls" => calls },
            ),
            RegistryError::IndexOutOfRange { index, count } => UseCaseError::validation_with_details(
                code,
                message,
                details! { "index" => index, "count" => count },
            ),
            RegistryError::UnknownAnalyst { analyst } => UseCaseError::not_found_with_details(
                code,
                message,
                details! { "analyst" => analyst.as_str() },
            ),
            RegistryError::UnknownSubscriber { analyst, subscriber } => {
                UseCaseError::not_found_with_details(
                    code,
                    message,
                    details! { "analyst" => analyst.as_str(), "subscriber" => subscriber.as_str() },
                )
            }
            RegistryError::NotSubscribed { analyst, subscriber }
            | RegistryError::AlreadySubscribed { analyst, subscriber } => {
                UseCaseError::business_rule_with_details(
                    code,
                    message,
                    details! { "analyst" => analyst.as_str(), "subscriber" => subscriber.as_str() },
                )
            }
            RegistryError::Provisioning(_) => UseCaseError::commit_with_code(code, message),
        }
    }
}

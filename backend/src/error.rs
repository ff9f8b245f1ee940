//! Unified error taxonomy for the simulation core.
//!
//! Every fallible boundary in this crate returns `CoreError` (or a narrower
//! error that converts into it via `#[from]`), matching the teacher
//! codebase's per-module `thiserror` enums (`AgentError`, `TransactionError`)
//! rather than a manual `Display` impl.

use thiserror::Error;

/// Broad class of error, used by the HTTP boundary to pick a status code.
///
/// Kept separate from the concrete `CoreError` variant so that the status
/// mapping is a single pure function instead of being duplicated at every
/// call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusHint {
    Validation,
    NotFound,
    PreconditionFailed,
    Conflict,
    Transient,
    Fatal,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CoreError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("invalid vote choice: {0}")]
    InvalidVote(String),

    #[error("participant not found: {0}")]
    ParticipantNotFound(String),

    #[error("property not found: {0}")]
    PropertyNotFound(String),

    #[error("action not found: {0}")]
    ActionNotFound(String),

    #[error("snapshot not found for month {0}")]
    SnapshotNotFound(u64),

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("insufficient tokens: requested {requested}, available {available}")]
    InsufficientTokens { requested: f64, available: f64 },

    #[error("price {price} exceeds maximum {max_price}")]
    PriceTooHigh { price: f64, max_price: f64 },

    #[error("price {price} below minimum {min_price}")]
    PriceTooLow { price: f64, min_price: f64 },

    #[error("participant {0} is not the tenant of this property")]
    NotTenant(String),

    #[error("property is not tenanted")]
    NotTenanted,

    #[error("participant {0} is not a registered service provider")]
    NotServiceProvider(String),

    #[error("participant {0} has no voting power")]
    NoVotingPower(String),

    #[error("snapshot already exists for month {0}")]
    SnapshotAlreadyExists(u64),

    #[error("pipeline is already processing a tick")]
    PipelineAlreadyRunning,

    #[error("pending action {0} has already been processed")]
    AlreadyProcessed(String),

    #[error("store connection error: {0}")]
    StoreTransient(String),

    #[error("external narrative bridge timed out or failed: {0}")]
    BridgeTransient(String),

    #[error("fatal startup error: {0}")]
    Fatal(String),
}

impl CoreError {
    /// Stable, user-visible error code, independent of the `Display` message.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::InvalidParams(_) => "INVALID_PARAMS",
            CoreError::InvalidVote(_) => "INVALID_VOTE",
            CoreError::ParticipantNotFound(_) => "NOT_FOUND",
            CoreError::PropertyNotFound(_) => "NOT_FOUND",
            CoreError::ActionNotFound(_) => "NOT_FOUND",
            CoreError::SnapshotNotFound(_) => "NOT_FOUND",
            CoreError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            CoreError::InsufficientTokens { .. } => "INSUFFICIENT_TOKENS",
            CoreError::PriceTooHigh { .. } => "PRICE_TOO_HIGH",
            CoreError::PriceTooLow { .. } => "PRICE_TOO_LOW",
            CoreError::NotTenant(_) => "NOT_TENANT",
            CoreError::NotTenanted => "NOT_TENANTED",
            CoreError::NotServiceProvider(_) => "NOT_SERVICE_PROVIDER",
            CoreError::NoVotingPower(_) => "NO_VOTING_POWER",
            CoreError::SnapshotAlreadyExists(_) => "CONFLICT",
            CoreError::PipelineAlreadyRunning => "CONFLICT",
            CoreError::AlreadyProcessed(_) => "ALREADY_PROCESSED",
            CoreError::StoreTransient(_) => "STORE_TRANSIENT",
            CoreError::BridgeTransient(_) => "BRIDGE_TRANSIENT",
            CoreError::Fatal(_) => "FATAL",
        }
    }

    pub fn status_hint(&self) -> StatusHint {
        match self {
            CoreError::InvalidParams(_) | CoreError::InvalidVote(_) => StatusHint::Validation,
            CoreError::ParticipantNotFound(_)
            | CoreError::PropertyNotFound(_)
            | CoreError::ActionNotFound(_)
            | CoreError::SnapshotNotFound(_) => StatusHint::NotFound,
            CoreError::InsufficientBalance { .. }
            | CoreError::InsufficientTokens { .. }
            | CoreError::PriceTooHigh { .. }
            | CoreError::PriceTooLow { .. }
            | CoreError::NotTenant(_)
            | CoreError::NotTenanted
            | CoreError::NotServiceProvider(_)
            | CoreError::NoVotingPower(_) => StatusHint::PreconditionFailed,
            CoreError::SnapshotAlreadyExists(_)
            | CoreError::PipelineAlreadyRunning
            | CoreError::AlreadyProcessed(_) => StatusHint::Conflict,
            CoreError::StoreTransient(_) | CoreError::BridgeTransient(_) => StatusHint::Transient,
            CoreError::Fatal(_) => StatusHint::Fatal,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

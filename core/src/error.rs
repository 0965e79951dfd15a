//! Error taxonomy shared by both ledgers.

use crate::event::EventError;
use crate::event_bus::EventBusError;
use crate::store::StoreError;
use thiserror::Error;

/// Result alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors returned by [`StockOperations`](crate::ledger::StockOperations) and
/// [`CartOperations`](crate::ledger::CartOperations).
///
/// `InsufficientStock` and `AlreadyClaimed` are expected domain outcomes, not
/// failures of the system. Store and transport failures collapse into `Internal`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Zero rows affected, or point lookup miss
    #[error("not found")]
    NotFound,

    /// SKU is unknown to the catalog
    #[error("invalid sku")]
    InvalidSku,

    /// Count failed validation
    #[error("invalid count")]
    InvalidCount,

    /// User id failed validation
    #[error("invalid user id")]
    InvalidUserId,

    /// Reservation rejected: requested plus already reserved exceeds stock
    #[error("insufficient stock")]
    InsufficientStock,

    /// SKU is already owned by a different user
    #[error("sku already claimed by another user")]
    AlreadyClaimed,

    /// Remote stock query exceeded its deadline
    #[error("stock query timed out")]
    Timeout,

    /// Event `type` string outside the known set
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// Unclassified store or transport failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Whether the caller may retry the same request unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Whether this is an expected business outcome rather than a failure.
    #[must_use]
    pub const fn is_domain_outcome(&self) -> bool {
        matches!(self, Self::InsufficientStock | Self::AlreadyClaimed)
    }

    /// Short label used for metrics and log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidSku => "invalid_sku",
            Self::InvalidCount => "invalid_count",
            Self::InvalidUserId => "invalid_user_id",
            Self::InsufficientStock => "insufficient_stock",
            Self::AlreadyClaimed => "already_claimed",
            Self::Timeout => "timeout",
            Self::UnknownEventType(_) => "unknown_event_type",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CountOutOfRange => Self::InvalidCount,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<EventBusError> for LedgerError {
    fn from(err: EventBusError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<EventError> for LedgerError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::UnknownEventType(kind) => Self::UnknownEventType(kind),
            other => Self::Internal(other.to_string()),
        }
    }
}

//! Domain error types.

use common::ItemStatus;
use market_store::StoreError;
use thiserror::Error;

/// Business rule that a purchase failed at transaction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precondition {
    /// The item is not in the `OnSale` state.
    NotOnSale,
    /// The buyer is the item's seller.
    SelfPurchase,
    /// The buyer's balance is below the item price.
    InsufficientBalance,
}

impl Precondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precondition::NotOnSale => "not on sale",
            Precondition::SelfPurchase => "self purchase",
            Precondition::InsufficientBalance => "insufficient balance",
        }
    }
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a [`DomainError`], for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    InvalidReference,
    Forbidden,
    InvalidState,
    PreconditionFailed,
    AlreadyExists,
    DeadlineExceeded,
    Internal,
}

/// Errors that can occur during marketplace operations.
///
/// Every variant is returned only after the unit of work that produced it
/// has been discarded, so no partial effect is ever visible.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Malformed input such as a non-positive price or an empty name.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A foreign key does not resolve.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// The acting user has no rights over the target.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The operation is not valid in the item's current lifecycle state.
    #[error("Invalid state transition: cannot {action} from {current} state")]
    InvalidState {
        current: ItemStatus,
        action: &'static str,
    },

    /// A business rule failed at transaction time.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(Precondition),

    /// A unique value is already taken.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The caller's deadline passed before the unit of work committed.
    #[error("Deadline exceeded before commit")]
    DeadlineExceeded,

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            DomainError::InvalidReference(_) => ErrorKind::InvalidReference,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
            DomainError::InvalidState { .. } => ErrorKind::InvalidState,
            DomainError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            DomainError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            DomainError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            DomainError::Store(_) => ErrorKind::Internal,
        }
    }

    /// Returns the failed precondition, if this is a `PreconditionFailed` error.
    pub fn precondition(&self) -> Option<Precondition> {
        match self {
            DomainError::PreconditionFailed(p) => Some(*p),
            _ => None,
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            StoreError::AlreadyExists { entity, key } => {
                DomainError::AlreadyExists(format!("{entity} {key}"))
            }
            StoreError::InvalidQuery(msg) => DomainError::InvalidArgument(msg),
            other => DomainError::Store(other),
        }
    }
}

impl From<Precondition> for DomainError {
    fn from(p: Precondition) -> Self {
        DomainError::PreconditionFailed(p)
    }
}

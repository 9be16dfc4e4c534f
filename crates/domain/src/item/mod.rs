//! Item lifecycle rules.

mod lifecycle;

pub use common::ItemStatus;
pub use lifecycle::ItemLifecycle;

use common::{ItemId, UserId};
use thiserror::Error;

use crate::error::DomainError;

/// Violations of the item lifecycle rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// Item names must not be empty.
    #[error("item name must not be empty")]
    EmptyName,

    /// Prices must be strictly positive.
    #[error("price must be greater than 0, got {price}")]
    InvalidPrice { price: i64 },

    /// The image payload is above the configured ceiling.
    #[error("image is too large: {size} bytes (limit {limit})")]
    ImageTooLarge { size: usize, limit: usize },

    /// Only the seller may act on their own listing.
    #[error("user {user_id} is not the seller of item {item_id}")]
    NotSeller { item_id: ItemId, user_id: UserId },

    /// The item is not in the expected state.
    #[error("cannot {action} from {current} state")]
    InvalidStateTransition {
        current: ItemStatus,
        action: &'static str,
    },
}

impl From<ItemError> for DomainError {
    fn from(e: ItemError) -> Self {
        match e {
            ItemError::EmptyName | ItemError::InvalidPrice { .. } | ItemError::ImageTooLarge { .. } => {
                DomainError::InvalidArgument(e.to_string())
            }
            ItemError::NotSeller { .. } => DomainError::Forbidden(e.to_string()),
            ItemError::InvalidStateTransition { current, action } => {
                DomainError::InvalidState { current, action }
            }
        }
    }
}

//! Item lifecycle state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The lifecycle state of a listed item.
///
/// Transitions are one-directional:
/// ```text
/// Initial ──(sell, by seller)──► OnSale ──(purchase, by non-seller)──► SoldOut
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    /// Listed but not yet offered for sale.
    #[default]
    Initial,

    /// Offered for sale; may be purchased by anyone but the seller.
    OnSale,

    /// Purchased (terminal state).
    SoldOut,
}

/// Returned when a stored status code does not name a lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown item status code: {0}")]
pub struct UnknownStatus(pub i16);

impl ItemStatus {
    /// Returns true if the seller may put the item on sale.
    pub fn can_sell(&self) -> bool {
        matches!(self, ItemStatus::Initial)
    }

    /// Returns true if a buyer may purchase the item.
    pub fn can_purchase(&self) -> bool {
        matches!(self, ItemStatus::OnSale)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::SoldOut)
    }

    /// The only state this one may move to, if any.
    pub fn next(&self) -> Option<ItemStatus> {
        match self {
            ItemStatus::Initial => Some(ItemStatus::OnSale),
            ItemStatus::OnSale => Some(ItemStatus::SoldOut),
            ItemStatus::SoldOut => None,
        }
    }

    /// Returns true if moving from `self` to `to` is a legal single step.
    pub fn can_transition_to(&self, to: ItemStatus) -> bool {
        self.next() == Some(to)
    }

    /// Code used by the relational schema.
    pub fn as_i16(&self) -> i16 {
        match self {
            ItemStatus::Initial => 1,
            ItemStatus::OnSale => 2,
            ItemStatus::SoldOut => 3,
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Initial => "Initial",
            ItemStatus::OnSale => "OnSale",
            ItemStatus::SoldOut => "SoldOut",
        }
    }
}

impl TryFrom<i16> for ItemStatus {
    type Error = UnknownStatus;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ItemStatus::Initial),
            2 => Ok(ItemStatus::OnSale),
            3 => Ok(ItemStatus::SoldOut),
            other => Err(UnknownStatus(other)),
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_initial() {
        assert_eq!(ItemStatus::default(), ItemStatus::Initial);
    }

    #[test]
    fn only_initial_can_sell() {
        assert!(ItemStatus::Initial.can_sell());
        assert!(!ItemStatus::OnSale.can_sell());
        assert!(!ItemStatus::SoldOut.can_sell());
    }

    #[test]
    fn only_on_sale_can_purchase() {
        assert!(!ItemStatus::Initial.can_purchase());
        assert!(ItemStatus::OnSale.can_purchase());
        assert!(!ItemStatus::SoldOut.can_purchase());
    }

    #[test]
    fn transitions_never_regress_or_skip() {
        assert!(ItemStatus::Initial.can_transition_to(ItemStatus::OnSale));
        assert!(ItemStatus::OnSale.can_transition_to(ItemStatus::SoldOut));
        assert!(!ItemStatus::Initial.can_transition_to(ItemStatus::SoldOut));
        assert!(!ItemStatus::OnSale.can_transition_to(ItemStatus::Initial));
        assert!(!ItemStatus::SoldOut.can_transition_to(ItemStatus::OnSale));
        assert!(!ItemStatus::SoldOut.can_transition_to(ItemStatus::SoldOut));
        assert!(ItemStatus::SoldOut.is_terminal());
    }

    #[test]
    fn status_codes() {
        for status in [ItemStatus::Initial, ItemStatus::OnSale, ItemStatus::SoldOut] {
            assert_eq!(ItemStatus::try_from(status.as_i16()), Ok(status));
        }
        assert_eq!(ItemStatus::try_from(0), Err(UnknownStatus(0)));
        assert_eq!(ItemStatus::try_from(4), Err(UnknownStatus(4)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ItemStatus::Initial.to_string(), "Initial");
        assert_eq!(ItemStatus::OnSale.to_string(), "OnSale");
        assert_eq!(ItemStatus::SoldOut.to_string(), "SoldOut");
    }
}

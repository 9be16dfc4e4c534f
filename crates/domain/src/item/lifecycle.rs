//! Item state machine guards.

use common::{ItemStatus, UserId};
use market_store::Item;

use super::ItemError;
use crate::commands::ListItem;
use crate::config::MarketConfig;
use crate::error::Precondition;

/// Enforces the `Initial → OnSale → SoldOut` lifecycle.
///
/// Guards are pure; callers evaluate them against rows read inside their
/// unit of work and then issue the matching conditional write.
#[derive(Debug, Clone)]
pub struct ItemLifecycle {
    max_image_bytes: usize,
}

impl ItemLifecycle {
    pub fn new(config: &MarketConfig) -> Self {
        Self {
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// Validates the caller-supplied values of a new listing.
    pub fn validate_listing(&self, cmd: &ListItem) -> Result<(), ItemError> {
        if !cmd.price.is_positive() {
            return Err(ItemError::InvalidPrice {
                price: cmd.price.units(),
            });
        }
        if cmd.name.trim().is_empty() {
            return Err(ItemError::EmptyName);
        }
        if cmd.image.len() > self.max_image_bytes {
            return Err(ItemError::ImageTooLarge {
                size: cmd.image.len(),
                limit: self.max_image_bytes,
            });
        }
        Ok(())
    }

    /// Checks that `acting_user` may move `item` from `Initial` to `OnSale`.
    ///
    /// Ownership is checked before state, so a stranger learns nothing about
    /// the item's lifecycle.
    pub fn authorize_sell(item: &Item, acting_user: UserId) -> Result<(), ItemError> {
        if item.seller_id != acting_user {
            return Err(ItemError::NotSeller {
                item_id: item.id,
                user_id: acting_user,
            });
        }
        if !item.status.can_sell() {
            return Err(ItemError::InvalidStateTransition {
                current: item.status,
                action: "sell",
            });
        }
        Ok(())
    }

    /// Checks the item-side purchase rules: on sale, and not the buyer's own.
    pub fn check_purchasable(item: &Item, buyer: UserId) -> Result<(), Precondition> {
        if !item.status.can_purchase() {
            return Err(Precondition::NotOnSale);
        }
        if item.seller_id == buyer {
            return Err(Precondition::SelfPurchase);
        }
        Ok(())
    }

    /// The transition applied by a successful sell.
    pub fn sell_transition() -> (ItemStatus, ItemStatus) {
        (ItemStatus::Initial, ItemStatus::OnSale)
    }

    /// The transition applied by a successful purchase.
    pub fn purchase_transition() -> (ItemStatus, ItemStatus) {
        (ItemStatus::OnSale, ItemStatus::SoldOut)
    }
}

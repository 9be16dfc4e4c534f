//! Purchase orchestration.
//!
//! A purchase debits the buyer, credits the seller and moves the item to
//! `SoldOut` inside a single unit of work. Rows are locked in a fixed order,
//! item first and then users by ascending id, so two purchases can never
//! wait on each other in a cycle.

use std::time::Instant;

use common::{ItemId, Money, UserId};
use market_store::{CatalogStore, LedgerStore, Store, StoreError, UnitOfWork, User};
use serde::Serialize;
use tracing::{info, warn};

use crate::commands::PurchaseItem;
use crate::deadline::Deadline;
use crate::error::{DomainError, Precondition};
use crate::item::ItemLifecycle;

/// Outcome of a committed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    pub item_id: ItemId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub price: Money,

    /// Buyer balance after the debit.
    pub buyer_balance: Money,

    /// Seller balance after the credit.
    pub seller_balance: Money,
}

/// Service that settles purchases.
#[derive(Clone)]
pub struct PurchaseService<S: Store> {
    store: S,
}

impl<S: Store> PurchaseService<S> {
    /// Creates a new purchase service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Buys an `OnSale` item.
    ///
    /// Either all three effects are committed or none is.
    #[tracing::instrument(skip(self, deadline))]
    pub async fn purchase(
        &self,
        cmd: PurchaseItem,
        deadline: Deadline,
    ) -> Result<PurchaseReceipt, DomainError> {
        let started = Instant::now();
        let result = self.settle(cmd, deadline).await;

        metrics::histogram!("marketplace_purchase_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        metrics::counter!("marketplace_purchases_total", "outcome" => outcome_label(&result))
            .increment(1);

        match &result {
            Ok(receipt) => info!(
                item_id = %receipt.item_id,
                buyer_id = %receipt.buyer_id,
                seller_id = %receipt.seller_id,
                price = %receipt.price,
                "Item purchased"
            ),
            Err(e) => warn!(
                item_id = %cmd.item_id,
                buyer_id = %cmd.buyer_id,
                error = %e,
                "Purchase rejected"
            ),
        }
        result
    }

    async fn settle(
        &self,
        cmd: PurchaseItem,
        deadline: Deadline,
    ) -> Result<PurchaseReceipt, DomainError> {
        let (tx, receipt) = deadline
            .run(async {
                let mut tx = self.store.begin().await?;

                let item = tx.lock_item(cmd.item_id).await?;
                ItemLifecycle::check_purchasable(&item, cmd.buyer_id)?;

                let (buyer, seller) = lock_parties(&mut tx, cmd.buyer_id, item.seller_id).await?;
                let buyer = buyer.ok_or(DomainError::NotFound {
                    entity: "user",
                    id: cmd.buyer_id.as_i64(),
                })?;
                if buyer.balance < item.price {
                    return Err(Precondition::InsufficientBalance.into());
                }
                let seller = seller.ok_or(DomainError::NotFound {
                    entity: "user",
                    id: item.seller_id.as_i64(),
                })?;

                let buyer_balance = buyer
                    .balance
                    .checked_sub(item.price)
                    .ok_or_else(|| overflow("buyer balance"))?;
                let seller_balance = seller
                    .balance
                    .checked_add(item.price)
                    .ok_or_else(|| overflow("seller balance"))?;

                tx.set_balance(buyer.id, buyer_balance).await?;
                tx.set_balance(seller.id, seller_balance).await?;

                let (from, to) = ItemLifecycle::purchase_transition();
                match tx.transition_item(item.id, from, to).await {
                    Ok(_) => {}
                    Err(StoreError::Conflict { .. }) => {
                        return Err(Precondition::NotOnSale.into());
                    }
                    Err(e) => return Err(e.into()),
                }

                let receipt = PurchaseReceipt {
                    item_id: item.id,
                    buyer_id: buyer.id,
                    seller_id: seller.id,
                    price: item.price,
                    buyer_balance,
                    seller_balance,
                };
                Ok::<_, DomainError>((tx, receipt))
            })
            .await?;
        tx.commit().await?;

        Ok(receipt)
    }
}

/// Locks both parties of a sale in ascending id order.
///
/// A missing row comes back as `None` so the caller can apply its own check
/// order.
async fn lock_parties<T: UnitOfWork>(
    tx: &mut T,
    buyer_id: UserId,
    seller_id: UserId,
) -> Result<(Option<User>, Option<User>), DomainError> {
    if buyer_id < seller_id {
        let buyer = lock_optional(tx, buyer_id).await?;
        let seller = lock_optional(tx, seller_id).await?;
        Ok((buyer, seller))
    } else {
        let seller = lock_optional(tx, seller_id).await?;
        let buyer = lock_optional(tx, buyer_id).await?;
        Ok((buyer, seller))
    }
}

async fn lock_optional<T: UnitOfWork>(tx: &mut T, user_id: UserId) -> Result<Option<User>, DomainError> {
    match tx.lock_user(user_id).await {
        Ok(user) => Ok(Some(user)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn overflow(what: &str) -> DomainError {
    DomainError::InvalidArgument(format!("{what} overflow"))
}

fn outcome_label(result: &Result<PurchaseReceipt, DomainError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(DomainError::PreconditionFailed(Precondition::NotOnSale)) => "not_on_sale",
        Err(DomainError::PreconditionFailed(Precondition::SelfPurchase)) => "self_purchase",
        Err(DomainError::PreconditionFailed(Precondition::InsufficientBalance)) => {
            "insufficient_balance"
        }
        Err(DomainError::NotFound { .. }) => "not_found",
        Err(DomainError::DeadlineExceeded) => "deadline_exceeded",
        Err(_) => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels_are_stable() {
        assert_eq!(
            outcome_label(&Err(Precondition::SelfPurchase.into())),
            "self_purchase"
        );
        assert_eq!(
            outcome_label(&Err(DomainError::NotFound {
                entity: "item",
                id: 1
            })),
            "not_found"
        );
        assert_eq!(outcome_label(&Err(DomainError::DeadlineExceeded)), "deadline_exceeded");
    }
}

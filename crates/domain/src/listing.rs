//! Listing orchestration: creating items and putting them on sale.

use market_store::{CatalogStore, Item, LedgerStore, NewItem, Store, StoreError, UnitOfWork};
use tracing::info;

use crate::commands::{ListItem, SellItem};
use crate::config::MarketConfig;
use crate::deadline::Deadline;
use crate::error::DomainError;
use crate::item::{ItemLifecycle, ItemStatus};

/// Service for creating listings and moving them to `OnSale`.
#[derive(Clone)]
pub struct ListingService<S: Store> {
    store: S,
    lifecycle: ItemLifecycle,
}

impl<S: Store> ListingService<S> {
    /// Creates a new listing service over the given store.
    pub fn new(store: S, config: &MarketConfig) -> Self {
        Self {
            store,
            lifecycle: ItemLifecycle::new(config),
        }
    }

    /// Creates a new item in the `Initial` state.
    #[tracing::instrument(skip(self, deadline))]
    pub async fn list_item(&self, cmd: ListItem, deadline: Deadline) -> Result<Item, DomainError> {
        self.lifecycle.validate_listing(&cmd)?;

        let (tx, item) = deadline
            .run(async {
                let mut tx = self.store.begin().await?;

                if tx.get_category(cmd.category_id).await?.is_none() {
                    return Err(DomainError::InvalidReference(format!(
                        "category {} does not exist",
                        cmd.category_id
                    )));
                }
                tx.get_user(cmd.seller_id).await?;

                let item = tx
                    .insert_item(NewItem {
                        name: cmd.name,
                        price: cmd.price,
                        description: cmd.description,
                        category_id: cmd.category_id,
                        seller_id: cmd.seller_id,
                        image: cmd.image,
                        status: ItemStatus::Initial,
                    })
                    .await?;
                Ok::<_, DomainError>((tx, item))
            })
            .await?;
        tx.commit().await?;

        metrics::counter!("marketplace_listings_total").increment(1);
        info!(item_id = %item.id, seller_id = %item.seller_id, "Item listed");
        Ok(item)
    }

    /// Moves an `Initial` item to `OnSale`. Only its seller may do this.
    #[tracing::instrument(skip(self, deadline))]
    pub async fn sell_item(&self, cmd: SellItem, deadline: Deadline) -> Result<Item, DomainError> {
        let (tx, item) = deadline
            .run(async {
                let mut tx = self.store.begin().await?;

                let item = tx.lock_item(cmd.item_id).await?;
                ItemLifecycle::authorize_sell(&item, cmd.acting_user_id)?;

                let (from, to) = ItemLifecycle::sell_transition();
                let item = match tx.transition_item(item.id, from, to).await {
                    Ok(item) => item,
                    Err(StoreError::Conflict { .. }) => {
                        // Someone moved it first; report the state they left behind.
                        let current = tx.get_item(cmd.item_id).await?.status;
                        return Err(DomainError::InvalidState {
                            current,
                            action: "sell",
                        });
                    }
                    Err(e) => return Err(e.into()),
                };
                Ok::<_, DomainError>((tx, item))
            })
            .await?;
        tx.commit().await?;

        metrics::counter!("marketplace_sales_total").increment(1);
        info!(item_id = %item.id, "Item put on sale");
        Ok(item)
    }
}

//! Read accessors over the catalog.

use common::{ItemId, ItemStatus, UserId};
use market_store::{CatalogStore, Category, Item, ItemQuery, ItemSummary, Store, UnitOfWork};

use crate::error::DomainError;

/// Read-only views of items and categories.
///
/// Each call is a single read in its own unit of work, which is rolled back
/// since nothing was written.
#[derive(Clone)]
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads one item, image included.
    #[tracing::instrument(skip(self))]
    pub async fn get_item(&self, item_id: ItemId) -> Result<Item, DomainError> {
        let mut tx = self.store.begin().await?;
        let item = tx.get_item(item_id).await?;
        tx.rollback().await?;
        Ok(item)
    }

    /// Loads one item joined with its category name, without the image.
    #[tracing::instrument(skip(self))]
    pub async fn get_item_summary(&self, item_id: ItemId) -> Result<ItemSummary, DomainError> {
        let mut tx = self.store.begin().await?;
        let item = tx.get_item(item_id).await?;
        let category = tx.get_category(item.category_id).await?;
        tx.rollback().await?;

        let category_name = category.map(|c| c.name).unwrap_or_default();
        Ok(ItemSummary::from_item(&item, category_name))
    }

    /// Returns the stored image payload of an item.
    #[tracing::instrument(skip(self))]
    pub async fn get_item_image(&self, item_id: ItemId) -> Result<Vec<u8>, DomainError> {
        let mut tx = self.store.begin().await?;
        let image = tx.get_item_image(item_id).await?;
        tx.rollback().await?;
        Ok(image)
    }

    /// Lists items in any of the given states, newest update first.
    #[tracing::instrument(skip(self))]
    pub async fn get_items_by_status(
        &self,
        statuses: &[ItemStatus],
    ) -> Result<Vec<ItemSummary>, DomainError> {
        self.query(ItemQuery::with_statuses(statuses)).await
    }

    /// Lists every item a user has listed, whatever its state.
    #[tracing::instrument(skip(self))]
    pub async fn get_items_by_seller(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<ItemSummary>, DomainError> {
        self.query(ItemQuery::for_seller(seller_id)).await
    }

    /// Case-insensitive substring search on item names.
    #[tracing::instrument(skip(self))]
    pub async fn search_items(&self, name: &str) -> Result<Vec<ItemSummary>, DomainError> {
        self.query(ItemQuery::new().name_contains(name)).await
    }

    /// Lists the reference categories.
    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        let mut tx = self.store.begin().await?;
        let categories = tx.list_categories().await?;
        tx.rollback().await?;
        Ok(categories)
    }

    async fn query(&self, query: ItemQuery) -> Result<Vec<ItemSummary>, DomainError> {
        let mut tx = self.store.begin().await?;
        let items = tx.query_items(query).await?;
        tx.rollback().await?;
        Ok(items)
    }
}

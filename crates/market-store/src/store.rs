use async_trait::async_trait;
use common::{CategoryId, ItemId, ItemStatus, Money, UserId};

use crate::{Category, Item, ItemQuery, ItemSummary, NewItem, Result, User};

/// Reads and writes on the user balance table.
///
/// Every method runs inside the unit of work it is called on. A balance is
/// only ever written from a value read in the same unit of work.
#[async_trait]
pub trait LedgerStore: Send {
    /// Loads a user. Fails with `NotFound` if absent.
    async fn get_user(&mut self, user_id: UserId) -> Result<User>;

    /// Loads a user and holds a row lock on it until the unit of work ends.
    async fn lock_user(&mut self, user_id: UserId) -> Result<User>;

    /// Returns the current balance of a user.
    async fn get_balance(&mut self, user_id: UserId) -> Result<Money> {
        Ok(self.get_user(user_id).await?.balance)
    }

    /// Overwrites a user's balance. Fails with `NotFound` if absent.
    async fn set_balance(&mut self, user_id: UserId, balance: Money) -> Result<()>;

    /// Inserts a user with a zero balance.
    ///
    /// Fails with `AlreadyExists` if the name is taken.
    async fn insert_user(&mut self, name: &str, credential: &str) -> Result<User>;
}

/// Reads and writes on the item and category tables.
#[async_trait]
pub trait CatalogStore: Send {
    /// Looks up a category.
    async fn get_category(&mut self, category_id: CategoryId) -> Result<Option<Category>>;

    /// Lists every category ordered by id.
    async fn list_categories(&mut self) -> Result<Vec<Category>>;

    /// Inserts an item, assigning its id and timestamps.
    async fn insert_item(&mut self, item: NewItem) -> Result<Item>;

    /// Loads an item. Fails with `NotFound` if absent.
    async fn get_item(&mut self, item_id: ItemId) -> Result<Item>;

    /// Loads an item and holds a row lock on it until the unit of work ends.
    async fn lock_item(&mut self, item_id: ItemId) -> Result<Item>;

    /// Moves an item from `from` to `to` and bumps `updated_at`.
    ///
    /// This is a conditional write: if the stored status is no longer `from`
    /// the call fails with `Conflict` and nothing is written.
    async fn transition_item(
        &mut self,
        item_id: ItemId,
        from: ItemStatus,
        to: ItemStatus,
    ) -> Result<Item>;

    /// Returns the opaque image payload of an item.
    async fn get_item_image(&mut self, item_id: ItemId) -> Result<Vec<u8>>;

    /// Lists items matching a query, newest update first.
    async fn query_items(&mut self, query: ItemQuery) -> Result<Vec<ItemSummary>>;
}

/// One atomic, isolated sequence of ledger and catalog operations.
///
/// Nothing written through a unit of work is visible to others until
/// [`UnitOfWork::commit`] returns. Dropping a unit of work without committing
/// discards all of its writes.
#[async_trait]
pub trait UnitOfWork: LedgerStore + CatalogStore + Send {
    /// Publishes every write made through this unit of work.
    async fn commit(self) -> Result<()>;

    /// Discards every write made through this unit of work.
    async fn rollback(self) -> Result<()>;
}

/// Entry point to a transactional store.
///
/// Implementations are cheap to clone and share their underlying resources
/// (a connection pool, or the in-memory tables).
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    /// The unit-of-work type handed out by [`Store::begin`].
    type Tx: UnitOfWork + 'static;

    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Self::Tx>;
}

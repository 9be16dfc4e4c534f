use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CategoryId, ItemId, ItemStatus, Money, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Category, Item, ItemQuery, ItemSummary, NewItem, Result, StoreError, User,
    store::{CatalogStore, LedgerStore, Store, UnitOfWork},
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    items: BTreeMap<ItemId, Item>,
    last_user_id: i64,
    last_item_id: i64,
}

/// In-memory store implementation for testing.
///
/// Provides the same contracts as the PostgreSQL implementation. A unit of
/// work takes exclusive ownership of the tables for its whole lifetime, so
/// units of work are serialized and every one of them sees the writes of the
/// ones that committed before it.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with reference categories.
    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let tables = Tables {
            categories: categories.into_iter().map(|c| (c.id, c)).collect(),
            ..Default::default()
        };
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }

    /// Returns the number of registered users.
    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    /// Returns the sum of every user's balance.
    pub async fn total_balance(&self) -> i128 {
        self.tables
            .lock()
            .await
            .users
            .values()
            .map(|u| i128::from(u.balance.units()))
            .sum()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx> {
        let tables = self.tables.clone().lock_owned().await;
        Ok(InMemoryUnitOfWork {
            tables,
            undo: Vec::new(),
        })
    }
}

/// Prior value of a row written by an open unit of work.
#[derive(Debug)]
enum Undo {
    Balance {
        user_id: UserId,
        balance: Money,
    },
    UserInserted {
        user_id: UserId,
        last_user_id: i64,
    },
    ItemInserted {
        item_id: ItemId,
        last_item_id: i64,
    },
    Status {
        item_id: ItemId,
        status: ItemStatus,
        updated_at: DateTime<Utc>,
    },
}

impl Undo {
    fn revert(self, tables: &mut Tables) {
        match self {
            Undo::Balance { user_id, balance } => {
                if let Some(user) = tables.users.get_mut(&user_id) {
                    user.balance = balance;
                }
            }
            Undo::UserInserted {
                user_id,
                last_user_id,
            } => {
                tables.users.remove(&user_id);
                tables.last_user_id = last_user_id;
            }
            Undo::ItemInserted {
                item_id,
                last_item_id,
            } => {
                tables.items.remove(&item_id);
                tables.last_item_id = last_item_id;
            }
            Undo::Status {
                item_id,
                status,
                updated_at,
            } => {
                if let Some(item) = tables.items.get_mut(&item_id) {
                    item.status = status;
                    item.updated_at = updated_at;
                }
            }
        }
    }
}

/// Unit of work over [`InMemoryStore`].
///
/// Writes land in the shared tables directly while the lock is held, and each
/// one records the row's prior value. Commit forgets the log; any other way
/// of letting go of the unit of work replays it newest first.
pub struct InMemoryUnitOfWork {
    tables: OwnedMutexGuard<Tables>,
    undo: Vec<Undo>,
}

impl InMemoryUnitOfWork {
    fn summarize(&self, item: &Item) -> ItemSummary {
        let category_name = self
            .tables
            .categories
            .get(&item.category_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        ItemSummary::from_item(item, category_name)
    }
}

impl Drop for InMemoryUnitOfWork {
    fn drop(&mut self) {
        while let Some(entry) = self.undo.pop() {
            entry.revert(&mut self.tables);
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryUnitOfWork {
    async fn get_user(&mut self, user_id: UserId) -> Result<User> {
        self.tables
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| StoreError::user_not_found(user_id))
    }

    async fn lock_user(&mut self, user_id: UserId) -> Result<User> {
        // The whole table set is already held exclusively.
        self.get_user(user_id).await
    }

    async fn set_balance(&mut self, user_id: UserId, balance: Money) -> Result<()> {
        let user = self
            .tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::user_not_found(user_id))?;
        let previous = std::mem::replace(&mut user.balance, balance);
        self.undo.push(Undo::Balance {
            user_id,
            balance: previous,
        });
        Ok(())
    }

    async fn insert_user(&mut self, name: &str, credential: &str) -> Result<User> {
        if self.tables.users.values().any(|u| u.name == name) {
            return Err(StoreError::AlreadyExists {
                entity: "user",
                key: name.to_string(),
            });
        }

        let last_user_id = self.tables.last_user_id;
        let user = User {
            id: UserId::new(last_user_id + 1),
            name: name.to_string(),
            credential: credential.to_string(),
            balance: Money::zero(),
        };
        self.tables.last_user_id = user.id.as_i64();
        self.tables.users.insert(user.id, user.clone());
        self.undo.push(Undo::UserInserted {
            user_id: user.id,
            last_user_id,
        });
        Ok(user)
    }
}

#[async_trait]
impl CatalogStore for InMemoryUnitOfWork {
    async fn get_category(&mut self, category_id: CategoryId) -> Result<Option<Category>> {
        Ok(self.tables.categories.get(&category_id).cloned())
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>> {
        Ok(self.tables.categories.values().cloned().collect())
    }

    async fn insert_item(&mut self, item: NewItem) -> Result<Item> {
        let last_item_id = self.tables.last_item_id;
        let now = Utc::now();
        let item = Item {
            id: ItemId::new(last_item_id + 1),
            name: item.name,
            price: item.price,
            description: item.description,
            category_id: item.category_id,
            seller_id: item.seller_id,
            image: item.image,
            status: item.status,
            created_at: now,
            updated_at: now,
        };
        self.tables.last_item_id = item.id.as_i64();
        self.tables.items.insert(item.id, item.clone());
        self.undo.push(Undo::ItemInserted {
            item_id: item.id,
            last_item_id,
        });
        Ok(item)
    }

    async fn get_item(&mut self, item_id: ItemId) -> Result<Item> {
        self.tables
            .items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| StoreError::item_not_found(item_id))
    }

    async fn lock_item(&mut self, item_id: ItemId) -> Result<Item> {
        self.get_item(item_id).await
    }

    async fn transition_item(
        &mut self,
        item_id: ItemId,
        from: ItemStatus,
        to: ItemStatus,
    ) -> Result<Item> {
        let item = self
            .tables
            .items
            .get_mut(&item_id)
            .ok_or_else(|| StoreError::item_not_found(item_id))?;
        if item.status != from {
            return Err(StoreError::Conflict {
                entity: "item",
                id: item_id.as_i64(),
            });
        }

        let undo = Undo::Status {
            item_id,
            status: item.status,
            updated_at: item.updated_at,
        };
        item.status = to;
        item.updated_at = Utc::now();
        let moved = item.clone();

        self.undo.push(undo);
        Ok(moved)
    }

    async fn get_item_image(&mut self, item_id: ItemId) -> Result<Vec<u8>> {
        self.tables
            .items
            .get(&item_id)
            .map(|item| item.image.clone())
            .ok_or_else(|| StoreError::item_not_found(item_id))
    }

    async fn query_items(&mut self, query: ItemQuery) -> Result<Vec<ItemSummary>> {
        let mut items: Vec<_> = self
            .tables
            .items
            .values()
            .map(|item| self.summarize(item))
            .filter(|summary| query.matches(summary))
            .collect();

        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        let offset = query.offset.unwrap_or(0);
        let items = items.into_iter().skip(offset);
        let items = match query.limit {
            Some(limit) => items.take(limit).collect(),
            None => items.collect(),
        };

        Ok(items)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit(mut self) -> Result<()> {
        self.undo.clear();
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryStore {
        InMemoryStore::with_categories([
            Category::new(CategoryId::new(1), "Fashion"),
            Category::new(CategoryId::new(2), "Furniture"),
        ])
    }

    fn new_item(seller_id: UserId, name: &str) -> NewItem {
        NewItem {
            name: name.to_string(),
            price: Money::new(100),
            description: "test".to_string(),
            category_id: CategoryId::new(1),
            seller_id,
            image: vec![1, 2, 3],
            status: ItemStatus::Initial,
        }
    }

    #[tokio::test]
    async fn insert_and_get_user() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user("alice", "hash").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(user.id, UserId::new(1));
        assert_eq!(user.balance, Money::zero());

        let mut tx = store.begin().await.unwrap();
        let loaded = tx.get_user(user.id).await.unwrap();
        assert_eq!(loaded.name, "alice");
        assert_eq!(tx.get_balance(user.id).await.unwrap(), Money::zero());
    }

    #[tokio::test]
    async fn duplicate_user_name_is_typed_conflict() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        tx.insert_user("alice", "hash").await.unwrap();
        let result = tx.insert_user("alice", "other").await;

        assert!(matches!(
            result,
            Err(StoreError::AlreadyExists { entity: "user", .. })
        ));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let store = store();
        let mut tx = store.begin().await.unwrap();

        assert!(tx.get_user(UserId::new(9)).await.unwrap_err().is_not_found());
        assert!(
            tx.set_balance(UserId::new(9), Money::new(5))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn dropped_unit_of_work_discards_writes() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user("alice", "hash").await.unwrap();
        tx.commit().await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.set_balance(user.id, Money::new(500)).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        tx.set_balance(user.id, Money::new(700)).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.get_balance(user.id).await.unwrap(), Money::zero());
    }

    #[tokio::test]
    async fn rollback_reverts_inserts_and_transitions() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let seller = tx.insert_user("seller", "hash").await.unwrap();
        let item = tx.insert_item(new_item(seller.id, "Lamp")).await.unwrap();
        tx.set_balance(seller.id, Money::new(40)).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let buyer = tx.insert_user("buyer", "hash").await.unwrap();
        let draft = tx.insert_item(new_item(seller.id, "Chair")).await.unwrap();
        tx.transition_item(item.id, ItemStatus::Initial, ItemStatus::OnSale)
            .await
            .unwrap();
        tx.set_balance(seller.id, Money::new(90)).await.unwrap();
        tx.set_balance(seller.id, Money::new(10)).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get_user(buyer.id).await.unwrap_err().is_not_found());
        assert!(tx.get_item(draft.id).await.unwrap_err().is_not_found());
        assert_eq!(tx.get_balance(seller.id).await.unwrap(), Money::new(40));

        let restored = tx.get_item(item.id).await.unwrap();
        assert_eq!(restored.status, ItemStatus::Initial);
        assert_eq!(restored.updated_at, item.updated_at);

        // Ids handed out by the discarded unit of work are reused.
        assert_eq!(tx.insert_user("carol", "hash").await.unwrap().id, buyer.id);
        assert_eq!(
            tx.insert_item(new_item(seller.id, "Sofa")).await.unwrap().id,
            draft.id
        );
    }

    #[tokio::test]
    async fn committed_writes_survive_the_next_unit_of_work() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let seller = tx.insert_user("seller", "hash").await.unwrap();
        let item = tx.insert_item(new_item(seller.id, "Lamp")).await.unwrap();
        tx.transition_item(item.id, ItemStatus::Initial, ItemStatus::OnSale)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        // A read-only unit of work that is dropped must not touch them.
        {
            let mut tx = store.begin().await.unwrap();
            tx.get_item(item.id).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.get_item(item.id).await.unwrap().status, ItemStatus::OnSale);
        assert_eq!(tx.get_item_image(item.id).await.unwrap(), vec![1, 2, 3]);
        tx.rollback().await.unwrap();

        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn conditional_transition() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let seller = tx.insert_user("seller", "hash").await.unwrap();
        let item = tx.insert_item(new_item(seller.id, "Lamp")).await.unwrap();

        let moved = tx
            .transition_item(item.id, ItemStatus::Initial, ItemStatus::OnSale)
            .await
            .unwrap();
        assert_eq!(moved.status, ItemStatus::OnSale);
        assert!(moved.updated_at >= item.updated_at);

        let stale = tx
            .transition_item(item.id, ItemStatus::Initial, ItemStatus::OnSale)
            .await;
        assert!(matches!(stale, Err(StoreError::Conflict { .. })));

        let missing = tx
            .transition_item(ItemId::new(99), ItemStatus::OnSale, ItemStatus::SoldOut)
            .await;
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn query_items_filters_and_orders() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let alice = tx.insert_user("alice", "hash").await.unwrap();
        let bob = tx.insert_user("bob", "hash").await.unwrap();
        let lamp = tx.insert_item(new_item(alice.id, "Desk lamp")).await.unwrap();
        let chair = tx.insert_item(new_item(bob.id, "Chair")).await.unwrap();
        tx.insert_item(new_item(bob.id, "Floor lamp")).await.unwrap();
        tx.transition_item(chair.id, ItemStatus::Initial, ItemStatus::OnSale)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();

        let on_sale = tx
            .query_items(ItemQuery::new().status(ItemStatus::OnSale))
            .await
            .unwrap();
        assert_eq!(on_sale.len(), 1);
        assert_eq!(on_sale[0].id, chair.id);
        assert_eq!(on_sale[0].category_name, "Fashion");

        let lamps = tx
            .query_items(ItemQuery::new().name_contains("lamp"))
            .await
            .unwrap();
        assert_eq!(lamps.len(), 2);

        let alices = tx
            .query_items(ItemQuery::for_seller(alice.id))
            .await
            .unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].id, lamp.id);

        let page = tx
            .query_items(ItemQuery::new().offset(1).limit(1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn categories_are_listed_in_id_order() {
        let store = store();
        let mut tx = store.begin().await.unwrap();

        let categories = tx.list_categories().await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name, "Fashion");
        assert!(tx.get_category(CategoryId::new(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn total_balance_sums_committed_rows() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let a = tx.insert_user("a", "hash").await.unwrap();
        let b = tx.insert_user("b", "hash").await.unwrap();
        tx.set_balance(a.id, Money::new(30)).await.unwrap();
        tx.set_balance(b.id, Money::new(12)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.total_balance().await, 42);
        assert_eq!(store.user_count().await, 2);
    }
}

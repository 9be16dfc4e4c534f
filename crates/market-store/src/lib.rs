pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use common::{CategoryId, ItemId, ItemStatus, Money, UserId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryUnitOfWork};
pub use postgres::{PostgresStore, PostgresUnitOfWork};
pub use query::ItemQuery;
pub use record::{Category, Item, ItemSummary, NewItem, User};
pub use store::{CatalogStore, LedgerStore, Store, UnitOfWork};

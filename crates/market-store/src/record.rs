//! Row types shared by every store implementation.

use chrono::{DateTime, Utc};
use common::{CategoryId, ItemId, ItemStatus, Money, UserId};
use serde::{Deserialize, Serialize};

/// A registered user and their ledger balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,

    /// Opaque credential written once at registration. Never returned to clients.
    #[serde(skip_serializing)]
    pub credential: String,

    pub balance: Money,
}

/// Reference category an item is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A listed item.
///
/// `seller_id` is fixed at creation; a sale changes `status` and balances only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: Money,
    pub description: String,
    pub category_id: CategoryId,
    pub seller_id: UserId,
    pub image: Vec<u8>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a new item row. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub price: Money,
    pub description: String,
    pub category_id: CategoryId,
    pub seller_id: UserId,
    pub image: Vec<u8>,
    pub status: ItemStatus,
}

/// An item joined with its category name, without the image payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub name: String,
    pub price: Money,
    pub description: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub seller_id: UserId,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemSummary {
    /// Builds the summary of `item` filed under `category_name`.
    pub fn from_item(item: &Item, category_name: String) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            price: item.price,
            description: item.description.clone(),
            category_id: item.category_id,
            category_name,
            seller_id: item.seller_id,
            status: item.status,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

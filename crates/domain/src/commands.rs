//! Marketplace commands.
//!
//! Each command carries an already-authenticated acting user supplied by the
//! caller together with already-parsed request values.

use common::{CategoryId, ItemId, Money, UserId};

/// Command to list a new item in the `Initial` state.
#[derive(Clone)]
pub struct ListItem {
    /// The user listing the item. Becomes its permanent seller.
    pub seller_id: UserId,
    pub name: String,
    pub category_id: CategoryId,
    pub price: Money,
    pub description: String,

    /// Opaque image payload, stored as-is.
    pub image: Vec<u8>,
}

impl ListItem {
    /// Creates a new ListItem command with an empty image.
    pub fn new(
        seller_id: UserId,
        name: impl Into<String>,
        category_id: CategoryId,
        price: Money,
    ) -> Self {
        Self {
            seller_id,
            name: name.into(),
            category_id,
            price,
            description: String::new(),
            image: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the image payload.
    pub fn image(mut self, image: Vec<u8>) -> Self {
        self.image = image;
        self
    }
}

impl std::fmt::Debug for ListItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListItem")
            .field("seller_id", &self.seller_id)
            .field("name", &self.name)
            .field("category_id", &self.category_id)
            .field("price", &self.price)
            .field("image_bytes", &self.image.len())
            .finish_non_exhaustive()
    }
}

/// Command to put an `Initial` item on sale.
#[derive(Debug, Clone, Copy)]
pub struct SellItem {
    pub acting_user_id: UserId,
    pub item_id: ItemId,
}

impl SellItem {
    /// Creates a new SellItem command.
    pub fn new(acting_user_id: UserId, item_id: ItemId) -> Self {
        Self {
            acting_user_id,
            item_id,
        }
    }
}

/// Command to buy an `OnSale` item.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseItem {
    pub buyer_id: UserId,
    pub item_id: ItemId,
}

impl PurchaseItem {
    /// Creates a new PurchaseItem command.
    pub fn new(buyer_id: UserId, item_id: ItemId) -> Self {
        Self { buyer_id, item_id }
    }
}

/// Command to add funds to a user's balance.
#[derive(Debug, Clone, Copy)]
pub struct TopUpBalance {
    pub user_id: UserId,
    pub amount: Money,
}

impl TopUpBalance {
    /// Creates a new TopUpBalance command.
    pub fn new(user_id: UserId, amount: Money) -> Self {
        Self { user_id, amount }
    }
}

/// Command to create a user record.
///
/// `credential` is produced by the authentication layer (for example a
/// password hash) and is stored without inspection.
#[derive(Clone)]
pub struct RegisterUser {
    pub name: String,
    pub credential: String,
}

impl RegisterUser {
    /// Creates a new RegisterUser command.
    pub fn new(name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credential: credential.into(),
        }
    }
}

impl std::fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUser")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

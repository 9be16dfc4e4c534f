use common::{ItemStatus, UserId};

use crate::record::ItemSummary;

/// Builder for item listing queries.
///
/// Results are always ordered by most recently updated first, then by id
/// descending so that ties are stable.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// Filter by status (any of these).
    pub statuses: Option<Vec<ItemStatus>>,

    /// Filter by seller.
    pub seller_id: Option<UserId>,

    /// Case-insensitive substring the item name must contain.
    pub name_contains: Option<String>,

    /// Maximum number of items to return.
    pub limit: Option<usize>,

    /// Number of items to skip.
    pub offset: Option<usize>,
}

impl ItemQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for items in any of the given states.
    pub fn with_statuses(statuses: &[ItemStatus]) -> Self {
        Self {
            statuses: Some(statuses.to_vec()),
            ..Default::default()
        }
    }

    /// Creates a query for items listed by one seller.
    pub fn for_seller(seller_id: UserId) -> Self {
        Self {
            seller_id: Some(seller_id),
            ..Default::default()
        }
    }

    /// Filters by a single status.
    pub fn status(mut self, status: ItemStatus) -> Self {
        self.statuses = Some(vec![status]);
        self
    }

    /// Filters by seller.
    pub fn seller(mut self, seller_id: UserId) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    /// Filters by a name fragment.
    pub fn name_contains(mut self, fragment: impl Into<String>) -> Self {
        self.name_contains = Some(fragment.into());
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips a number of results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the summary passes every filter of this query.
    ///
    /// Used by the in-memory store; the PostgreSQL store pushes the same
    /// filters into SQL.
    pub fn matches(&self, item: &ItemSummary) -> bool {
        if let Some(ref statuses) = self.statuses
            && !statuses.contains(&item.status)
        {
            return false;
        }
        if let Some(seller) = self.seller_id
            && item.seller_id != seller
        {
            return false;
        }
        if let Some(ref fragment) = self.name_contains
            && !item.name.to_lowercase().contains(&fragment.to_lowercase())
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{CategoryId, ItemId, Money};

    use super::*;

    fn summary(name: &str, seller: i64, status: ItemStatus) -> ItemSummary {
        ItemSummary {
            id: ItemId::new(1),
            name: name.to_string(),
            price: Money::new(100),
            description: String::new(),
            category_id: CategoryId::new(1),
            category_name: "Fashion".to_string(),
            seller_id: UserId::new(seller),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        let query = ItemQuery::new();
        assert!(query.matches(&summary("Lamp", 1, ItemStatus::Initial)));
        assert!(query.matches(&summary("Desk", 2, ItemStatus::SoldOut)));
    }

    #[test]
    fn status_filter() {
        let query = ItemQuery::with_statuses(&[ItemStatus::OnSale, ItemStatus::SoldOut]);
        assert!(!query.matches(&summary("Lamp", 1, ItemStatus::Initial)));
        assert!(query.matches(&summary("Lamp", 1, ItemStatus::OnSale)));
        assert!(query.matches(&summary("Lamp", 1, ItemStatus::SoldOut)));
    }

    #[test]
    fn seller_and_name_filters_combine() {
        let query = ItemQuery::for_seller(UserId::new(1)).name_contains("LAM");
        assert!(query.matches(&summary("Desk lamp", 1, ItemStatus::OnSale)));
        assert!(!query.matches(&summary("Desk lamp", 2, ItemStatus::OnSale)));
        assert!(!query.matches(&summary("Chair", 1, ItemStatus::OnSale)));
    }
}

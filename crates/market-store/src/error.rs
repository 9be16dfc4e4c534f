use thiserror::Error;

/// Errors that can occur when interacting with the marketplace store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// An insert collided with a uniqueness constraint.
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    /// A conditional write found the row in a different state than expected.
    #[error("Conditional write on {entity} {id} affected no rows")]
    Conflict { entity: &'static str, id: i64 },

    /// A query parameter cannot be expressed in SQL.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A stored value could not be decoded into a domain type.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub(crate) fn user_not_found(id: common::UserId) -> Self {
        StoreError::NotFound {
            entity: "user",
            id: id.as_i64(),
        }
    }

    pub(crate) fn item_not_found(id: common::ItemId) -> Self {
        StoreError::NotFound {
            entity: "item",
            id: id.as_i64(),
        }
    }

    /// Returns true for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<common::UnknownStatus> for StoreError {
    fn from(e: common::UnknownStatus) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CategoryId, ItemId, ItemStatus, Money, UserId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Category, Item, ItemQuery, ItemSummary, NewItem, Result, StoreError, User,
    store::{CatalogStore, LedgerStore, Store, UnitOfWork},
};

const USER_NAME_CONSTRAINT: &str = "users_name_unique";

const ITEM_COLUMNS: &str = "id, name, price, description, category_id, seller_id, image, status, created_at, updated_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresUnitOfWork { tx })
    }
}

/// Unit of work backed by one database transaction.
///
/// Row locks taken by `lock_user`/`lock_item` are held until commit or
/// rollback. Dropping the value without committing rolls the transaction back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PostgresUnitOfWork {
    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            credential: row.try_get("credential")?,
            balance: Money::new(row.try_get("balance")?),
        })
    }

    fn row_to_item(row: PgRow) -> Result<Item> {
        Ok(Item {
            id: ItemId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            price: Money::new(row.try_get("price")?),
            description: row.try_get("description")?,
            category_id: CategoryId::new(row.try_get("category_id")?),
            seller_id: UserId::new(row.try_get("seller_id")?),
            image: row.try_get("image")?,
            status: ItemStatus::try_from(row.try_get::<i16, _>("status")?)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    fn row_to_summary(row: PgRow) -> Result<ItemSummary> {
        Ok(ItemSummary {
            id: ItemId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            price: Money::new(row.try_get("price")?),
            description: row.try_get("description")?,
            category_id: CategoryId::new(row.try_get("category_id")?),
            category_name: row.try_get("category_name")?,
            seller_id: UserId::new(row.try_get("seller_id")?),
            status: ItemStatus::try_from(row.try_get::<i16, _>("status")?)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn fetch_user(&mut self, user_id: UserId, for_update: bool) -> Result<User> {
        let sql = if for_update {
            "SELECT id, name, credential, balance FROM users WHERE id = $1 FOR UPDATE"
        } else {
            "SELECT id, name, credential, balance FROM users WHERE id = $1"
        };

        let row = sqlx::query(sql)
            .bind(user_id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => Self::row_to_user(row),
            None => Err(StoreError::user_not_found(user_id)),
        }
    }

    async fn fetch_item(&mut self, item_id: ItemId, for_update: bool) -> Result<Item> {
        let sql = if for_update {
            format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 FOR UPDATE")
        } else {
            format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1")
        };

        let row = sqlx::query(&sql)
            .bind(item_id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => Self::row_to_item(row),
            None => Err(StoreError::item_not_found(item_id)),
        }
    }
}

#[async_trait]
impl LedgerStore for PostgresUnitOfWork {
    async fn get_user(&mut self, user_id: UserId) -> Result<User> {
        self.fetch_user(user_id, false).await
    }

    async fn lock_user(&mut self, user_id: UserId) -> Result<User> {
        self.fetch_user(user_id, true).await
    }

    async fn get_balance(&mut self, user_id: UserId) -> Result<Money> {
        let balance: Option<i64> = sqlx::query_scalar("SELECT balance FROM users WHERE id = $1")
            .bind(user_id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        balance
            .map(Money::new)
            .ok_or_else(|| StoreError::user_not_found(user_id))
    }

    async fn set_balance(&mut self, user_id: UserId, balance: Money) -> Result<()> {
        let result = sqlx::query("UPDATE users SET balance = $2 WHERE id = $1")
            .bind(user_id.as_i64())
            .bind(balance.units())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::user_not_found(user_id));
        }
        Ok(())
    }

    async fn insert_user(&mut self, name: &str, credential: &str) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, credential, balance)
            VALUES ($1, $2, 0)
            RETURNING id, name, credential, balance
            "#,
        )
        .bind(name)
        .bind(credential)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(USER_NAME_CONSTRAINT)
            {
                return StoreError::AlreadyExists {
                    entity: "user",
                    key: name.to_string(),
                };
            }
            StoreError::Database(e)
        })?;

        Self::row_to_user(row)
    }
}

#[async_trait]
impl CatalogStore for PostgresUnitOfWork {
    async fn get_category(&mut self, category_id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = $1")
            .bind(category_id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => Ok(Some(Category {
                id: CategoryId::new(row.try_get("id")?),
                name: row.try_get("name")?,
            })),
            None => Ok(None),
        }
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY id ASC")
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Category {
                    id: CategoryId::new(row.try_get("id")?),
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn insert_item(&mut self, item: NewItem) -> Result<Item> {
        let sql = format!(
            r#"
            INSERT INTO items (name, price, description, category_id, seller_id, image, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(&item.name)
            .bind(item.price.units())
            .bind(&item.description)
            .bind(item.category_id.as_i64())
            .bind(item.seller_id.as_i64())
            .bind(&item.image)
            .bind(item.status.as_i16())
            .fetch_one(&mut *self.tx)
            .await?;

        Self::row_to_item(row)
    }

    async fn get_item(&mut self, item_id: ItemId) -> Result<Item> {
        self.fetch_item(item_id, false).await
    }

    async fn lock_item(&mut self, item_id: ItemId) -> Result<Item> {
        self.fetch_item(item_id, true).await
    }

    async fn transition_item(
        &mut self,
        item_id: ItemId,
        from: ItemStatus,
        to: ItemStatus,
    ) -> Result<Item> {
        let sql = format!(
            r#"
            UPDATE items SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING {ITEM_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(item_id.as_i64())
            .bind(from.as_i16())
            .bind(to.as_i16())
            .fetch_optional(&mut *self.tx)
            .await?;

        if let Some(row) = row {
            return Self::row_to_item(row);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM items WHERE id = $1)")
            .bind(item_id.as_i64())
            .fetch_one(&mut *self.tx)
            .await?;

        if exists {
            Err(StoreError::Conflict {
                entity: "item",
                id: item_id.as_i64(),
            })
        } else {
            Err(StoreError::item_not_found(item_id))
        }
    }

    async fn get_item_image(&mut self, item_id: ItemId) -> Result<Vec<u8>> {
        let image: Option<Vec<u8>> = sqlx::query_scalar("SELECT image FROM items WHERE id = $1")
            .bind(item_id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        image.ok_or_else(|| StoreError::item_not_found(item_id))
    }

    async fn query_items(&mut self, query: ItemQuery) -> Result<Vec<ItemSummary>> {
        let limit = page_bound("limit", query.limit)?;
        let offset = page_bound("offset", query.offset)?;

        let mut sql = String::from(
            r#"
            SELECT i.id, i.name, i.price, i.description, i.category_id, c.name AS category_name,
                   i.seller_id, i.status, i.created_at, i.updated_at
            FROM items i
            JOIN categories c ON c.id = i.category_id
            WHERE 1=1"#,
        );
        let mut param_count = 0;

        // Build dynamic query
        if query.statuses.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND i.status = ANY(${param_count})"));
        }
        if query.seller_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND i.seller_id = ${param_count}"));
        }
        if query.name_contains.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND i.name ILIKE ${param_count}"));
        }

        sql.push_str(" ORDER BY i.updated_at DESC, i.id DESC");

        if limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(statuses) = query.statuses {
            let codes: Vec<i16> = statuses.iter().map(ItemStatus::as_i16).collect();
            sqlx_query = sqlx_query.bind(codes);
        }
        if let Some(seller_id) = query.seller_id {
            sqlx_query = sqlx_query.bind(seller_id.as_i64());
        }
        if let Some(fragment) = query.name_contains {
            sqlx_query = sqlx_query.bind(format!("%{}%", escape_like(&fragment)));
        }
        if let Some(limit) = limit {
            sqlx_query = sqlx_query.bind(limit);
        }
        if let Some(offset) = offset {
            sqlx_query = sqlx_query.bind(offset);
        }

        let rows = sqlx_query.fetch_all(&mut *self.tx).await?;
        rows.into_iter().map(Self::row_to_summary).collect()
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Escapes `LIKE` wildcards so a search fragment matches literally.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Converts a pagination bound to the `BIGINT` Postgres expects.
fn page_bound(what: &str, value: Option<usize>) -> Result<Option<i64>> {
    value
        .map(|v| {
            i64::try_from(v)
                .map_err(|_| StoreError::InvalidQuery(format!("{what} {v} is out of range")))
        })
        .transpose()
}

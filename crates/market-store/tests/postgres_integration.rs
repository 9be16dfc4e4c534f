//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p market-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use market_store::{
    CatalogStore, CategoryId, ItemQuery, ItemStatus, LedgerStore, Money, NewItem, PostgresStore,
    Store, StoreError, UnitOfWork, UserId,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(pool.clone()).run_migrations().await.unwrap();
            pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and empty user and item tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE items, users RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

async fn create_user(store: &PostgresStore, name: &str, balance: i64) -> UserId {
    let mut tx = store.begin().await.unwrap();
    let user = tx.insert_user(name, "hash").await.unwrap();
    tx.set_balance(user.id, Money::new(balance)).await.unwrap();
    tx.commit().await.unwrap();
    user.id
}

fn new_item(seller_id: UserId, name: &str, status: ItemStatus) -> NewItem {
    NewItem {
        name: name.to_string(),
        price: Money::new(100),
        description: "test item".to_string(),
        category_id: CategoryId::new(1),
        seller_id,
        image: vec![0xFF, 0xD8, 0xFF],
        status,
    }
}

#[tokio::test]
async fn seeded_categories_are_listed() {
    let store = get_test_store().await;
    let mut tx = store.begin().await.unwrap();

    let categories = tx.list_categories().await.unwrap();
    assert_eq!(categories.len(), 6);
    assert_eq!(categories[0].name, "Fashion");
    assert!(tx.get_category(CategoryId::new(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_user_name_is_typed_already_exists() {
    let store = get_test_store().await;
    create_user(&store, "alice", 0).await;

    let mut tx = store.begin().await.unwrap();
    let err = tx.insert_user("alice", "other").await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { entity: "user", .. }));
}

#[tokio::test]
async fn balance_round_trip_and_missing_user() {
    let store = get_test_store().await;
    let user = create_user(&store, "alice", 250).await;

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.get_balance(user).await.unwrap(), Money::new(250));
    assert!(tx.get_user(UserId::new(9_999)).await.unwrap_err().is_not_found());
    assert!(
        tx.set_balance(UserId::new(9_999), Money::new(1))
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn negative_balance_is_refused_by_the_database() {
    let store = get_test_store().await;
    let user = create_user(&store, "alice", 10).await;

    let mut tx = store.begin().await.unwrap();
    let err = tx.set_balance(user, Money::new(-1)).await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));
}

#[tokio::test]
async fn rollback_discards_writes() {
    let store = get_test_store().await;
    let user = create_user(&store, "alice", 10).await;

    let mut tx = store.begin().await.unwrap();
    tx.set_balance(user, Money::new(500)).await.unwrap();
    tx.rollback().await.unwrap();

    {
        let mut tx = store.begin().await.unwrap();
        tx.set_balance(user, Money::new(700)).await.unwrap();
        // dropped without commit
    }

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.get_balance(user).await.unwrap(), Money::new(10));
}

#[tokio::test]
async fn transition_is_conditional_on_current_status() {
    let store = get_test_store().await;
    let seller = create_user(&store, "seller", 0).await;

    let mut tx = store.begin().await.unwrap();
    let item = tx
        .insert_item(new_item(seller, "Lamp", ItemStatus::Initial))
        .await
        .unwrap();
    assert_eq!(item.status, ItemStatus::Initial);

    let err = tx
        .transition_item(item.id, ItemStatus::OnSale, ItemStatus::SoldOut)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { entity: "item", .. }));

    let on_sale = tx
        .transition_item(item.id, ItemStatus::Initial, ItemStatus::OnSale)
        .await
        .unwrap();
    assert_eq!(on_sale.status, ItemStatus::OnSale);
    assert!(on_sale.updated_at >= item.updated_at);

    let missing = tx
        .transition_item(
            market_store::ItemId::new(9_999),
            ItemStatus::Initial,
            ItemStatus::OnSale,
        )
        .await
        .unwrap_err();
    assert!(missing.is_not_found());
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert_eq!(
        tx.get_item_image(item.id).await.unwrap(),
        vec![0xFF, 0xD8, 0xFF]
    );
}

#[tokio::test]
async fn query_filters_and_escapes_like_patterns() {
    let store = get_test_store().await;
    let seller = create_user(&store, "seller", 0).await;
    let other = create_user(&store, "other", 0).await;

    let mut tx = store.begin().await.unwrap();
    tx.insert_item(new_item(seller, "Red Lamp", ItemStatus::OnSale))
        .await
        .unwrap();
    tx.insert_item(new_item(seller, "100% wool", ItemStatus::Initial))
        .await
        .unwrap();
    tx.insert_item(new_item(other, "Blue lamp", ItemStatus::SoldOut))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let on_sale = tx
        .query_items(ItemQuery::with_statuses(&[ItemStatus::OnSale]))
        .await
        .unwrap();
    assert_eq!(on_sale.len(), 1);
    assert_eq!(on_sale[0].category_name, "Fashion");

    let lamps = tx
        .query_items(ItemQuery::new().name_contains("LAMP"))
        .await
        .unwrap();
    assert_eq!(lamps.len(), 2);

    let percent = tx
        .query_items(ItemQuery::new().name_contains("%"))
        .await
        .unwrap();
    assert_eq!(percent.len(), 1);

    let by_seller = tx.query_items(ItemQuery::for_seller(seller)).await.unwrap();
    assert_eq!(by_seller.len(), 2);

    let page = tx.query_items(ItemQuery::new().limit(1).offset(1)).await.unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn row_locks_let_exactly_one_sale_through() {
    let store = get_test_store().await;
    let seller = create_user(&store, "seller", 0).await;

    let mut tx = store.begin().await.unwrap();
    let item = tx
        .insert_item(new_item(seller, "Lamp", ItemStatus::OnSale))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut buyers = Vec::new();
    for i in 0..8 {
        buyers.push(create_user(&store, &format!("buyer-{i}"), 100).await);
    }

    let attempts = buyers.into_iter().map(|buyer| {
        let store = store.clone();
        tokio::spawn(async move {
            let mut tx = store.begin().await?;
            let locked = tx.lock_item(item.id).await?;
            if locked.status != ItemStatus::OnSale {
                return Ok(false);
            }
            // Users in ascending id order; the seller was created first.
            let seller_row = tx.lock_user(locked.seller_id).await?;
            let user = tx.lock_user(buyer).await?;
            tx.set_balance(user.id, Money::new(user.balance.units() - locked.price.units()))
                .await?;
            tx.set_balance(
                seller_row.id,
                Money::new(seller_row.balance.units() + locked.price.units()),
            )
            .await?;
            tx.transition_item(item.id, ItemStatus::OnSale, ItemStatus::SoldOut)
                .await?;
            tx.commit().await?;
            Ok::<_, StoreError>(true)
        })
    });

    let results = futures_util::future::join_all(attempts).await;
    let wins = results
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(wins, 1);

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.get_item(item.id).await.unwrap().status, ItemStatus::SoldOut);
    assert_eq!(tx.get_balance(seller).await.unwrap(), Money::new(100));

    let total: i64 = sqlx::query_scalar("SELECT SUM(balance)::BIGINT FROM users")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(total, 800);
}

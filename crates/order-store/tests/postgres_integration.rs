//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p order-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use domain::{CompensationRecord, CustomerId, Money, Order, OrderLine, OrderStatus};
use order_store::{OrderId, OrderStore, PostgresOrderStore, StoreError};
use serial_test::serial;
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

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresOrderStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresOrderStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_lines, orders, payment_compensations")
        .execute(&pool)
        .await
        .unwrap();

    PostgresOrderStore::new(pool)
}

fn confirmed_order() -> Order {
    let mut order = Order::new(
        CustomerId::new(),
        vec![
            OrderLine::new("P1", "Widget", 2, Money::from_dollars(10)).unwrap(),
            OrderLine::new("P2", "Gadget", 1, Money::from_dollars(40)).unwrap(),
        ],
    )
    .unwrap();
    order.confirm("PAY-0001").unwrap();
    order
}

#[tokio::test]
#[serial]
async fn save_and_load_order_with_lines() {
    let store = get_test_store().await;
    let order = confirmed_order();

    let id = store.save(&order).await.unwrap();
    let loaded = store.get(id).await.unwrap().unwrap();

    assert_eq!(loaded.id(), Some(id));
    assert_eq!(loaded.customer_id(), order.customer_id());
    assert_eq!(loaded.status(), OrderStatus::Confirmed);
    assert_eq!(loaded.total(), Money::from_dollars(60));
    assert_eq!(loaded.payment_ref(), Some("PAY-0001"));
    assert_eq!(loaded.lines(), order.lines());
}

#[tokio::test]
#[serial]
async fn missing_order_returns_none() {
    let store = get_test_store().await;
    assert!(store.get(OrderId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn failed_line_insert_leaves_no_header() {
    let store = get_test_store().await;
    let order = confirmed_order();

    // Break line inserts only; the header insert must be rolled back with them.
    sqlx::query("ALTER TABLE order_lines ADD CONSTRAINT reject_all CHECK (quantity < 0) NOT VALID")
        .execute(store.pool())
        .await
        .unwrap();

    let result = store.save(&order).await;

    sqlx::query("ALTER TABLE order_lines DROP CONSTRAINT reject_all")
        .execute(store.pool())
        .await
        .unwrap();

    assert!(matches!(result, Err(StoreError::Database(_))));
    let headers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(headers, 0);
}

#[tokio::test]
#[serial]
async fn compensation_records_round_trip() {
    let store = get_test_store().await;
    let customer = CustomerId::new();

    let record = CompensationRecord::new(
        "PAY-0042",
        customer,
        Money::from_cents(6000),
        "order store unavailable",
    );
    let id = store.record_compensation(record.clone()).await.unwrap();
    assert_eq!(id, record.id);

    let stored = store.compensations().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].transaction_ref, "PAY-0042");
    assert_eq!(stored[0].customer_id, customer);
    assert_eq!(stored[0].amount, Money::from_cents(6000));
    assert_eq!(stored[0].reason, "order store unavailable");
}

#[tokio::test]
#[serial]
async fn persisted_order_cannot_be_saved_again() {
    let store = get_test_store().await;
    let id = store.save(&confirmed_order()).await.unwrap();
    let loaded = store.get(id).await.unwrap().unwrap();

    assert!(matches!(
        store.save(&loaded).await,
        Err(StoreError::AlreadyPersisted(_))
    ));
}

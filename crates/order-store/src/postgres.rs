use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{
    CompensationId, CompensationRecord, CustomerId, Money, Order, OrderLine, OrderRecord,
    OrderStatus,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{OrderStore, Result, StoreError};

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_line(row: &PgRow) -> Result<OrderLine> {
        let product_id: String = row.try_get("product_id")?;
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| {
            StoreError::Corrupt(format!("quantity {quantity} out of range for {product_id}"))
        })?;

        Ok(OrderLine::new(
            product_id,
            row.try_get::<String, _>("product_name")?,
            quantity,
            Money::from_cents(row.try_get("unit_price_cents")?),
        )?)
    }

    fn row_to_compensation(row: PgRow) -> Result<CompensationRecord> {
        Ok(CompensationRecord {
            id: CompensationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            transaction_ref: row.try_get("transaction_ref")?,
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            reason: row.try_get("reason")?,
            recorded_at: row.try_get::<DateTime<Utc>, _>("recorded_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(customer_id = %order.customer_id()))]
    async fn save(&self, order: &Order) -> Result<OrderId> {
        if let Some(id) = order.id() {
            return Err(StoreError::AlreadyPersisted(id));
        }

        let order_id = OrderId::new();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, total_cents, status, payment_ref, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.customer_id().as_uuid())
        .bind(order.total().cents())
        .bind(order.status().as_str())
        .bind(order.payment_ref())
        .bind(order.created_at())
        .execute(&mut *tx)
        .await?;

        for (line_no, line) in order.lines().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, line_no, product_id, product_name, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(line_no as i32)
            .bind(line.product_id().as_str())
            .bind(line.product_name())
            .bind(i64::from(line.quantity()))
            .bind(line.unit_price().cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        metrics::counter!("orders_persisted_total").increment(1);
        tracing::debug!(%order_id, lines = order.lines().len(), "order persisted");
        Ok(order_id)
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let header = sqlx::query(
            r#"
            SELECT id, customer_id, total_cents, status, payment_ref, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, unit_price_cents
            FROM order_lines
            WHERE order_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(Self::row_to_line)
        .collect::<Result<Vec<_>>>()?;

        let status: String = header.try_get("status")?;
        let record = OrderRecord {
            id: OrderId::from_uuid(header.try_get::<Uuid, _>("id")?),
            customer_id: CustomerId::from_uuid(header.try_get::<Uuid, _>("customer_id")?),
            lines,
            total: Money::from_cents(header.try_get("total_cents")?),
            status: status.parse::<OrderStatus>()?,
            created_at: header.try_get("created_at")?,
            payment_ref: header.try_get("payment_ref")?,
        };

        Ok(Some(Order::try_from(record)?))
    }

    #[tracing::instrument(skip(self, record), fields(transaction_ref = %record.transaction_ref))]
    async fn record_compensation(&self, record: CompensationRecord) -> Result<CompensationId> {
        sqlx::query(
            r#"
            INSERT INTO payment_compensations (id, transaction_ref, customer_id, amount_cents, reason, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.transaction_ref)
        .bind(record.customer_id.as_uuid())
        .bind(record.amount.cents())
        .bind(&record.reason)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(record.id)
    }

    async fn compensations(&self) -> Result<Vec<CompensationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, transaction_ref, customer_id, amount_cents, reason, recorded_at
            FROM payment_compensations
            ORDER BY recorded_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_compensation).collect()
    }
}

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;

use orderbot_core::domain::order::{OrderId, OrderStatus};
use orderbot_core::errors::StorageError;
use orderbot_core::storage::OrderStorage;

use super::RepositoryError;
use crate::DbPool;

/// SQLite-backed order storage.
///
/// Line items are committed individually; an order only becomes visible to
/// status lookups once its tracking row exists.
#[derive(Clone)]
pub struct SqlOrderStorage {
    pool: DbPool,
}

impl SqlOrderStorage {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn allocate_order_id(&self) -> Result<OrderId, RepositoryError> {
        let result = sqlx::query("INSERT INTO order_sequence (created_at) VALUES (?)")
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(OrderId(result.last_insert_rowid()))
    }

    pub async fn menu_price(&self, food_item: &str) -> Result<(i64, Decimal), RepositoryError> {
        let row = sqlx::query("SELECT item_id, price FROM food_items WHERE name = ?")
            .bind(food_item.trim())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::UnknownFoodItem(food_item.to_string()))?;

        let item_id: i64 =
            row.try_get("item_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let price: String =
            row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        Ok((item_id, parse_decimal(&price)?))
    }

    pub async fn add_line(
        &self,
        food_item: &str,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<(), RepositoryError> {
        let (item_id, unit_price) = self.menu_price(food_item).await?;
        let line_total = unit_price * Decimal::from(quantity);

        sqlx::query(
            "INSERT INTO orders (order_id, item_id, quantity, total_price)
             VALUES (?, ?, ?, ?)",
        )
        .bind(order_id.0)
        .bind(item_id)
        .bind(i64::from(quantity))
        .bind(line_total.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn save_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO order_tracking (order_id, status, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(order_id) DO UPDATE SET
                 status = excluded.status,
                 updated_at = excluded.updated_at",
        )
        .bind(order_id.0)
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Moves an already tracked order to `status`. Returns false for unknown orders.
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE order_tracking SET status = ?, updated_at = ? WHERE order_id = ?")
                .bind(status.as_str())
                .bind(Utc::now().to_rfc3339())
                .bind(order_id.0)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn order_total(&self, order_id: OrderId) -> Result<Decimal, RepositoryError> {
        let rows = sqlx::query("SELECT total_price FROM orders WHERE order_id = ?")
            .bind(order_id.0)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().try_fold(Decimal::ZERO, |total, row| {
            let line: String =
                row.try_get("total_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            Ok(total + parse_decimal(&line)?)
        })
    }

    pub async fn find_status(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderStatus>, RepositoryError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM order_tracking WHERE order_id = ?")
                .bind(order_id.0)
                .fetch_optional(&self.pool)
                .await?;

        status
            .map(|raw| {
                OrderStatus::from_str(&raw).map_err(|e| RepositoryError::Decode(e.to_string()))
            })
            .transpose()
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| RepositoryError::Decode(format!("invalid price `{raw}`: {e}")))
}

#[async_trait::async_trait]
impl OrderStorage for SqlOrderStorage {
    async fn next_order_id(&self) -> Result<OrderId, StorageError> {
        Ok(self.allocate_order_id().await?)
    }

    async fn insert_order_item(
        &self,
        food_item: &str,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<(), StorageError> {
        Ok(self.add_line(food_item, quantity, order_id).await?)
    }

    async fn insert_order_tracking(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StorageError> {
        Ok(self.save_status(order_id, status).await?)
    }

    async fn total_order_price(&self, order_id: OrderId) -> Result<Decimal, StorageError> {
        Ok(self.order_total(order_id).await?)
    }

    async fn order_status(&self, order_id: OrderId) -> Result<Option<OrderStatus>, StorageError> {
        Ok(self.find_status(order_id).await?)
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::order::{OrderId, OrderStatus};
use crate::errors::StorageError;

/// Persistence collaborator used when an order is placed or tracked.
///
/// Line items are written one call at a time and the caller stops at the first
/// failure. An implementation must either roll back the items already written
/// for that order id or keep them invisible to `order_status` until
/// `insert_order_tracking` has been called.
#[async_trait]
pub trait OrderStorage: Send + Sync {
    async fn next_order_id(&self) -> Result<OrderId, StorageError>;

    async fn insert_order_item(
        &self,
        food_item: &str,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<(), StorageError>;

    async fn insert_order_tracking(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StorageError>;

    async fn total_order_price(&self, order_id: OrderId) -> Result<Decimal, StorageError>;

    async fn order_status(&self, order_id: OrderId) -> Result<Option<OrderStatus>, StorageError>;
}

#[async_trait]
impl<T> OrderStorage for Arc<T>
where
    T: OrderStorage + ?Sized,
{
    async fn next_order_id(&self) -> Result<OrderId, StorageError> {
        (**self).next_order_id().await
    }

    async fn insert_order_item(
        &self,
        food_item: &str,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<(), StorageError> {
        (**self).insert_order_item(food_item, quantity, order_id).await
    }

    async fn insert_order_tracking(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StorageError> {
        (**self).insert_order_tracking(order_id, status).await
    }

    async fn total_order_price(&self, order_id: OrderId) -> Result<Decimal, StorageError> {
        (**self).total_order_price(order_id).await
    }

    async fn order_status(&self, order_id: OrderId) -> Result<Option<OrderStatus>, StorageError> {
        (**self).order_status(order_id).await
    }
}

use std::collections::HashMap;

use rust_decimal::Decimal;
use tokio::sync::RwLock;

use orderbot_core::domain::order::{OrderId, OrderStatus};
use orderbot_core::errors::StorageError;
use orderbot_core::storage::OrderStorage;

use crate::fixtures::MENU;

#[derive(Default)]
struct Ledger {
    last_order_id: i64,
    lines: HashMap<OrderId, Vec<Decimal>>,
    tracking: HashMap<OrderId, OrderStatus>,
}

/// Process-local order storage for tests and local runs without SQLite.
#[derive(Default)]
pub struct InMemoryOrderStorage {
    menu: HashMap<String, Decimal>,
    ledger: RwLock<Ledger>,
}

impl InMemoryOrderStorage {
    pub fn with_menu<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let menu = items
            .into_iter()
            .map(|(name, price)| (menu_key(name.as_ref()), price))
            .collect();
        Self { menu, ledger: RwLock::default() }
    }

    /// Storage preloaded with the restaurant menu.
    pub fn with_default_menu() -> Self {
        Self::with_menu(MENU.iter().map(|item| (item.name, item.price())))
    }

    pub async fn tracked_orders(&self) -> usize {
        self.ledger.read().await.tracking.len()
    }
}

fn menu_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[async_trait::async_trait]
impl OrderStorage for InMemoryOrderStorage {
    async fn next_order_id(&self) -> Result<OrderId, StorageError> {
        let mut ledger = self.ledger.write().await;
        ledger.last_order_id += 1;
        Ok(OrderId(ledger.last_order_id))
    }

    async fn insert_order_item(
        &self,
        food_item: &str,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<(), StorageError> {
        let price = self
            .menu
            .get(&menu_key(food_item))
            .copied()
            .ok_or_else(|| StorageError::UnknownFoodItem(food_item.to_string()))?;

        let mut ledger = self.ledger.write().await;
        ledger.lines.entry(order_id).or_default().push(price * Decimal::from(quantity));
        Ok(())
    }

    async fn insert_order_tracking(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StorageError> {
        let mut ledger = self.ledger.write().await;
        ledger.tracking.insert(order_id, status);
        Ok(())
    }

    async fn total_order_price(&self, order_id: OrderId) -> Result<Decimal, StorageError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.lines.get(&order_id).map(|lines| lines.iter().sum()).unwrap_or(Decimal::ZERO))
    }

    async fn order_status(&self, order_id: OrderId) -> Result<Option<OrderStatus>, StorageError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.tracking.get(&order_id).copied())
    }
}

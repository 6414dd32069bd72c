use rust_decimal::Decimal;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// One row of the restaurant menu; prices are in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub name: &'static str,
    pub price_cents: i64,
}

impl MenuItem {
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }
}

pub const MENU: &[MenuItem] = &[
    MenuItem { name: "pav bhaji", price_cents: 600 },
    MenuItem { name: "chole bhature", price_cents: 700 },
    MenuItem { name: "pizza", price_cents: 800 },
    MenuItem { name: "mango lassi", price_cents: 500 },
    MenuItem { name: "masala dosa", price_cents: 600 },
    MenuItem { name: "vegetable biryani", price_cents: 900 },
    MenuItem { name: "vada pav", price_cents: 400 },
    MenuItem { name: "rava dosa", price_cents: 700 },
    MenuItem { name: "samosa", price_cents: 500 },
];

/// Loads the menu into `food_items`. Reloading refreshes prices in place.
pub struct MenuSeed;

impl MenuSeed {
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        for item in MENU {
            sqlx::query(
                "INSERT INTO food_items (name, price) VALUES (?, ?)
                 ON CONFLICT(name) DO UPDATE SET price = excluded.price",
            )
            .bind(item.name)
            .bind(item.price().to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(SeedResult { items_seeded: MENU.len() })
    }

    /// True when every menu item is present at its seeded price.
    pub async fn verify(pool: &DbPool) -> Result<bool, RepositoryError> {
        for item in MENU {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM food_items WHERE name = ?1 AND price = ?2)",
            )
            .bind(item.name)
            .bind(item.price().to_string())
            .fetch_one(pool)
            .await?;
            if present == 0 {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedResult {
    pub items_seeded: usize,
}

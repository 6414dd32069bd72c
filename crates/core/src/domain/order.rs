use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::cart::CartLine;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    InProgress,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Wording used in replies to the customer.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::InProgress => "in progress",
            Self::OutForDelivery => "out for delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "in_progress" => Ok(Self::InProgress),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(DomainError::UnknownOrderStatus(value.to_string())),
        }
    }
}

/// Result of a successful completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub lines: Vec<CartLine>,
    pub status: OrderStatus,
    /// `None` when the order was stored but the total could not be computed.
    pub total: Option<Decimal>,
}

impl PlacedOrder {
    pub fn confirmation(&self) -> String {
        match self.total {
            Some(total) => format!(
                "Awesome. We have placed your order. Here is your order id #{}. \
                 Your order total is {} which you can pay at the time of delivery!",
                self.id,
                total.round_dp(2)
            ),
            None => format!(
                "Awesome. We have placed your order. Here is your order id #{}. \
                 Your order total will be confirmed at the time of delivery.",
                self.id
            ),
        }
    }
}

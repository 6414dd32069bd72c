use tracing::info;

use crate::domain::order::{OrderId, OrderStatus};
use crate::errors::FulfillmentError;
use crate::storage::OrderStorage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackingOutcome {
    Found { order_id: OrderId, status: OrderStatus },
    NotFound { order_id: OrderId },
}

impl TrackingOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Found { order_id, status } => {
                format!("Your order with ID {order_id} is currently {}.", status.describe())
            }
            Self::NotFound { order_id } => {
                format!("I couldn't find any order with the Id {order_id}")
            }
        }
    }
}

/// Read-only status lookups; never touches session state.
pub struct OrderTracker<S> {
    storage: S,
}

impl<S> OrderTracker<S>
where
    S: OrderStorage,
{
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn track(&self, order_id: OrderId) -> Result<TrackingOutcome, FulfillmentError> {
        let outcome = match self.storage.order_status(order_id).await? {
            Some(status) => TrackingOutcome::Found { order_id, status },
            None => TrackingOutcome::NotFound { order_id },
        };

        info!(
            event_name = "order.track.lookup",
            order_id = %order_id,
            found = matches!(outcome, TrackingOutcome::Found { .. }),
            "order status looked up"
        );
        Ok(outcome)
    }
}

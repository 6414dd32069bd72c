use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::cart::{Cart, ConversationId};
use crate::domain::order::{OrderStatus, PlacedOrder};
use crate::errors::{FulfillmentError, StorageError};
use crate::session::SessionStore;
use crate::storage::OrderStorage;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FinalizerPolicy {
    /// Put the cart back when storage fails instead of discarding it.
    pub retain_cart_on_failure: bool,
}

/// Turns a conversation's cart into a stored order.
pub struct OrderFinalizer<S> {
    sessions: Arc<SessionStore>,
    storage: S,
    policy: FinalizerPolicy,
}

impl<S> OrderFinalizer<S>
where
    S: OrderStorage,
{
    pub fn new(sessions: Arc<SessionStore>, storage: S, policy: FinalizerPolicy) -> Self {
        Self { sessions, storage, policy }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persists the cart for `id`.
    ///
    /// The cart leaves the session store before any storage call and is not
    /// put back on failure unless the policy asks for it. Item inserts stop at
    /// the first failure; nothing is retried.
    pub async fn complete(&self, id: &ConversationId) -> Result<PlacedOrder, FulfillmentError> {
        let Some(cart) = self.sessions.remove(id).await else {
            return Err(FulfillmentError::SessionNotFound(id.clone()));
        };

        match self.persist(id, &cart).await {
            Ok(order) => Ok(order),
            Err(storage_error) => {
                error!(
                    event_name = "order.complete.failed",
                    conversation_id = %id,
                    error = %storage_error,
                    cart_retained = self.policy.retain_cart_on_failure,
                    "order could not be stored"
                );
                if self.policy.retain_cart_on_failure {
                    self.sessions.put(id.clone(), cart).await;
                }
                Err(storage_error.into())
            }
        }
    }

    async fn persist(&self, id: &ConversationId, cart: &Cart) -> Result<PlacedOrder, StorageError> {
        let order_id = self.storage.next_order_id().await?;

        for line in cart.lines() {
            self.storage.insert_order_item(&line.food_item, line.quantity, order_id).await?;
        }

        if let Err(tracking_error) =
            self.storage.insert_order_tracking(order_id, OrderStatus::InProgress).await
        {
            warn!(
                event_name = "order.complete.tracking_failed",
                conversation_id = %id,
                order_id = %order_id,
                error = %tracking_error,
                "tracking record was not written"
            );
        }

        let total = match self.storage.total_order_price(order_id).await {
            Ok(total) => Some(total),
            Err(total_error) => {
                warn!(
                    event_name = "order.complete.total_unavailable",
                    conversation_id = %id,
                    order_id = %order_id,
                    error = %total_error,
                    "order stored but total could not be computed"
                );
                None
            }
        };

        info!(
            event_name = "order.complete.placed",
            conversation_id = %id,
            order_id = %order_id,
            line_count = cart.len(),
            "order placed"
        );

        Ok(PlacedOrder {
            id: order_id,
            lines: cart.lines().to_vec(),
            status: OrderStatus::InProgress,
            total,
        })
    }
}

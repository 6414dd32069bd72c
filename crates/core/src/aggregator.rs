use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::cart::{join_readable, Cart, ConversationId};
use crate::errors::{FulfillmentError, MalformedInput};
use crate::session::SessionStore;

/// Outcome of a removal request, in the order the names were supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub removed: Vec<String>,
    pub not_found: Vec<String>,
    pub remaining: Cart,
}

impl RemovalOutcome {
    pub fn message(&self) -> String {
        let mut parts = Vec::new();
        if !self.removed.is_empty() {
            parts.push(format!("Removed {} from your order!", join_readable(&self.removed)));
        }
        if !self.not_found.is_empty() {
            parts.push(format!(
                "Your current order does not have {}.",
                join_readable(&self.not_found)
            ));
        }
        if self.remaining.is_empty() {
            parts.push("Your order is empty!".to_string());
        } else {
            parts.push(format!(
                "Here are the remaining items in your order: {}. Please type Yes to confirm your order.",
                self.remaining.summary()
            ));
        }
        parts.join(" ")
    }
}

pub fn cart_prompt(cart: &Cart) -> String {
    format!(
        "Here's your order: {}. Is your order confirmed? Type Yes to confirm your order. \
         To add more, type Add with the food and the quantity, or to remove, type Remove with the food.",
        cart.summary()
    )
}

pub struct CartAggregator {
    sessions: Arc<SessionStore>,
}

impl CartAggregator {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }

    /// Merges the paired items into the conversation's cart, creating it when absent.
    ///
    /// Returns the full cart after the merge. Nothing is touched when the two
    /// slices differ in length.
    pub async fn add_items(
        &self,
        id: &ConversationId,
        food_items: &[String],
        quantities: &[u32],
    ) -> Result<Cart, FulfillmentError> {
        if food_items.len() != quantities.len() {
            return Err(MalformedInput::MismatchedQuantities {
                items: food_items.len(),
                quantities: quantities.len(),
            }
            .into());
        }

        let candidate =
            Cart::from_pairs(food_items.iter().cloned().zip(quantities.iter().copied()));

        let cart = self
            .sessions
            .modify(id, |slot| {
                match slot.as_mut() {
                    Some(cart) => cart.merge(candidate),
                    None => *slot = Some(candidate),
                }
                slot.clone().unwrap_or_default()
            })
            .await;

        info!(
            event_name = "order.cart.items_added",
            conversation_id = %id,
            added = food_items.len(),
            cart_size = cart.len(),
            "items merged into cart"
        );
        Ok(cart)
    }

    pub async fn remove_items(
        &self,
        id: &ConversationId,
        food_items: &[String],
    ) -> Result<RemovalOutcome, FulfillmentError> {
        let outcome = self
            .sessions
            .modify(id, |slot: &mut Option<Cart>| -> Option<RemovalOutcome> {
                let cart = slot.as_mut()?;
                let mut removed = Vec::new();
                let mut not_found = Vec::new();
                for food_item in food_items {
                    match cart.remove(food_item) {
                        Some(_) => removed.push(food_item.clone()),
                        None => not_found.push(food_item.clone()),
                    }
                }
                Some(RemovalOutcome { removed, not_found, remaining: cart.clone() })
            })
            .await;

        let Some(outcome) = outcome else {
            debug!(
                event_name = "order.cart.remove_without_cart",
                conversation_id = %id,
                "removal requested for a conversation without a cart"
            );
            return Err(FulfillmentError::SessionNotFound(id.clone()));
        };

        info!(
            event_name = "order.cart.items_removed",
            conversation_id = %id,
            removed = outcome.removed.len(),
            not_found = outcome.not_found.len(),
            cart_size = outcome.remaining.len(),
            "items removed from cart"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::{cart_prompt, CartAggregator};
    use crate::domain::cart::{Cart, ConversationId};
    use crate::errors::{FulfillmentError, MalformedInput};
    use crate::session::SessionStore;

    fn id(value: &str) -> ConversationId {
        ConversationId(value.to_string())
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn aggregator() -> (Arc<SessionStore>, CartAggregator) {
        let sessions = Arc::new(SessionStore::default());
        (sessions.clone(), CartAggregator::new(sessions))
    }

    #[tokio::test]
    async fn re_adding_an_item_overwrites_its_quantity() {
        let (sessions, aggregator) = aggregator();

        aggregator.add_items(&id("s1"), &names(&["pizza", "coke"]), &[2, 1]).await.expect("add");
        let cart = aggregator.add_items(&id("s1"), &names(&["pizza"]), &[1]).await.expect("re-add");

        assert_eq!(cart, Cart::from_pairs([("pizza", 1), ("coke", 1)]));
        assert_eq!(sessions.get(&id("s1")).await, Some(cart));
    }

    #[tokio::test]
    async fn mismatched_lengths_leave_cart_untouched() {
        let (sessions, aggregator) = aggregator();
        aggregator.add_items(&id("s1"), &names(&["pizza"]), &[2]).await.expect("add");

        let error = aggregator
            .add_items(&id("s1"), &names(&["pizza", "coke"]), &[5])
            .await
            .expect_err("lengths differ");

        assert_eq!(
            error,
            FulfillmentError::MalformedInput(MalformedInput::MismatchedQuantities {
                items: 2,
                quantities: 1,
            })
        );
        assert_eq!(sessions.get(&id("s1")).await, Some(Cart::from_pairs([("pizza", 2)])));
    }

    #[tokio::test]
    async fn mismatched_lengths_do_not_create_a_cart() {
        let (sessions, aggregator) = aggregator();

        let result = aggregator.add_items(&id("s1"), &names(&["pizza"]), &[]).await;

        assert!(result.is_err());
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn sequence_of_adds_equals_last_write_wins_merge() {
        let (_, aggregator) = aggregator();
        let batches: [(&[&str], &[u32]); 3] = [
            (&["pizza", "samosa"], &[2, 4]),
            (&["coke", "pizza", "coke"], &[1, 3, 2]),
            (&["samosa"], &[1]),
        ];

        let mut expected = Cart::default();
        let mut cart = Cart::default();
        for (items, quantities) in batches {
            expected.merge(Cart::from_pairs(items.iter().copied().zip(quantities.iter().copied())));
            cart = aggregator.add_items(&id("s1"), &names(items), quantities).await.expect("add");
        }

        assert_eq!(cart, expected);
        assert_eq!(cart.summary(), "3 pizza, 1 samosa and 2 coke");
    }

    #[tokio::test]
    async fn carts_are_isolated_per_conversation() {
        let (sessions, aggregator) = aggregator();

        aggregator.add_items(&id("a"), &names(&["pizza"]), &[1]).await.expect("add a");
        aggregator.add_items(&id("b"), &names(&["coke"]), &[3]).await.expect("add b");

        assert_eq!(sessions.get(&id("a")).await, Some(Cart::from_pairs([("pizza", 1)])));
        assert_eq!(sessions.get(&id("b")).await, Some(Cart::from_pairs([("coke", 3)])));
    }

    #[tokio::test]
    async fn remove_partitions_found_and_missing_items() {
        let (sessions, aggregator) = aggregator();
        aggregator.add_items(&id("s1"), &names(&["pizza", "coke"]), &[1, 1]).await.expect("add");

        let outcome =
            aggregator.remove_items(&id("s1"), &names(&["coke", "fries"])).await.expect("remove");

        assert_eq!(outcome.removed, names(&["coke"]));
        assert_eq!(outcome.not_found, names(&["fries"]));
        assert_eq!(outcome.remaining, Cart::from_pairs([("pizza", 1)]));
        assert_eq!(sessions.get(&id("s1")).await, Some(outcome.remaining.clone()));
        assert_eq!(
            outcome.message(),
            "Removed coke from your order! Your current order does not have fries. \
             Here are the remaining items in your order: 1 pizza. Please type Yes to confirm your order."
        );
    }

    #[tokio::test]
    async fn removed_and_missing_sets_cover_the_request() {
        let (_, aggregator) = aggregator();
        aggregator
            .add_items(&id("s1"), &names(&["pizza", "coke", "samosa"]), &[1, 2, 3])
            .await
            .expect("add");

        let requested = names(&["samosa", "fries", "pizza", "lassi"]);
        let outcome = aggregator.remove_items(&id("s1"), &requested).await.expect("remove");

        let removed: BTreeSet<_> = outcome.removed.iter().collect();
        let missing: BTreeSet<_> = outcome.not_found.iter().collect();
        let all: BTreeSet<_> = requested.iter().collect();
        assert!(removed.is_disjoint(&missing));
        assert_eq!(removed.union(&missing).copied().collect::<BTreeSet<_>>(), all);
        assert_eq!(outcome.removed, names(&["samosa", "pizza"]));
    }

    #[tokio::test]
    async fn emptied_cart_stays_in_the_store() {
        let (sessions, aggregator) = aggregator();
        aggregator.add_items(&id("s1"), &names(&["pizza"]), &[1]).await.expect("add");

        let outcome = aggregator.remove_items(&id("s1"), &names(&["pizza"])).await.expect("remove");

        assert!(outcome.message().ends_with("Your order is empty!"));
        assert_eq!(sessions.get(&id("s1")).await, Some(Cart::default()));
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn remove_without_cart_never_creates_one() {
        let (sessions, aggregator) = aggregator();

        let error =
            aggregator.remove_items(&id("ghost"), &names(&["pizza"])).await.expect_err("no cart");

        assert_eq!(error, FulfillmentError::SessionNotFound(id("ghost")));
        assert!(error.user_message().contains("place it again"));
        assert!(sessions.is_empty().await);
    }

    #[test]
    fn prompt_lists_cart_contents() {
        let prompt = cart_prompt(&Cart::from_pairs([("pizza", 2), ("coke", 1)]));

        assert!(prompt.starts_with("Here's your order: 2 pizza and 1 coke."));
    }
}

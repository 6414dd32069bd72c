//! Routes a declared intent to the cart, finalizer, or tracker.
//!
//! Intent names resolve to the fixed [`Intent`] set; anything else is answered
//! with a static reply and touches no state. Every outcome, including errors,
//! becomes a plain fulfillment text.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{info, warn};

use crate::aggregator::{cart_prompt, CartAggregator};
use crate::domain::cart::ConversationId;
use crate::domain::order::OrderId;
use crate::errors::{FulfillmentError, MalformedInput};
use crate::finalizer::{FinalizerPolicy, OrderFinalizer};
use crate::session::SessionStore;
use crate::storage::OrderStorage;
use crate::tracker::OrderTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    AddItems,
    RemoveItems,
    CompleteOrder,
    TrackOrder,
}

impl Intent {
    pub const ALL: [Intent; 4] =
        [Self::AddItems, Self::RemoveItems, Self::CompleteOrder, Self::TrackOrder];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AddItems => "add.order",
            Self::RemoveItems => "order.remove",
            Self::CompleteOrder => "order.complete",
            Self::TrackOrder => "track.order.id",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Intent {
    type Err = FulfillmentError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|intent| intent.display_name() == name)
            .ok_or_else(|| FulfillmentError::UnrecognizedIntent(name.to_string()))
    }
}

/// Slot values extracted by the conversational agent.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct IntentParameters {
    #[serde(default, deserialize_with = "one_or_many")]
    pub food_item: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub number: Vec<Value>,
    #[serde(default)]
    pub order_id: Option<Value>,
}

impl IntentParameters {
    pub fn quantities(&self) -> Result<Vec<u32>, MalformedInput> {
        self.number.iter().map(parse_quantity).collect()
    }

    pub fn order_id(&self) -> Result<OrderId, MalformedInput> {
        match &self.order_id {
            Some(value) => parse_order_id(value),
            None => Err(MalformedInput::InvalidOrderId(String::new())),
        }
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match OneOrMany::<T>::deserialize(deserializer)? {
        OneOrMany::Many(values) => values,
        OneOrMany::One(value) => vec![value],
    })
}

/// Agents send slot numbers as floats (`2.0`) or strings; only whole positive values pass.
fn whole_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && *float >= 0.0 && *float <= u64::MAX as f64)
                .map(|float| float as u64)
        }),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<u64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|float| float.fract() == 0.0 && *float >= 0.0)
                    .map(|float| float as u64)
            })
        }
        _ => None,
    }
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn parse_quantity(value: &Value) -> Result<u32, MalformedInput> {
    whole_number(value)
        .filter(|quantity| *quantity > 0)
        .and_then(|quantity| u32::try_from(quantity).ok())
        .ok_or_else(|| MalformedInput::InvalidQuantity(raw_text(value)))
}

fn parse_order_id(value: &Value) -> Result<OrderId, MalformedInput> {
    whole_number(value)
        .filter(|order_id| *order_id > 0)
        .and_then(|order_id| i64::try_from(order_id).ok())
        .map(OrderId)
        .ok_or_else(|| MalformedInput::InvalidOrderId(raw_text(value)))
}

#[derive(Clone, Debug, PartialEq)]
pub struct FulfillmentRequest {
    pub intent_name: String,
    pub parameters: IntentParameters,
    pub conversation_id: ConversationId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fulfillment {
    pub intent: Option<Intent>,
    pub text: String,
    /// Set when the text explains a failure rather than a result.
    pub error: Option<FulfillmentError>,
}

pub struct OrderDispatcher<S> {
    aggregator: CartAggregator,
    finalizer: OrderFinalizer<S>,
    tracker: OrderTracker<S>,
}

impl<S> OrderDispatcher<S>
where
    S: OrderStorage + Clone,
{
    pub fn new(sessions: Arc<SessionStore>, storage: S, policy: FinalizerPolicy) -> Self {
        Self {
            aggregator: CartAggregator::new(sessions.clone()),
            finalizer: OrderFinalizer::new(sessions, storage.clone(), policy),
            tracker: OrderTracker::new(storage),
        }
    }

    pub async fn handle(&self, request: FulfillmentRequest) -> Fulfillment {
        let intent = match request.intent_name.parse::<Intent>() {
            Ok(intent) => intent,
            Err(error) => {
                warn!(
                    event_name = "order.intent.unrecognized",
                    conversation_id = %request.conversation_id,
                    intent_name = %request.intent_name,
                    "intent not handled"
                );
                return Fulfillment {
                    intent: None,
                    text: error.user_message().to_string(),
                    error: Some(error),
                };
            }
        };

        info!(
            event_name = "order.intent.dispatched",
            conversation_id = %request.conversation_id,
            intent = %intent,
            "dispatching intent"
        );

        match self.route(intent, &request).await {
            Ok(text) => Fulfillment { intent: Some(intent), text, error: None },
            Err(error) => {
                info!(
                    event_name = "order.intent.rejected",
                    conversation_id = %request.conversation_id,
                    intent = %intent,
                    error = %error,
                    "intent answered with an error reply"
                );
                Fulfillment {
                    intent: Some(intent),
                    text: error.user_message().to_string(),
                    error: Some(error),
                }
            }
        }
    }

    async fn route(
        &self,
        intent: Intent,
        request: &FulfillmentRequest,
    ) -> Result<String, FulfillmentError> {
        let id = &request.conversation_id;
        let parameters = &request.parameters;

        match intent {
            Intent::AddItems => {
                let quantities = parameters.quantities()?;
                let cart = self.aggregator.add_items(id, &parameters.food_item, &quantities).await?;
                Ok(cart_prompt(&cart))
            }
            Intent::RemoveItems => {
                let outcome = self.aggregator.remove_items(id, &parameters.food_item).await?;
                Ok(outcome.message())
            }
            Intent::CompleteOrder => {
                let order = self.finalizer.complete(id).await?;
                Ok(order.confirmation())
            }
            Intent::TrackOrder => {
                let order_id = parameters.order_id()?;
                let outcome = self.tracker.track(order_id).await?;
                Ok(outcome.message())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{FulfillmentRequest, Intent, IntentParameters, OrderDispatcher};
    use crate::domain::cart::{Cart, ConversationId};
    use crate::domain::order::{OrderId, OrderStatus};
    use crate::errors::{FulfillmentError, MalformedInput};
    use crate::finalizer::tests::RecordingStorage;
    use crate::finalizer::FinalizerPolicy;
    use crate::session::SessionStore;
    use crate::storage::OrderStorage;

    fn dispatcher(
        storage: RecordingStorage,
    ) -> (Arc<SessionStore>, Arc<RecordingStorage>, OrderDispatcher<Arc<RecordingStorage>>) {
        let sessions = Arc::new(SessionStore::default());
        let storage = Arc::new(storage);
        let dispatcher =
            OrderDispatcher::new(sessions.clone(), storage.clone(), FinalizerPolicy::default());
        (sessions, storage, dispatcher)
    }

    fn request(intent: &str, parameters: serde_json::Value) -> FulfillmentRequest {
        FulfillmentRequest {
            intent_name: intent.to_string(),
            parameters: serde_json::from_value(parameters).expect("parameters"),
            conversation_id: ConversationId("s1".to_string()),
        }
    }

    #[test]
    fn intent_names_resolve_to_fixed_set() {
        for intent in Intent::ALL {
            assert_eq!(intent.display_name().parse::<Intent>(), Ok(intent));
        }
        assert_eq!(
            "order.cancel".parse::<Intent>(),
            Err(FulfillmentError::UnrecognizedIntent("order.cancel".to_string()))
        );
    }

    #[test]
    fn parameters_accept_single_values_and_float_numbers() {
        let parameters: IntentParameters =
            serde_json::from_value(json!({ "food_item": "pizza", "number": [2.0] }))
                .expect("parameters");

        assert_eq!(parameters.food_item, vec!["pizza".to_string()]);
        assert_eq!(parameters.quantities(), Ok(vec![2]));
    }

    #[test]
    fn fractional_or_zero_quantities_are_malformed() {
        let fractional: IntentParameters =
            serde_json::from_value(json!({ "number": [1.5] })).expect("parameters");
        let zero: IntentParameters =
            serde_json::from_value(json!({ "number": ["0"] })).expect("parameters");

        assert_eq!(
            fractional.quantities(),
            Err(MalformedInput::InvalidQuantity("1.5".to_string()))
        );
        assert_eq!(zero.quantities(), Err(MalformedInput::InvalidQuantity("0".to_string())));
    }

    #[test]
    fn order_id_accepts_numeric_strings() {
        let parameters: IntentParameters =
            serde_json::from_value(json!({ "order_id": "41" })).expect("parameters");
        let numeric: IntentParameters =
            serde_json::from_value(json!({ "order_id": 41.0 })).expect("parameters");
        let garbage: IntentParameters =
            serde_json::from_value(json!({ "order_id": "forty" })).expect("parameters");

        assert_eq!(parameters.order_id(), Ok(OrderId(41)));
        assert_eq!(numeric.order_id(), Ok(OrderId(41)));
        assert_eq!(garbage.order_id(), Err(MalformedInput::InvalidOrderId("forty".to_string())));
    }

    #[tokio::test]
    async fn unknown_intent_gets_static_reply_without_side_effects() {
        let (sessions, storage, dispatcher) = dispatcher(RecordingStorage::default());

        let fulfillment = dispatcher
            .handle(request("order.cancel", json!({ "food_item": ["pizza"], "number": [1] })))
            .await;

        assert_eq!(fulfillment.intent, None);
        assert_eq!(fulfillment.text, "Sorry, I didn't understand that intent.");
        assert!(sessions.is_empty().await);
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn add_then_remove_then_complete_conversation() {
        let (sessions, _, dispatcher) =
            dispatcher(RecordingStorage::with_menu(&[("pizza", 1200), ("coke", 250)]));

        let added = dispatcher
            .handle(request(
                "add.order",
                json!({ "food_item": ["pizza", "coke"], "number": [2, 1] }),
            ))
            .await;
        assert!(added.text.starts_with("Here's your order: 2 pizza and 1 coke."));

        let readded = dispatcher
            .handle(request("add.order", json!({ "food_item": ["pizza"], "number": [1] })))
            .await;
        assert!(readded.text.starts_with("Here's your order: 1 pizza and 1 coke."));

        let removed = dispatcher
            .handle(request("order.remove", json!({ "food_item": ["coke", "fries"] })))
            .await;
        assert!(removed.text.contains("Removed coke from your order!"));
        assert!(removed.text.contains("does not have fries"));
        assert_eq!(
            sessions.get(&ConversationId("s1".to_string())).await,
            Some(Cart::from_pairs([("pizza", 1)]))
        );

        let completed = dispatcher.handle(request("order.complete", json!({}))).await;
        assert_eq!(completed.error, None);
        assert!(completed.text.contains("#41"));
        assert!(completed.text.contains("12.00"));
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn mismatched_counts_yield_clarification() {
        let (sessions, _, dispatcher) = dispatcher(RecordingStorage::default());

        let fulfillment = dispatcher
            .handle(request("add.order", json!({ "food_item": ["pizza", "coke"], "number": [2] })))
            .await;

        assert_eq!(
            fulfillment.text,
            "Sorry, I didn't catch that. Please provide the food items and quantities clearly."
        );
        assert!(matches!(fulfillment.error, Some(FulfillmentError::MalformedInput(_))));
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn complete_without_cart_asks_to_reorder() {
        let (_, storage, dispatcher) = dispatcher(RecordingStorage::default());

        let fulfillment = dispatcher.handle(request("order.complete", json!({}))).await;

        assert!(fulfillment.text.contains("unable to find your order"));
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn track_reports_status_from_storage() {
        let (_, storage, dispatcher) = dispatcher(RecordingStorage::default());
        storage.insert_order_tracking(OrderId(41), OrderStatus::Delivered).await.expect("seed");

        let found = dispatcher.handle(request("track.order.id", json!({ "order_id": 41 }))).await;
        let missing =
            dispatcher.handle(request("track.order.id", json!({ "order_id": "7" }))).await;

        assert_eq!(found.text, "Your order with ID 41 is currently delivered.");
        assert_eq!(missing.text, "I couldn't find any order with the Id 7");
    }
}

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Json, Router};
use orderbot_core::dispatch::{FulfillmentRequest, IntentParameters, OrderDispatcher};
use orderbot_core::domain::cart::ConversationId;
use orderbot_core::errors::InterfaceError;
use orderbot_core::storage::OrderStorage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub struct WebhookState<S> {
    dispatcher: Arc<OrderDispatcher<S>>,
}

impl<S> Clone for WebhookState<S> {
    fn clone(&self) -> Self {
        Self { dispatcher: self.dispatcher.clone() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub query_result: QueryResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub intent: IntentRef,
    #[serde(default)]
    pub parameters: IntentParameters,
    #[serde(default)]
    pub output_contexts: Vec<OutputContext>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRef {
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct OutputContext {
    pub name: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub fulfillment_text: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router<S>(dispatcher: Arc<OrderDispatcher<S>>) -> Router
where
    S: OrderStorage + Clone + 'static,
{
    Router::new().route("/", post(fulfill::<S>)).with_state(WebhookState { dispatcher })
}

/// Pulls the session segment out of a context name such as
/// `projects/p/agent/sessions/<id>/contexts/ongoing-order`.
pub fn extract_session_id(context_name: &str) -> Option<ConversationId> {
    const SESSIONS: &str = "/sessions/";
    const CONTEXTS: &str = "/contexts/";

    let start = context_name.find(SESSIONS)? + SESSIONS.len();
    let rest = &context_name[start..];
    let end = rest.find(CONTEXTS)?;
    let session = &rest[..end];

    (!session.is_empty()).then(|| ConversationId(session.to_string()))
}

async fn fulfill<S>(
    State(state): State<WebhookState<S>>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, (StatusCode, Json<WebhookError>)>
where
    S: OrderStorage + Clone + 'static,
{
    let correlation_id = Uuid::new_v4().to_string();
    let request = parse_request(&body, &correlation_id).map_err(interface_failure)?;

    info!(
        event_name = "webhook.request.received",
        correlation_id = %correlation_id,
        conversation_id = %request.conversation_id,
        intent_name = %request.intent_name,
        "fulfillment request received"
    );

    let fulfillment = state.dispatcher.handle(request).await;

    info!(
        event_name = "webhook.request.completed",
        correlation_id = %correlation_id,
        failed = fulfillment.error.is_some(),
        "fulfillment reply sent"
    );

    Ok(Json(WebhookResponse { fulfillment_text: fulfillment.text }))
}

fn parse_request(body: &[u8], correlation_id: &str) -> Result<FulfillmentRequest, InterfaceError> {
    let bad_request = |message: String| InterfaceError::BadRequest {
        message,
        correlation_id: correlation_id.to_string(),
    };

    let payload: WebhookRequest = serde_json::from_slice(body)
        .map_err(|error| bad_request(format!("invalid webhook payload: {error}")))?;
    let query_result = payload.query_result;

    let conversation_id = query_result
        .output_contexts
        .first()
        .and_then(|context| extract_session_id(&context.name))
        .ok_or_else(|| bad_request("request carries no session context".to_string()))?;

    Ok(FulfillmentRequest {
        intent_name: query_result.intent.display_name,
        parameters: query_result.parameters,
        conversation_id,
    })
}

fn interface_failure(error: InterfaceError) -> (StatusCode, Json<WebhookError>) {
    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    warn!(
        event_name = "webhook.request.rejected",
        correlation_id = %error.correlation_id(),
        status = status.as_u16(),
        error = %error,
        "webhook request rejected"
    );

    (
        status,
        Json(WebhookError {
            error: error.user_message().to_string(),
            correlation_id: error.correlation_id().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use orderbot_core::dispatch::OrderDispatcher;
    use orderbot_core::domain::cart::ConversationId;
    use orderbot_core::finalizer::FinalizerPolicy;
    use orderbot_core::session::SessionStore;
    use orderbot_db::InMemoryOrderStorage;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{extract_session_id, router, WebhookError, WebhookResponse};

    fn app() -> Router {
        let dispatcher = OrderDispatcher::new(
            Arc::new(SessionStore::default()),
            Arc::new(InMemoryOrderStorage::with_default_menu()),
            FinalizerPolicy::default(),
        );
        router(Arc::new(dispatcher))
    }

    fn payload(intent: &str, parameters: Value) -> Value {
        json!({
            "responseId": "r-1",
            "queryResult": {
                "queryText": "whatever the user said",
                "intent": { "displayName": intent },
                "parameters": parameters,
                "outputContexts": [
                    { "name": "projects/eatery/agent/sessions/abc-123/contexts/ongoing-order" }
                ]
            }
        })
    }

    async fn post(app: &Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn text(body: &Value) -> String {
        let response: WebhookResponse =
            serde_json::from_value(body.clone()).expect("fulfillment response");
        response.fulfillment_text
    }

    #[test]
    fn session_id_is_taken_between_sessions_and_contexts() {
        assert_eq!(
            extract_session_id("projects/p/agent/sessions/abc-123/contexts/ongoing-order"),
            Some(ConversationId("abc-123".to_string()))
        );
        assert_eq!(extract_session_id("projects/p/agent/sessions//contexts/x"), None);
        assert_eq!(extract_session_id("projects/p/agent/contexts/x"), None);
    }

    #[tokio::test]
    async fn conversation_flows_from_add_to_tracking() {
        let app = app();

        let add = payload("add.order", json!({"food_item": ["pizza", "samosa"], "number": [2, 1]}));
        let (status, body) = post(&app, add).await;
        assert_eq!(status, StatusCode::OK);
        assert!(text(&body).contains("2 pizza and 1 samosa"));

        let (_, body) = post(&app, payload("order.remove", json!({"food_item": ["samosa"]}))).await;
        assert!(text(&body).starts_with(
            "Removed samosa from your order! \
             Here are the remaining items in your order: 2 pizza."
        ));

        let (_, body) = post(&app, payload("order.complete", json!({}))).await;
        let confirmation = text(&body);
        assert!(confirmation.contains("Here is your order id #1."));
        assert!(confirmation.contains("Your order total is 16.00"));

        let (_, body) = post(&app, payload("track.order.id", json!({"order_id": 1}))).await;
        assert_eq!(text(&body), "Your order with ID 1 is currently in progress.");
    }

    #[tokio::test]
    async fn core_failures_are_answered_with_status_ok() {
        let app = app();

        let (status, body) = post(&app, payload("order.complete", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            text(&body),
            "Apologies, but I'm unable to find your order. Could you please place it again?"
        );

        let (status, body) = post(&app, payload("new.order", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text(&body), "Sorry, I didn't understand that intent.");
    }

    #[tokio::test]
    async fn missing_session_context_is_a_bad_request() {
        let app = app();
        let body = json!({
            "queryResult": {
                "intent": { "displayName": "add.order" },
                "parameters": { "food_item": ["pizza"], "number": [1] },
                "outputContexts": []
            }
        });

        let (status, body) = post(&app, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: WebhookError = serde_json::from_value(body).expect("error body");
        assert!(!error.correlation_id.is_empty());
    }

    #[tokio::test]
    async fn unparseable_body_is_a_bad_request() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::from("not json"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

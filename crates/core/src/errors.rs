use thiserror::Error;

use crate::domain::cart::ConversationId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown order status `{0}`")]
    UnknownOrderStatus(String),
}

/// Failure reported by the order storage collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("food item `{0}` is not on the menu")]
    UnknownFoodItem(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored record could not be decoded: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MalformedInput {
    #[error("{items} food items were paired with {quantities} quantities")]
    MismatchedQuantities { items: usize, quantities: usize },
    #[error("quantity `{0}` is not a positive whole number")]
    InvalidQuantity(String),
    #[error("order id `{0}` is not a number")]
    InvalidOrderId(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FulfillmentError {
    #[error("unrecognized intent `{0}`")]
    UnrecognizedIntent(String),
    #[error("malformed input: {0}")]
    MalformedInput(#[from] MalformedInput),
    #[error("no cart for conversation `{0}`")]
    SessionNotFound(ConversationId),
    #[error("storage failure: {0}")]
    StorageFailure(#[from] StorageError),
}

impl FulfillmentError {
    /// Every fulfillment error is answered with a normal reply; this is its text.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UnrecognizedIntent(_) => "Sorry, I didn't understand that intent.",
            Self::MalformedInput(MalformedInput::InvalidOrderId(_)) => {
                "Sorry, I didn't catch that order id. Please share the number from your order confirmation."
            }
            Self::MalformedInput(_) => {
                "Sorry, I didn't catch that. Please provide the food items and quantities clearly."
            }
            Self::SessionNotFound(_) => {
                "Apologies, but I'm unable to find your order. Could you please place it again?"
            }
            Self::StorageFailure(_) => {
                "I'm sorry, there was an issue with our system processing your order. Can you place it once more?"
            }
        }
    }
}

/// Transport-level failures; these never come out of the intent handlers.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

pub mod aggregator;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod finalizer;
pub mod session;
pub mod storage;
pub mod tracker;

pub use aggregator::{CartAggregator, RemovalOutcome};
pub use dispatch::{Fulfillment, FulfillmentRequest, Intent, IntentParameters, OrderDispatcher};
pub use domain::cart::{Cart, CartLine, ConversationId};
pub use domain::order::{OrderId, OrderStatus, PlacedOrder};
pub use errors::{DomainError, FulfillmentError, InterfaceError, MalformedInput, StorageError};
pub use finalizer::{FinalizerPolicy, OrderFinalizer};
pub use session::SessionStore;
pub use storage::OrderStorage;
pub use tracker::{OrderTracker, TrackingOutcome};

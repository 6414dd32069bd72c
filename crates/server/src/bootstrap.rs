use std::sync::Arc;

use orderbot_core::config::AppConfig;
use orderbot_core::dispatch::OrderDispatcher;
use orderbot_core::session::SessionStore;
use orderbot_db::{connect_with_settings, migrations, DbPool, SqlOrderStorage};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub sessions: Arc<SessionStore>,
    pub dispatcher: Arc<OrderDispatcher<SqlOrderStorage>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let sessions = Arc::new(SessionStore::new(config.session.ttl()));
    let dispatcher = Arc::new(OrderDispatcher::new(
        sessions.clone(),
        SqlOrderStorage::new(db_pool.clone()),
        config.session.finalizer_policy(),
    ));

    Ok(Application { config, db_pool, sessions, dispatcher })
}

#[cfg(test)]
mod tests {
    use orderbot_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use orderbot_core::dispatch::{FulfillmentRequest, IntentParameters};
    use orderbot_core::domain::cart::ConversationId;
    use orderbot_db::MenuSeed;
    use serde_json::json;

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    fn config_for(database_url: &str) -> AppConfig {
        AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("valid configuration")
    }

    #[tokio::test]
    async fn missing_database_file_fails_bootstrap() {
        let result =
            bootstrap_with_config(config_for("sqlite:///orderbot-missing-dir/orders.db")).await;

        assert!(matches!(result, Err(BootstrapError::DatabaseConnect(_))));
    }

    #[tokio::test]
    async fn bootstrapped_dispatcher_places_orders_against_sqlite() {
        let app = bootstrap_with_config(config_for("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed");
        MenuSeed::load(&app.db_pool).await.expect("seed menu");

        let conversation_id = ConversationId("bootstrap-smoke".to_string());
        let add = app
            .dispatcher
            .handle(FulfillmentRequest {
                intent_name: "add.order".to_string(),
                parameters: serde_json::from_value::<IntentParameters>(
                    json!({"food_item": ["vada pav"], "number": [3]}),
                )
                .expect("parameters"),
                conversation_id: conversation_id.clone(),
            })
            .await;
        assert!(add.error.is_none(), "add should succeed: {}", add.text);

        let complete = app
            .dispatcher
            .handle(FulfillmentRequest {
                intent_name: "order.complete".to_string(),
                parameters: IntentParameters::default(),
                conversation_id,
            })
            .await;
        assert!(complete.error.is_none(), "completion should succeed: {}", complete.text);
        assert!(complete.text.contains("Your order total is 12.00"));

        app.db_pool.close().await;
    }
}

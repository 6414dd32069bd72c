use std::sync::Arc;
use std::time::Duration;

use orderbot_core::session::SessionStore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Starts the background purge of idle carts. Nothing is spawned when carts never expire.
pub fn spawn(sessions: Arc<SessionStore>, every: Duration) -> Option<JoinHandle<()>> {
    let ttl = sessions.ttl()?;

    info!(
        event_name = "system.sweeper.start",
        correlation_id = "bootstrap",
        ttl_secs = ttl.as_secs(),
        interval_secs = every.as_secs(),
        "session sweeper started"
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                info!(event_name = "order.session.purged", purged, "expired carts dropped");
            } else {
                debug!(event_name = "order.session.sweep", "no expired carts");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use orderbot_core::domain::cart::{Cart, ConversationId};
    use orderbot_core::session::SessionStore;

    use super::spawn;

    #[tokio::test]
    async fn nothing_runs_without_a_ttl() {
        let sessions = Arc::new(SessionStore::default());

        assert!(spawn(sessions, Duration::from_secs(1)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_carts_are_purged_in_the_background() {
        let sessions = Arc::new(SessionStore::new(Some(Duration::from_secs(10))));
        sessions
            .put(ConversationId("idle".to_string()), Cart::from_pairs([("samosa", 2)]))
            .await;

        let handle = spawn(sessions.clone(), Duration::from_secs(1)).expect("sweeper");
        tokio::time::sleep(Duration::from_secs(12)).await;

        assert_eq!(sessions.purge_expired().await, 0, "sweeper should have purged already");
        assert!(sessions.is_empty().await);
        handle.abort();
    }
}

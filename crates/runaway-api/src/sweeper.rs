//! Background expiry of idle sessions.

use std::sync::Arc;
use std::time::Duration;

use runaway_session::application::command_handlers::handle_expire_sessions;
use runaway_session::application::registry::SessionRegistry;
use runaway_session::domain::commands::ExpireSessions;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

/// Spawns a task that removes sessions idle for longer than `max_age`
/// every `interval`. The first sweep runs one interval after start.
#[must_use]
pub fn spawn_expiry_sweeper(
    sessions: Arc<SessionRegistry>,
    interval: Duration,
    max_age: Duration,
) -> JoinHandle<()> {
    let max_age = chrono::Duration::from_std(max_age).unwrap_or_else(|e| {
        warn!(error = %e, "session max age out of range, using one day");
        chrono::Duration::days(1)
    });

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let command = ExpireSessions {
                correlation_id: Uuid::new_v4(),
                max_age,
            };
            let removed = handle_expire_sessions(&command, &sessions).await;
            let remaining = sessions.len().await;
            debug!(removed, remaining, "expiry sweep finished");
        }
    })
}

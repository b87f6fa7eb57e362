//! Background tasks for the voicebot server.
//!
//! Includes:
//! - Evicting ended call sessions after the retention window.

use crate::sessions::SessionStore;
use chrono::{DateTime, Utc};
use tokio::time::{sleep, Duration};

/// Evicts sessions that ended more than `retention_secs` before `now`.
///
/// A window reaching past the earliest representable time evicts nothing.
pub async fn sweep_expired_sessions(
    store: &SessionStore,
    retention_secs: u64,
    now: DateTime<Utc>,
) -> usize {
    let cutoff = i64::try_from(retention_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|retention| now.checked_sub_signed(retention));
    match cutoff {
        Some(cutoff) => store.evict_ended_before(cutoff).await,
        None => 0,
    }
}

/// Starts the session retention task.
///
/// This task runs indefinitely, periodically evicting ended sessions older
/// than `retention_secs`. A retention of `0` disables it.
pub async fn start_session_retention_task(store: SessionStore, retention_secs: u64) {
    if retention_secs == 0 {
        tracing::warn!("session retention task disabled (retention_secs=0)");
        return;
    }

    // Check every 60 seconds or retention/2, whichever is smaller (min 1s)
    let interval_seconds = (retention_secs / 2).clamp(1, 60);
    let interval = Duration::from_secs(interval_seconds);

    tracing::info!(
        retention_secs,
        interval_seconds,
        "starting session retention task"
    );

    loop {
        sleep(interval).await;

        let evicted = sweep_expired_sessions(&store, retention_secs, Utc::now()).await;
        if evicted > 0 {
            tracing::info!(count = evicted, "evicted ended call sessions");
        } else {
            tracing::debug!("no ended call sessions to evict");
        }
    }
}

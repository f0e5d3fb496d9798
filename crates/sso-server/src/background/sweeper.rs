//! Periodic removal of expired refresh sessions.
//!
//! Expired sessions are already unusable; the sweep only reclaims the
//! space they hold in the store. Runs on a fixed interval using
//! `tokio::time::interval` until cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::AuthApi;

/// Run the sweep loop until `cancel` is triggered.
pub async fn run<E: AuthApi>(auth: Arc<E>, every: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = every.as_secs(),
        "Refresh session sweeper started"
    );

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Refresh session sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                match auth.purge_expired_sessions().await {
                    Ok(purged) if purged > 0 => {
                        tracing::info!(purged, "Sweeper: purged expired refresh sessions");
                    }
                    Ok(_) => tracing::debug!("Sweeper: nothing to purge"),
                    Err(e) => tracing::error!(error = %e, "Sweeper: purge failed"),
                }
            }
        }
    }
}

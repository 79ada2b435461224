use std::time::Duration;

use tokio::sync::watch;

use crate::state::SharedState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const LIMITER_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Periodic in-process housekeeping: expired cache entries, stale rate
/// limiter windows, quota-parked AI keys, and expired auth tokens.
pub fn spawn(state: SharedState, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }

            state.ai.cleanup();
            state.generation_limiter.cleanup(LIMITER_MAX_AGE);
            state.login_limiter.cleanup(LIMITER_MAX_AGE);
            if let Some(unsplash) = &state.unsplash {
                unsplash.clear_cache();
            }

            match crate::db::refresh_tokens::delete_expired(&state.pool).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Swept {n} expired refresh tokens"),
                Err(e) => tracing::error!("Refresh token sweep failed: {e}"),
            }
            if let Err(e) = crate::db::password_reset_tokens::delete_expired(&state.pool).await {
                tracing::error!("Reset token sweep failed: {e}");
            }
        }

        tracing::info!("Maintenance task stopped");
    })
}

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use atelier_api::AppStateInner;

/// Background task that forgets revocations of tokens that have expired
/// on their own.
pub async fn run_cleanup_loop(state: Arc<AppStateInner>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let now = chrono::Utc::now().timestamp();
        match state.with_db(move |db| db.prune_revoked_tokens(now)).await {
            Ok(count) => {
                if count > 0 {
                    info!("Cleanup: pruned {} expired revocations", count);
                }
            }
            Err(e) => {
                warn!("Cleanup error: {}", e);
            }
        }
    }
}

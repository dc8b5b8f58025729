use std::{sync::Arc, time::Duration};

use common_observability::PaymentMetrics;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

use crate::manager::PaymentIntentManager;

/// Periodically expires pending intents whose window has closed, so intents
/// nobody polls still reach a terminal state.
pub fn spawn_expiry_sweeper(
    manager: Arc<PaymentIntentManager>,
    metrics: Arc<PaymentMetrics>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let start = std::time::Instant::now();
            match manager.expire_overdue().await {
                Ok(expired) => debug!(expired, "Expiry sweep finished"),
                Err(err) => error!(error = %err, "Expiry sweeper error"),
            }
            metrics.sweeper_duration_seconds.observe(start.elapsed().as_secs_f64());
        }
    })
}

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use wethap_api::ServerPush;

use crate::services::connection_registry::ConnectionRegistry;

/// Periodic "keep alive" push so idle senders can tell the link is healthy.
pub struct KeepAlive {
    registry: Arc<ConnectionRegistry>,
    period: Duration,
}

impl KeepAlive {
    pub fn new(registry: Arc<ConnectionRegistry>, period: Duration) -> Self {
        Self { registry, period }
    }

    pub async fn ping(&self) -> usize {
        let delivered = self.registry.broadcast(&ServerPush::KeepAlive, None).await;
        tracing::debug!(delivered, "keep alive sent");
        delivered
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.ping().await;
        }
    }
}

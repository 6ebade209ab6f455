use async_trait::async_trait;
use time::OffsetDateTime;

/// Wall clock used by the timed services.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Suspends until `deadline`. May return early, callers re-check `now`.
    async fn sleep_until(&self, deadline: OffsetDateTime);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    async fn sleep_until(&self, deadline: OffsetDateTime) {
        let remaining = deadline - OffsetDateTime::now_utc();
        if remaining.is_positive() {
            tokio::time::sleep(remaining.unsigned_abs()).await;
        }
    }
}

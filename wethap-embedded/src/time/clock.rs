use embassy_time::{Duration, Instant};
use time::{OffsetDateTime, UtcOffset};

const MS_PER_HOUR: i64 = 3_600_000;

/// Wall clock derived from the monotonic timer plus the offset learned at the last sync.
pub struct DeviceClock {
    /// Unix time in milliseconds at boot
    utc_offset_ms: i64,
    boot_instant: Instant,
    last_sync: Option<Instant>,
}

impl DeviceClock {
    pub fn new() -> Self {
        Self {
            utc_offset_ms: 0,
            boot_instant: Instant::now(),
            last_sync: None,
        }
    }

    pub fn sync(&mut self, utc: OffsetDateTime) {
        let utc_ms = utc.unix_timestamp() * 1000 + (utc.nanosecond() / 1_000_000) as i64;

        self.utc_offset_ms = utc_ms - self.uptime_ms() as i64;
        self.last_sync = Some(Instant::now());

        log::info!("Time synced, offset: {} ms", self.utc_offset_ms);
    }

    pub fn now_utc(&self) -> OffsetDateTime {
        let utc_ms = self.uptime_ms() as i128 + self.utc_offset_ms as i128;

        OffsetDateTime::from_unix_timestamp_nanos(utc_ms * 1_000_000)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// Current time shifted to a fixed whole-hour zone
    pub fn now_local(&self, timezone_hours: i8) -> OffsetDateTime {
        let offset = UtcOffset::from_hms(timezone_hours, 0, 0).unwrap_or(UtcOffset::UTC);
        self.now_utc().to_offset(offset)
    }

    pub fn uptime_ms(&self) -> u64 {
        Instant::now().duration_since(self.boot_instant).as_millis()
    }

    pub fn is_synced(&self) -> bool {
        self.last_sync.is_some()
    }

    /// Time left until the next full UTC hour, never zero
    pub fn until_next_hour(&self) -> Duration {
        let now_ms = self.uptime_ms() as i64 + self.utc_offset_ms;
        let remaining = MS_PER_HOUR - now_ms.rem_euclid(MS_PER_HOUR);

        Duration::from_millis(remaining as u64)
    }
}

impl Default for DeviceClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_sync_sets_wall_clock() {
        let mut clock = DeviceClock::new();
        assert!(!clock.is_synced());

        let known = datetime!(2021-01-01 00:00:00 UTC);
        clock.sync(known);

        let diff = (clock.now_utc().unix_timestamp() - known.unix_timestamp()).abs();
        assert!(diff <= 1, "clock drifted {diff}s right after sync");
        assert!(clock.is_synced());
    }

    #[test]
    fn test_now_local_applies_timezone() {
        let mut clock = DeviceClock::new();
        clock.sync(datetime!(2024-05-01 23:30:00 UTC));

        let local = clock.now_local(9);
        assert_eq!(local.offset().whole_hours(), 9);
        assert_eq!(local.date(), time::macros::date!(2024-05-02));
        assert_eq!(local.hour(), 8);
    }

    #[test]
    fn test_until_next_hour() {
        let mut clock = DeviceClock::new();
        clock.sync(datetime!(2024-05-01 10:59:00 UTC));

        let wait = clock.until_next_hour().as_secs();
        assert!((58..=60).contains(&wait), "waited {wait}s");
    }

    #[test]
    fn test_resync_moves_clock() {
        let mut clock = DeviceClock::new();
        clock.sync(datetime!(2021-01-01 00:00:00 UTC));
        clock.sync(datetime!(2021-01-01 00:01:00 UTC));

        assert!(clock.now_utc() >= datetime!(2021-01-01 00:01:00 UTC));
    }
}

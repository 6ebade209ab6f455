use std::sync::Arc;

use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, Time, UtcOffset};
use wethap_api::ServerPush;

use crate::configs::Schedule;
use crate::services::clock::Clock;
use crate::services::connection_registry::ConnectionRegistry;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Schedule has no fire times")]
    Empty,

    #[error("Invalid fire time {0}, expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid UTC offset {0}")]
    InvalidOffset(i8),
}

/// One upcoming reading request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledReading {
    pub fire_at: OffsetDateTime,
    /// 1-based position of the entry in the day's schedule.
    pub sequence: u32,
}

/// Sorted, de-duplicated times of day evaluated in a fixed UTC offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    times: Vec<Time>,
    offset: UtcOffset,
}

impl DailySchedule {
    pub fn new(mut times: Vec<Time>, offset: UtcOffset) -> Result<Self, ScheduleError> {
        times.sort();
        times.dedup();

        if times.is_empty() {
            return Err(ScheduleError::Empty);
        }

        Ok(Self { times, offset })
    }

    pub fn parse(entries: &[String], utc_offset_hours: i8) -> Result<Self, ScheduleError> {
        let format = format_description!("[hour]:[minute]");
        let times = entries
            .iter()
            .map(|entry| {
                Time::parse(entry.trim(), &format)
                    .map_err(|_| ScheduleError::InvalidTime(entry.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let offset = UtcOffset::from_hms(utc_offset_hours, 0, 0)
            .map_err(|_| ScheduleError::InvalidOffset(utc_offset_hours))?;

        Self::new(times, offset)
    }

    pub fn from_settings(schedule: &Schedule) -> Result<Self, ScheduleError> {
        Self::parse(&schedule.fire_times, schedule.utc_offset_hours)
    }

    pub fn times(&self) -> &[Time] {
        &self.times
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    /// Soonest entry strictly after `instant`, wrapping to the next day.
    pub fn next_after(&self, instant: OffsetDateTime) -> ScheduledReading {
        let local = instant.to_offset(self.offset);
        let today = local.date();

        for (index, time) in self.times.iter().enumerate() {
            let fire_at = today.with_time(*time).assume_offset(self.offset);
            if fire_at > local {
                return ScheduledReading {
                    fire_at,
                    sequence: index as u32 + 1,
                };
            }
        }

        let tomorrow = today.next_day().unwrap_or(Date::MAX);
        ScheduledReading {
            fire_at: tomorrow.with_time(self.times[0]).assume_offset(self.offset),
            sequence: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcasterState {
    Idle,
    Waiting(ScheduledReading),
    Firing(ScheduledReading),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Fired {
        reading: ScheduledReading,
        delivered: usize,
    },
    /// Woke up too long after the target; nothing was sent.
    Skipped {
        reading: ScheduledReading,
        late_by: Duration,
    },
}

/// Pushes "request info" to every connected sender at each scheduled time.
pub struct ScheduledBroadcaster {
    schedule: DailySchedule,
    registry: Arc<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
    max_lateness: Duration,
    last_fired: Option<OffsetDateTime>,
    state: BroadcasterState,
}

impl ScheduledBroadcaster {
    pub fn new(
        schedule: DailySchedule,
        registry: Arc<ConnectionRegistry>,
        clock: Arc<dyn Clock>,
        max_lateness: Duration,
    ) -> Self {
        Self {
            schedule,
            registry,
            clock,
            max_lateness,
            last_fired: None,
            state: BroadcasterState::Idle,
        }
    }

    pub fn state(&self) -> BroadcasterState {
        self.state
    }

    /// Next target, never at or before the last one handled.
    pub fn plan_next(&self) -> ScheduledReading {
        let now = self.clock.now();
        let base = match self.last_fired {
            Some(last) if last > now => last,
            _ => now,
        };

        self.schedule.next_after(base)
    }

    pub async fn next_cycle(&mut self) -> CycleOutcome {
        let reading = self.plan_next();
        self.state = BroadcasterState::Waiting(reading);
        tracing::debug!(fire_at = %reading.fire_at, sequence = reading.sequence, "waiting for next reading");

        while self.clock.now() < reading.fire_at {
            self.clock.sleep_until(reading.fire_at).await;
        }

        self.state = BroadcasterState::Firing(reading);
        self.last_fired = Some(reading.fire_at);

        let late_by = self.clock.now() - reading.fire_at;
        let outcome = if late_by > self.max_lateness {
            tracing::warn!(fire_at = %reading.fire_at, sequence = reading.sequence, %late_by, "woke too late, reading skipped");
            CycleOutcome::Skipped { reading, late_by }
        } else {
            let push = ServerPush::RequestInfo {
                num_gen: Some(reading.sequence),
            };
            let delivered = self.registry.broadcast(&push, None).await;
            tracing::info!(sequence = reading.sequence, delivered, "reading requested");
            CycleOutcome::Fired { reading, delivered }
        };

        self.state = BroadcasterState::Idle;
        outcome
    }

    pub async fn run(mut self) {
        tracing::info!(times = self.schedule.times().len(), offset = %self.schedule.offset(), "scheduled broadcaster started");

        loop {
            self.next_cycle().await;
        }
    }
}

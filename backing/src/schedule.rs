//! Appreciation schedule calculator
//!
//! A property appreciates over `duration` split into an initial phase (the
//! first quarter) and an approval phase (the remaining three quarters), each
//! counted in whole allocation intervals.

use crate::error::{BackingError, Result};
use chrono::Duration;
use meta_core::{IntervalClock, Timestamp};
use serde::{Deserialize, Serialize};

/// Phase boundaries and interval counts of a fresh schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialParameters {
    pub start_time: Timestamp,
    pub time_to_25_percent: Timestamp,
    pub time_to_100_percent: Timestamp,
    pub intervals_to_25_percent: u32,
    pub intervals_to_100_percent: u32,
    pub initial_counter_max: u32,
    pub approval_counter_max: u32,
}

/// Parameters for re-deriving the approval phase after a late approval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartParameters {
    pub restart_time: Timestamp,
    pub intervals_to_end: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleCalculator {
    clock: IntervalClock,
}

impl ScheduleCalculator {
    pub fn new(clock: IntervalClock) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &IntervalClock {
        &self.clock
    }

    /// `t + span`, or an error instead of leaving chrono's range
    pub fn offset(&self, t: Timestamp, span: Duration) -> Result<Timestamp> {
        t.checked_add_signed(span).ok_or(BackingError::TimeOverflow {
            start: t,
            span_secs: span.num_seconds(),
        })
    }

    fn intervals(&self, span: Duration) -> Result<u32> {
        let count = span.num_seconds() / self.clock.interval_secs();
        u32::try_from(count).map_err(|_| BackingError::InvalidDuration {
            duration_secs: span.num_seconds(),
            interval_secs: self.clock.interval_secs(),
        })
    }

    pub fn initial_parameters(
        &self,
        start_time: Timestamp,
        duration: Duration,
    ) -> Result<InitialParameters> {
        let duration_secs = duration.num_seconds();
        let interval_secs = self.clock.interval_secs();
        if duration_secs <= 0 || duration_secs % interval_secs != 0 {
            return Err(BackingError::InvalidDuration {
                duration_secs,
                interval_secs,
            });
        }
        if !self.clock.is_aligned(start_time) {
            return Err(BackingError::MisalignedStart(start_time));
        }

        let time_to_25_percent = self.offset(start_time, Duration::seconds(duration_secs / 4))?;
        let time_to_100_percent = self.offset(start_time, duration)?;
        // allocation times never pass one interval beyond the end
        self.offset(time_to_100_percent, self.clock.interval())?;

        let intervals_to_25_percent = self.intervals(time_to_25_percent - start_time)?;
        let intervals_to_100_percent = self.intervals(time_to_100_percent - start_time)?;

        let initial_counter_max = intervals_to_100_percent / 4;
        let approval_counter_max = intervals_to_100_percent - initial_counter_max;

        Ok(InitialParameters {
            start_time,
            time_to_25_percent,
            time_to_100_percent,
            intervals_to_25_percent,
            intervals_to_100_percent,
            initial_counter_max,
            approval_counter_max,
        })
    }

    pub fn restart_parameters(
        &self,
        current_time: Timestamp,
        end_time: Timestamp,
    ) -> Result<RestartParameters> {
        if current_time >= end_time {
            return Err(BackingError::RestartAfterEnd {
                current: current_time,
                end: end_time,
            });
        }

        let restart_time = self.clock.preceding_boundary(current_time);
        let intervals_to_end = self.intervals(end_time - restart_time)?;

        Ok(RestartParameters {
            restart_time,
            intervals_to_end,
        })
    }
}

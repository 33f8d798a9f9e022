use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use super::scheduler::SchedulerConfig;

/// Decides whether an update cycle may run at a given instant: only on working days,
/// from the start hour until midnight, in the configured local timezone.
#[derive(Debug, Clone)]
pub struct TimeWindowGate {
    working_days: Vec<Weekday>,
    start_hour: u32,
    timezone: Tz,
}

/// Why the gate refused a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRefusal {
    NotWorkingDay(Weekday),
    BeforeStartHour(u32),
}

impl TimeWindowGate {
    pub fn new(working_days: Vec<Weekday>, start_hour: u32, timezone: Tz) -> Self {
        Self { working_days, start_hour, timezone }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.working_days.clone(), config.start_hour, config.timezone)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn allowed(&self, now: DateTime<Utc>) -> bool {
        self.check(now).is_ok()
    }

    pub fn check(&self, now: DateTime<Utc>) -> Result<(), GateRefusal> {
        let local = now.with_timezone(&self.timezone);

        let weekday = local.weekday();
        if !self.working_days.contains(&weekday) {
            return Err(GateRefusal::NotWorkingDay(weekday));
        }

        let hour = local.hour();
        if hour < self.start_hour {
            return Err(GateRefusal::BeforeStartHour(hour));
        }

        Ok(())
    }
}

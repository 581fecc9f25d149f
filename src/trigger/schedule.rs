//! Daily schedule in cron notation

use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("expected 5 cron fields, got {0}")]
    FieldCount(usize),

    #[error("invalid {field} '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("only daily schedules are supported; '{0}' must be '*'")]
    NotDaily(String),
}

/// A fixed time of day, in UTC
///
/// Only the `M H * * *` form is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub hour: u32,
    pub minute: u32,
}

impl DailySchedule {
    pub fn parse(expr: &str) -> Result<Self, ScheduleError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(ScheduleError::FieldCount(fields.len()));
        }

        let minute = parse_field(fields[0], "minute", 59)?;
        let hour = parse_field(fields[1], "hour", 23)?;
        for field in &fields[2..] {
            if *field != "*" {
                return Err(ScheduleError::NotDaily(field.to_string()));
            }
        }

        Ok(DailySchedule { hour, minute })
    }

    /// The first fire time strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let time = NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN);
        let today = now.date_naive().and_time(time).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

fn parse_field(value: &str, field: &'static str, max: u32) -> Result<u32, ScheduleError> {
    value
        .parse::<u32>()
        .ok()
        .filter(|v| *v <= max)
        .ok_or_else(|| ScheduleError::InvalidField {
            field,
            value: value.to_string(),
        })
}

impl FromStr for DailySchedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DailySchedule::parse(s)
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "daily at {:02}:{:02} UTC", self.hour, self.minute)
    }
}

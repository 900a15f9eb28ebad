// Wall-clock schedule helpers for the daily bill reminder run
//
// Cron expressions use the six-field form with second precision, evaluated
// in the configured timezone.

use crate::errors::ScheduleError;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// Parse and validate a cron expression
pub fn parse_cron_expression(expression: &str) -> Result<CronSchedule, ScheduleError> {
    CronSchedule::from_str(expression).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    Tz::from_str(name).map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}

/// A cron schedule bound to a timezone
#[derive(Debug, Clone)]
pub struct DailySchedule {
    expression: String,
    schedule: CronSchedule,
    timezone: Tz,
}

impl DailySchedule {
    pub fn new(expression: &str, timezone: &str) -> Result<Self, ScheduleError> {
        Ok(Self {
            expression: expression.to_string(),
            schedule: parse_cron_expression(expression)?,
            timezone: parse_timezone(timezone)?,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Next fire time strictly after `reference`, in UTC
    pub fn next_after(&self, reference: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let reference_in_tz = reference.with_timezone(&self.timezone);

        self.schedule
            .after(&reference_in_tz)
            .next()
            .map(|next| next.with_timezone(&Utc))
            .ok_or_else(|| ScheduleError::NoNextExecution(self.expression.clone()))
    }
}

/// The calendar day a UTC instant falls on in `timezone`
pub fn local_date(now: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    now.with_timezone(&timezone).date_naive()
}

/// Midnight on the first day of `date`'s month in `timezone`, as UTC
pub fn start_of_month(date: NaiveDate, timezone: Tz) -> DateTime<Utc> {
    let first = date.with_day(1).unwrap_or(date);
    start_of_day(first, timezone)
}

/// Midnight of `date` in `timezone`, as UTC
pub fn start_of_day(date: NaiveDate, timezone: Tz) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    timezone
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Midnight skipped by a DST jump; fall back to treating it as UTC
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Midnight on the first day of the month after `date`'s month, as UTC
pub fn start_of_next_month(date: NaiveDate, timezone: Tz) -> DateTime<Utc> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date);
    start_of_day(first, timezone)
}

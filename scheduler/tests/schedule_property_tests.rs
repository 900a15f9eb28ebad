// Property-based tests for the daily reminder schedule

use chrono::{Datelike, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Asia::Jakarta;
use common::schedule::{local_date, start_of_month, DailySchedule};
use proptest::prelude::*;

fn reminder_schedule() -> DailySchedule {
    DailySchedule::new("0 0 8 * * *", "Asia/Jakarta").expect("valid schedule")
}

// The next fire time is always later than the reference, at most one day
// away, and falls on 08:00:00 Jakarta time.
#[test]
fn property_next_fire_is_next_eight_am_in_jakarta() {
    let schedule = reminder_schedule();

    proptest!(|(offset_seconds in 0i64..(5 * 365 * 86_400))| {
        let reference = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + Duration::seconds(offset_seconds);

        let next = schedule.next_after(reference).unwrap();
        let local = next.with_timezone(&Jakarta);

        prop_assert!(next > reference);
        prop_assert!(next - reference <= Duration::days(1));
        prop_assert_eq!(local.hour(), 8);
        prop_assert_eq!(local.minute(), 0);
        prop_assert_eq!(local.second(), 0);
    });
}

// The month window used by the "already paid" check always contains the
// local day it was computed for.
#[test]
fn property_month_start_precedes_local_day() {
    proptest!(|(offset_seconds in 0i64..(5 * 365 * 86_400))| {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + Duration::seconds(offset_seconds);

        let today = local_date(now, Jakarta);
        let month_start = start_of_month(today, Jakarta);
        let local_start = month_start.with_timezone(&Jakarta);

        prop_assert!(month_start <= now);
        prop_assert_eq!(local_start.day(), 1);
        prop_assert_eq!(local_start.month(), today.month());
        prop_assert_eq!(local_start.hour(), 0);
    });
}

#[test]
fn test_fire_after_eight_am_rolls_to_next_day() {
    let schedule = reminder_schedule();
    // 2024-03-15 09:00 Jakarta
    let reference = Utc.with_ymd_and_hms(2024, 3, 15, 2, 0, 0).unwrap();

    let next = schedule.next_after(reference).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 16, 1, 0, 0).unwrap());
}

#[test]
fn test_fire_before_eight_am_is_same_day() {
    let schedule = reminder_schedule();
    // 2024-03-15 07:59 Jakarta
    let reference = Utc.with_ymd_and_hms(2024, 3, 15, 0, 59, 0).unwrap();

    let next = schedule.next_after(reference).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 15, 1, 0, 0).unwrap());
}

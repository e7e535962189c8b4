//! Time and timestamp helpers.
//!
//! Everything that is compared is normalised to UTC first; local civil time
//! only matters for "which day is it" and "when is midnight" questions, and
//! those are answered in the device's own time zone.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// UTC timestamp used for trigger evaluation, run start times, firing markers.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Calendar date of `now` in the given time zone.
#[must_use]
pub fn local_date(now: Timestamp, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Time remaining until the next local midnight in `tz`.
///
/// When the zone skips midnight (DST gap), the first valid instant after it
/// is used instead. Never negative.
#[must_use]
pub fn until_next_midnight(now: Timestamp, tz: Tz) -> TimeDelta {
    let today = local_date(now, tz);
    let Some(tomorrow) = today.succ_opt() else {
        return TimeDelta::zero();
    };
    let midnight = tomorrow.and_time(chrono::NaiveTime::MIN);
    let next = tz
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + TimeDelta::hours(1)))
                .earliest()
        })
        .map_or_else(|| midnight.and_utc(), |dt| dt.with_timezone(&Utc));
    (next - now).max(TimeDelta::zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_count_seconds_until_utc_midnight() {
        let left = until_next_midnight(utc(2024, 6, 1, 20, 0, 0), Tz::UTC);
        assert_eq!(left.num_seconds(), 4 * 3600);
    }

    #[test]
    fn should_use_device_zone_for_midnight() {
        // 20:00 UTC is 22:00 in Paris during summer time.
        let left = until_next_midnight(utc(2024, 6, 1, 20, 0, 0), Tz::Europe__Paris);
        assert_eq!(left.num_seconds(), 2 * 3600);
    }

    #[test]
    fn should_roll_over_to_next_day_after_local_midnight() {
        // 23:30 UTC is already 01:30 on June 2nd in Paris.
        let left = until_next_midnight(utc(2024, 6, 1, 23, 30, 0), Tz::Europe__Paris);
        assert_eq!(left.num_seconds(), 22 * 3600 + 30 * 60);
    }

    #[test]
    fn should_report_local_date_in_device_zone() {
        let ts = utc(2024, 6, 1, 23, 30, 0);
        assert_eq!(
            local_date(ts, Tz::Europe__Paris),
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
        );
        assert_eq!(
            local_date(ts, Tz::UTC),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }
}

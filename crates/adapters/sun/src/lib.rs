//! # twilight-adapter-sun
//!
//! [`SunEventProvider`] backed by the `sunrise` crate.
//!
//! The crate computes events per UTC day. A device west of Greenwich sees
//! its evening sunset land on the next UTC day, so the provider checks the
//! neighbouring days and keeps the instant that falls on the requested
//! local date.

use chrono::{Days, NaiveDate};
use chrono_tz::Tz;
use sunrise::{SolarDay, SolarEvent};

use twilight_app::ports::SunEventProvider;
use twilight_domain::device::Coordinates;
use twilight_domain::error::SunCalcError;
use twilight_domain::time::Timestamp;

/// Astronomical sunset at ground level.
#[derive(Debug, Clone, Copy, Default)]
pub struct SunriseProvider;

impl SunEventProvider for SunriseProvider {
    fn sunset(
        &self,
        coordinates: Coordinates,
        date: NaiveDate,
        tz: Tz,
    ) -> Result<Timestamp, SunCalcError> {
        let coord = sunrise::Coordinates::new(coordinates.latitude, coordinates.longitude)
            .ok_or(SunCalcError::InvalidCoordinates {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            })?;

        // Polar day and night produce an instant far from `date`, which
        // never matches.
        [
            Some(date),
            date.checked_add_days(Days::new(1)),
            date.checked_sub_days(Days::new(1)),
        ]
        .into_iter()
        .flatten()
        .map(|day| SolarDay::new(coord, day).event_time(SolarEvent::Sunset))
        .find(|instant| falls_on(*instant, date, tz))
        .ok_or(SunCalcError::NoSunset { date })
    }
}

fn falls_on(instant: Timestamp, date: NaiveDate, tz: Tz) -> bool {
    instant.with_timezone(&tz).date_naive() == date
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn paris() -> Coordinates {
        Coordinates {
            latitude: 48.8566,
            longitude: 2.3522,
        }
    }

    #[test]
    fn should_compute_paris_summer_sunset() {
        let sunset = SunriseProvider
            .sunset(paris(), date(2024, 6, 21), chrono_tz::Europe::Paris)
            .unwrap();

        let expected = Utc.with_ymd_and_hms(2024, 6, 21, 19, 58, 0).unwrap();
        assert!((sunset - expected).num_minutes().abs() <= 5, "got {sunset}");
    }

    #[test]
    fn should_keep_local_date_when_sunset_is_next_utc_day() {
        let los_angeles = Coordinates {
            latitude: 34.0522,
            longitude: -118.2437,
        };
        let tz = chrono_tz::America::Los_Angeles;

        let sunset = SunriseProvider
            .sunset(los_angeles, date(2024, 6, 21), tz)
            .unwrap();

        let local = sunset.with_timezone(&tz);
        assert_eq!(local.date_naive(), date(2024, 6, 21));
        assert_eq!(local.hour(), 20);
    }

    #[test]
    fn should_set_earlier_in_winter() {
        let tz = chrono_tz::Europe::Paris;
        let summer = SunriseProvider.sunset(paris(), date(2024, 6, 21), tz).unwrap();
        let winter = SunriseProvider.sunset(paris(), date(2024, 12, 21), tz).unwrap();

        assert!(winter.with_timezone(&tz).time() < summer.with_timezone(&tz).time());
    }

    #[test]
    fn should_fail_when_coordinates_are_out_of_range() {
        let err = SunriseProvider
            .sunset(
                Coordinates {
                    latitude: 95.0,
                    longitude: 0.0,
                },
                date(2024, 6, 21),
                Tz::UTC,
            )
            .unwrap_err();

        assert!(matches!(err, SunCalcError::InvalidCoordinates { .. }));
    }

    #[test]
    fn should_reject_instants_on_other_local_days() {
        let late = Utc.with_ymd_and_hms(2024, 6, 22, 3, 0, 0).unwrap();

        assert!(falls_on(late, date(2024, 6, 21), chrono_tz::America::Los_Angeles));
        assert!(!falls_on(late, date(2024, 6, 21), Tz::UTC));
    }
}

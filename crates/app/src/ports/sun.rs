//! Sun event port: astronomical sunset lookup.

use chrono::NaiveDate;
use chrono_tz::Tz;

use twilight_domain::device::Coordinates;
use twilight_domain::error::SunCalcError;
use twilight_domain::time::Timestamp;

/// Pure sunset calculator.
///
/// `date` is a calendar day in `tz`; the returned instant is in UTC.
pub trait SunEventProvider: Send + Sync {
    /// Sunset on `date` at `coordinates`.
    ///
    /// # Errors
    ///
    /// Returns [`SunCalcError`] when the position is invalid or the sun does
    /// not set on that day (polar day or night).
    fn sunset(
        &self,
        coordinates: Coordinates,
        date: NaiveDate,
        tz: Tz,
    ) -> Result<Timestamp, SunCalcError>;
}

//! Device: a remote light (or group of lights) and the place it lives.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::command::Selector;
use crate::error::SunCalcError;

/// Geographic position used only to evaluate the local sunset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// `(0, 0)` is what an unset position looks like in older config files.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    #[must_use]
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A controllable target.
///
/// `id` is the remote selector, `name` is the label used by the inbound
/// control surface. `timezone` is the IANA zone the device lives in; it
/// decides which calendar day's sunset applies and when local midnight is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTarget {
    pub id: Selector,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<Tz>,
}

impl DeviceTarget {
    #[must_use]
    pub fn new(id: Selector, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            coordinates: None,
            timezone: None,
        }
    }

    #[must_use]
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(Coordinates {
            latitude,
            longitude,
        });
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = Some(tz);
        self
    }

    /// The device's zone, UTC when none is configured.
    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone.unwrap_or(Tz::UTC)
    }

    /// Coordinates usable for a sunset lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SunCalcError::MissingCoordinates`] when absent or `(0, 0)`,
    /// and [`SunCalcError::InvalidCoordinates`] when out of range.
    pub fn sun_coordinates(&self) -> Result<Coordinates, SunCalcError> {
        let coords = self
            .coordinates
            .filter(|c| !c.is_unset())
            .ok_or_else(|| SunCalcError::MissingCoordinates {
                device: self.name.clone(),
            })?;
        if !coords.in_range() {
            return Err(SunCalcError::InvalidCoordinates {
                latitude: coords.latitude,
                longitude: coords.longitude,
            });
        }
        Ok(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_utc_when_no_zone_configured() {
        let device = DeviceTarget::new(Selector::new("id:1"), "Den");
        assert_eq!(device.timezone(), Tz::UTC);
    }

    #[test]
    fn should_treat_zero_coordinates_as_missing() {
        let device = DeviceTarget::new(Selector::new("id:1"), "Den").with_coordinates(0.0, 0.0);
        assert!(matches!(
            device.sun_coordinates(),
            Err(SunCalcError::MissingCoordinates { .. })
        ));
    }

    #[test]
    fn should_reject_out_of_range_coordinates() {
        let device = DeviceTarget::new(Selector::new("id:1"), "Den").with_coordinates(95.0, 10.0);
        assert!(matches!(
            device.sun_coordinates(),
            Err(SunCalcError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn should_parse_original_config_shape() {
        let json = r#"{
            "coordinates": {"latitude": 48.85, "longitude": 2.35},
            "id": "id:d073d5000001",
            "name": "Living"
        }"#;
        let device: DeviceTarget = serde_json::from_str(json).unwrap();
        assert_eq!(device.name, "Living");
        assert_eq!(device.id.as_str(), "id:d073d5000001");
        assert!(device.timezone.is_none());
        assert!(device.sun_coordinates().is_ok());
    }

    #[test]
    fn should_parse_iana_timezone() {
        let json = r#"{"id": "all", "name": "All", "timezone": "Europe/Paris"}"#;
        let device: DeviceTarget = serde_json::from_str(json).unwrap();
        assert_eq!(device.timezone(), Tz::Europe__Paris);
    }
}

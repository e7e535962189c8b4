//! Lighting configuration: the read-only snapshot every trigger works from.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::{Kelvin, MAX_KELVIN, MIN_KELVIN};
use crate::device::DeviceTarget;
use crate::dusk::{BETA_STEP_CAP, DuskProfile};
use crate::error::ConfigError;

/// `{token, defaultColor, dusk, devices}` as stored by the config collaborator.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightingConfig {
    /// Bearer token for the remote lighting API.
    pub token: String,
    pub default_color: Kelvin,
    pub dusk: DuskProfile,
    #[serde(default)]
    pub devices: Vec<DeviceTarget>,
}

impl fmt::Debug for LightingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightingConfig")
            .field("token", &"<redacted>")
            .field("default_color", &self.default_color)
            .field("dusk", &self.dusk)
            .field("devices", &self.devices)
            .finish()
    }
}

/// Something the operator should hear about but that does not block loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Beta always plays 8 states but interpolates over `steps`.
    BetaCapMismatch { steps: u32 },
    /// No IANA zone given, UTC is assumed.
    MissingTimezone { device: String },
    /// Dusk triggers cannot fire for this device.
    MissingCoordinates { device: String },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BetaCapMismatch { steps } => write!(
                f,
                "dusk.steps is {steps} but the beta strategy always plays {BETA_STEP_CAP} states"
            ),
            Self::MissingTimezone { device } => {
                write!(f, "device {device} has no timezone, assuming UTC")
            }
            Self::MissingCoordinates { device } => {
                write!(f, "device {device} has no coordinates, dusk cannot trigger")
            }
        }
    }
}

impl LightingConfig {
    /// Check the whole document.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        if !self.default_color.is_valid() {
            return Err(ConfigError::InvalidDefaultColor {
                value: self.default_color.value(),
                min: MIN_KELVIN,
                max: MAX_KELVIN,
            });
        }
        self.dusk.validate()?;

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                return Err(ConfigError::EmptyDeviceName);
            }
            if device.id.is_empty() {
                return Err(ConfigError::EmptyDeviceId {
                    name: device.name.clone(),
                });
            }
            if !names.insert(device.name.as_str()) {
                return Err(ConfigError::DuplicateDeviceName(device.name.clone()));
            }
            if !ids.insert(device.id.as_str()) {
                return Err(ConfigError::DuplicateDeviceId(device.id.to_string()));
            }
            if device.coordinates.is_some_and(|c| !c.in_range()) {
                return Err(ConfigError::InvalidCoordinates {
                    name: device.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Non-fatal findings, reported once per load.
    #[must_use]
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.dusk.beta_cap_mismatch() {
            warnings.push(ConfigWarning::BetaCapMismatch {
                steps: self.dusk.steps,
            });
        }
        for device in &self.devices {
            if device.timezone.is_none() {
                warnings.push(ConfigWarning::MissingTimezone {
                    device: device.name.clone(),
                });
            }
            if device.coordinates.is_none_or(|c| c.is_unset()) {
                warnings.push(ConfigWarning::MissingCoordinates {
                    device: device.name.clone(),
                });
            }
        }
        warnings
    }

    /// Resolve a device by its label.
    #[must_use]
    pub fn find_device(&self, name: &str) -> Option<&DeviceTarget> {
        self.devices.iter().find(|device| device.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Selector;
    use crate::error::ProfileError;
    use chrono_tz::Tz;

    const DOCUMENT: &str = r#"{
        "token": "c0ffee",
        "defaultColor": "3000",
        "dusk": {
            "colorStart": "2200",
            "colorEnd": "4000",
            "steps": 4,
            "duration": 40,
            "turnOffRange": 10
        },
        "devices": [
            {
                "coordinates": {"latitude": 48.85, "longitude": 2.35},
                "id": "id:d073d5000001",
                "name": "Living",
                "timezone": "Europe/Paris"
            },
            {
                "coordinates": {"latitude": 0, "longitude": 0},
                "id": "group:Kitchen",
                "name": "Kitchen"
            }
        ]
    }"#;

    fn config() -> LightingConfig {
        serde_json::from_str(DOCUMENT).unwrap()
    }

    #[test]
    fn should_parse_document_with_string_kelvins() {
        let config = config();
        assert_eq!(config.default_color, Kelvin::new(3000));
        assert_eq!(config.dusk.color_end, Kelvin::new(4000));
        assert_eq!(config.devices.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_find_device_by_name() {
        let config = config();
        let device = config.find_device("Living").unwrap();
        assert_eq!(device.id, Selector::new("id:d073d5000001"));
        assert_eq!(device.timezone(), Tz::Europe__Paris);
        assert!(config.find_device("living").is_none());
    }

    #[test]
    fn should_reject_empty_token() {
        let mut config = config();
        config.token = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyToken));
    }

    #[test]
    fn should_reject_zero_steps_through_profile() {
        let mut config = config();
        config.dusk.steps = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Profile(ProfileError::NoSteps))
        );
    }

    #[test]
    fn should_reject_document_when_duration_would_overflow() {
        let document = DOCUMENT.replace("\"duration\": 40", "\"duration\": 71582789");
        let config: LightingConfig = serde_json::from_str(&document).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Profile(ProfileError::DurationTooLong { .. }))
        ));
    }

    #[test]
    fn should_reject_duplicate_device_names() {
        let mut config = config();
        config.devices[1].name = "Living".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateDeviceName("Living".to_string()))
        );
    }

    #[test]
    fn should_reject_duplicate_device_ids() {
        let mut config = config();
        config.devices[1].id = Selector::new("id:d073d5000001");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateDeviceId(_))
        ));
    }

    #[test]
    fn should_reject_out_of_range_default_colour() {
        let mut config = config();
        config.default_color = Kelvin::new(12_000);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDefaultColor { value: 12_000, .. })
        ));
    }

    #[test]
    fn should_warn_about_beta_cap_and_missing_fields() {
        let warnings = config().warnings();
        assert!(warnings.contains(&ConfigWarning::BetaCapMismatch { steps: 4 }));
        assert!(warnings.contains(&ConfigWarning::MissingTimezone {
            device: "Kitchen".to_string()
        }));
        assert!(warnings.contains(&ConfigWarning::MissingCoordinates {
            device: "Kitchen".to_string()
        }));
        assert!(!warnings.contains(&ConfigWarning::MissingTimezone {
            device: "Living".to_string()
        }));
    }

    #[test]
    fn should_redact_token_in_debug_output() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("c0ffee"));
        assert!(rendered.contains("<redacted>"));
    }
}

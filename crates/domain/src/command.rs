//! Light command: one target state sent to the remote lighting API.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Kelvin;

/// Power state requested by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    On,
    Off,
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Opaque remote selector for one device or a group (`id:d073d5…`, `group:Den`, `all`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(String);

impl Selector {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single lighting state change.
///
/// `brightness` is always within `[0, 1]` and `duration_secs` is never
/// negative; the constructors clamp their inputs. `fast` asks the remote
/// API to skip its state check and acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightCommand {
    pub selector: Selector,
    pub power: Power,
    pub color: Kelvin,
    pub brightness: f32,
    pub duration_secs: f32,
    pub fast: bool,
}

impl LightCommand {
    #[must_use]
    pub fn new(
        selector: Selector,
        power: Power,
        color: Kelvin,
        brightness: f32,
        duration_secs: f32,
        fast: bool,
    ) -> Self {
        Self {
            selector,
            power,
            color,
            brightness: brightness.clamp(0.0, 1.0),
            duration_secs: duration_secs.max(0.0),
            fast,
        }
    }

    /// Power on at `color` with `brightness`, applied instantly.
    #[must_use]
    pub fn power_on(selector: Selector, color: Kelvin, brightness: f32) -> Self {
        Self::new(selector, Power::On, color, brightness, 0.0, false)
    }

    /// Power off instantly, leaving `color` as the remembered colour.
    #[must_use]
    pub fn power_off(selector: Selector, color: Kelvin) -> Self {
        Self::new(selector, Power::Off, color, 0.0, 0.0, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_clamp_brightness_into_unit_range() {
        let bright = LightCommand::new(
            Selector::new("all"),
            Power::On,
            Kelvin::new(2700),
            1.7,
            0.0,
            true,
        );
        let dark = LightCommand::new(
            Selector::new("all"),
            Power::On,
            Kelvin::new(2700),
            -0.3,
            0.0,
            true,
        );
        assert!((bright.brightness - 1.0).abs() < f32::EPSILON);
        assert!(dark.brightness.abs() < f32::EPSILON);
    }

    #[test]
    fn should_never_hold_negative_duration() {
        let cmd = LightCommand::new(
            Selector::new("all"),
            Power::On,
            Kelvin::new(2700),
            0.5,
            -12.0,
            true,
        );
        assert!(cmd.duration_secs.abs() < f32::EPSILON);
    }

    #[test]
    fn should_build_instant_power_off_with_zero_brightness() {
        let cmd = LightCommand::power_off(Selector::new("id:abc"), Kelvin::new(3000));
        assert_eq!(cmd.power, Power::Off);
        assert!(cmd.brightness.abs() < f32::EPSILON);
        assert!(cmd.duration_secs.abs() < f32::EPSILON);
        assert!(!cmd.fast);
    }

    #[test]
    fn should_display_power_lowercase() {
        assert_eq!(Power::On.to_string(), "on");
        assert_eq!(Power::Off.to_string(), "off");
    }

    #[test]
    fn should_detect_blank_selector() {
        assert!(Selector::new("  ").is_empty());
        assert!(!Selector::new("id:d073d5").is_empty());
    }
}

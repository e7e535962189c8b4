//! Dusk profile: the parameters of the evening light transition.

use serde::{Deserialize, Serialize};

use crate::color::Kelvin;
use crate::error::ProfileError;

/// Number of intermediate states the beta (batch) strategy always emits.
pub const BETA_STEP_CAP: u32 = 8;

/// Upper bound for `steps`: one state per minute over a whole day.
pub const MAX_STEPS: u32 = 1440;

/// Upper bound for `duration`, one day.
pub const MAX_DURATION_MINUTES: u32 = 1440;

/// Start/end colour, number of steps, total duration and turn-off jitter.
///
/// Field names on the wire follow the configuration document
/// (`colorStart`, `colorEnd`, `steps`, `duration`, `turnOffRange`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuskProfile {
    pub color_start: Kelvin,
    pub color_end: Kelvin,
    pub steps: u32,
    #[serde(rename = "duration", alias = "durationMinutes")]
    pub duration_minutes: u32,
    #[serde(rename = "turnOffRange", alias = "turnOffJitterMinutes", default)]
    pub turn_off_jitter_minutes: u32,
}

impl DuskProfile {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] when:
    /// - `steps` is zero ([`ProfileError::NoSteps`]) or above [`MAX_STEPS`]
    /// - `duration_minutes` is zero ([`ProfileError::NoDuration`]) or above
    ///   [`MAX_DURATION_MINUTES`]
    /// - a colour is outside the accepted range
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.steps == 0 {
            return Err(ProfileError::NoSteps);
        }
        if self.steps > MAX_STEPS {
            return Err(ProfileError::TooManySteps {
                value: self.steps,
                max: MAX_STEPS,
            });
        }
        if self.duration_minutes == 0 {
            return Err(ProfileError::NoDuration);
        }
        if self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(ProfileError::DurationTooLong {
                value: self.duration_minutes,
                max: MAX_DURATION_MINUTES,
            });
        }
        self.color_start.ensure_valid("colorStart")?;
        self.color_end.ensure_valid("colorEnd")?;
        Ok(())
    }

    /// Whole transition length in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    /// Seconds each intermediate step lasts, truncated like the total is
    /// split on whole seconds.
    #[must_use]
    pub fn step_duration_secs(&self) -> u32 {
        self.duration_secs() / self.steps.max(1)
    }

    /// Colour at step `n` (1-based), interpolated with truncating integer
    /// division over the configured `steps`.
    ///
    /// `n` may exceed `steps` (the beta strategy does this); the result is
    /// then extrapolated and clamped to the accepted range.
    #[must_use]
    pub fn kelvin_at(&self, n: u32) -> Kelvin {
        let start = i64::from(self.color_start.value());
        let end = i64::from(self.color_end.value());
        let steps = i64::from(self.steps.max(1));
        Kelvin::clamped(start + (end - start) * i64::from(n) / steps)
    }

    /// Whether the beta strategy's fixed cap disagrees with `steps`.
    #[must_use]
    pub fn beta_cap_mismatch(&self) -> bool {
        self.steps != BETA_STEP_CAP
    }
}

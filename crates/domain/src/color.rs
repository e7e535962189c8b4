//! Colour temperature in Kelvin.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProfileError;

/// Lowest colour temperature accepted by the remote API.
pub const MIN_KELVIN: u32 = 1500;
/// Highest colour temperature accepted by the remote API.
pub const MAX_KELVIN: u32 = 9000;

/// A colour temperature.
///
/// Serialises as a plain number. Deserialises from a number or a numeric
/// string, since older configuration files stored Kelvin values as text.
/// Displays as the remote colour string, `kelvin:<N>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Kelvin(u32);

impl Kelvin {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Build from a signed intermediate value, clamped to the accepted range.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        let clamped = value.clamp(i64::from(MIN_KELVIN), i64::from(MAX_KELVIN));
        Self(u32::try_from(clamped).unwrap_or(MIN_KELVIN))
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether the value lies inside [`MIN_KELVIN`]..=[`MAX_KELVIN`].
    #[must_use]
    pub fn is_valid(self) -> bool {
        (MIN_KELVIN..=MAX_KELVIN).contains(&self.0)
    }

    /// Check the accepted range, naming `field` in the error.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::KelvinOutOfRange`] when outside the range.
    pub fn ensure_valid(self, field: &'static str) -> Result<(), ProfileError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ProfileError::KelvinOutOfRange {
                field,
                value: self.0,
                min: MIN_KELVIN,
                max: MAX_KELVIN,
            })
        }
    }
}

impl fmt::Display for Kelvin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kelvin:{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Kelvin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Self(value)),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map(Self)
                .map_err(|_| serde::de::Error::custom(format!("invalid kelvin value {text:?}"))),
        }
    }
}

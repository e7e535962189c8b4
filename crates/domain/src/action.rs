//! Action: what the inbound control surface asks a device to do.

use std::fmt;
use std::str::FromStr;

use crate::plan::DuskStrategy;

/// One of the named actions the router accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read the current remote state.
    State,
    Toggle,
    On,
    Off,
    /// Start a dusk transition with the given strategy.
    Dusk(DuskStrategy),
}

impl Action {
    /// Whether the action goes through the trigger gate.
    #[must_use]
    pub fn is_dusk(self) -> bool {
        matches!(self, Self::Dusk(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::State => "state",
            Self::Toggle => "toggle",
            Self::On => "on",
            Self::Off => "off",
            Self::Dusk(DuskStrategy::Stepped) => "dusk",
            Self::Dusk(DuskStrategy::Basic) => "duskBasic",
            Self::Dusk(DuskStrategy::Beta) => "duskBeta",
        })
    }
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "state" => Ok(Self::State),
            "toggle" => Ok(Self::Toggle),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "dusk" => Ok(Self::Dusk(DuskStrategy::Stepped)),
            "duskBasic" => Ok(Self::Dusk(DuskStrategy::Basic)),
            "duskBeta" => Ok(Self::Dusk(DuskStrategy::Beta)),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no action found for {0}")]
pub struct ParseActionError(pub String);

//! Transition plan: the ordered commands built for one trigger event.
//!
//! A plan is created fresh per trigger, executed exactly once and then
//! dropped. It cannot be modified after the [`Planner`](crate::planner::Planner)
//! builds it.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::{LightCommand, Power, Selector};
use crate::error::CapacityError;

/// Maximum number of states the remote cycle endpoint accepts per call.
pub const MAX_CYCLE_STATES: usize = 50;

/// How a dusk transition is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuskStrategy {
    /// Gradual: one command per configured step, then a randomized dwell and power-off.
    Stepped,
    /// A single long fade straight to the end colour.
    Basic,
    /// Eight precomputed states submitted to the remote cycle in one call.
    Beta,
}

impl DuskStrategy {
    /// The delivery mode this strategy is designed for.
    #[must_use]
    pub fn delivery(self) -> DeliveryMode {
        match self {
            Self::Stepped | Self::Basic => DeliveryMode::Stepped,
            Self::Beta => DeliveryMode::Batch,
        }
    }
}

impl fmt::Display for DuskStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stepped => f.write_str("stepped"),
            Self::Basic => f.write_str("basic"),
            Self::Beta => f.write_str("beta"),
        }
    }
}

impl FromStr for DuskStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stepped" => Ok(Self::Stepped),
            "basic" => Ok(Self::Basic),
            "beta" => Ok(Self::Beta),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

/// Unrecognised strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dusk strategy {0:?}")]
pub struct UnknownStrategy(pub String);

/// How the player delivers a plan to the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// One call per command, sleeping between calls.
    Stepped,
    /// One call carrying the whole plan, played back by the device.
    Batch,
}

/// When a command is meant to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOffset {
    /// Send now, then wait `sleep_after` before the next command.
    Immediate { sleep_after: Duration },
    /// Position inside a pre-timed remote cycle.
    CyclePosition(usize),
}

/// A command paired with its dispatch timing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCommand {
    pub command: LightCommand,
    pub offset: DispatchOffset,
}

impl PlannedCommand {
    /// Time to wait after sending this command; zero for cycle entries.
    #[must_use]
    pub fn sleep_after(&self) -> Duration {
        match self.offset {
            DispatchOffset::Immediate { sleep_after } => sleep_after,
            DispatchOffset::CyclePosition(_) => Duration::ZERO,
        }
    }
}

/// Ordered, immutable list of commands for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    strategy: DuskStrategy,
    selector: Selector,
    commands: Vec<PlannedCommand>,
}

impl TransitionPlan {
    pub(crate) fn new(
        strategy: DuskStrategy,
        selector: Selector,
        commands: Vec<PlannedCommand>,
    ) -> Self {
        Self {
            strategy,
            selector,
            commands,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> DuskStrategy {
        self.strategy
    }

    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    #[must_use]
    pub fn commands(&self) -> &[PlannedCommand] {
        &self.commands
    }

    /// The bare light commands, in order.
    pub fn light_commands(&self) -> impl Iterator<Item = &LightCommand> {
        self.commands.iter().map(|planned| &planned.command)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether the last command turns the light off.
    #[must_use]
    pub fn ends_with_power_off(&self) -> bool {
        self.commands
            .last()
            .is_some_and(|planned| planned.command.power == Power::Off)
    }

    /// Sum of every sleep the stepped player will perform.
    #[must_use]
    pub fn total_dwell(&self) -> Duration {
        self.commands.iter().map(PlannedCommand::sleep_after).sum()
    }

    /// Check the plan fits one remote cycle call.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] when longer than [`MAX_CYCLE_STATES`].
    pub fn ensure_fits_cycle(&self) -> Result<(), CapacityError> {
        if self.commands.len() > MAX_CYCLE_STATES {
            return Err(CapacityError {
                len: self.commands.len(),
                max: MAX_CYCLE_STATES,
            });
        }
        Ok(())
    }
}

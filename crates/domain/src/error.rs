//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`TwilightError`] via `#[from]` at the port boundary.

use chrono::NaiveDate;

/// Boxed error used for sources that come from adapter crates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for every use-case of the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum TwilightError {
    /// The dusk parameters cannot produce a plan.
    #[error("invalid dusk profile")]
    InvalidProfile(#[from] ProfileError),

    /// The sunset instant could not be computed.
    #[error("sunset calculation failed")]
    SunCalc(#[from] SunCalcError),

    /// A remote command failed while a plan was executing.
    #[error("dispatch failed")]
    Dispatch(#[from] DispatchError),

    /// The plan does not fit the remote API's batch limit.
    #[error("plan exceeds batch capacity")]
    Capacity(#[from] CapacityError),

    /// The lighting configuration is malformed or missing.
    #[error("configuration error")]
    Config(#[from] ConfigError),

    /// A referenced device or run does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The request conflicts with work already in progress.
    #[error("conflict")]
    Conflict(#[from] ConflictError),

    /// A single remote call failed outside of plan execution.
    #[error("lighting client error")]
    Client(#[source] BoxError),

    /// The persistence layer failed.
    #[error("storage error")]
    Storage(#[source] BoxError),
}

/// Dusk profile invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("steps must be at least 1")]
    NoSteps,
    #[error("steps must be at most {max}, got {value}")]
    TooManySteps { value: u32, max: u32 },
    #[error("duration must be at least one minute")]
    NoDuration,
    #[error("duration must be at most {max} minutes, got {value}")]
    DurationTooLong { value: u32, max: u32 },
    #[error("{field} must be between {min}K and {max}K, got {value}K")]
    KelvinOutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// The external sunset lookup could not produce an instant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SunCalcError {
    #[error("device {device} has no coordinates")]
    MissingCoordinates { device: String },
    #[error("coordinates ({latitude}, {longitude}) are out of range")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    #[error("the sun does not set on {date}")]
    NoSunset { date: NaiveDate },
}

/// A remote command failed; `step_index` is the zero-based plan position.
#[derive(Debug, thiserror::Error)]
#[error("command {step_index} of the plan failed")]
pub struct DispatchError {
    pub step_index: usize,
    #[source]
    pub source: BoxError,
}

/// Plan larger than the remote batch playback accepts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("plan has {len} commands, the remote cycle accepts at most {max}")]
pub struct CapacityError {
    pub len: usize,
    pub max: usize,
}

/// Lighting configuration validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("token must not be empty")]
    EmptyToken,
    #[error("default color must be between {min}K and {max}K, got {value}K")]
    InvalidDefaultColor { value: u32, min: u32, max: u32 },
    #[error("dusk profile is invalid")]
    Profile(#[from] ProfileError),
    #[error("device name must not be empty")]
    EmptyDeviceName,
    #[error("device {name} has an empty id")]
    EmptyDeviceId { name: String },
    #[error("device name {0} is used more than once")]
    DuplicateDeviceName(String),
    #[error("device id {0} is used more than once")]
    DuplicateDeviceId(String),
    #[error("device {name} has coordinates out of range")]
    InvalidCoordinates { name: String },
    #[error("configuration document is missing")]
    Missing,
}

/// Returned when a lookup by key yields no result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A transition is already running for the device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("a transition is already running for {device}")]
pub struct ConflictError {
    pub device: String,
}

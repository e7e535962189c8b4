//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod action_service;
pub mod config_service;
pub mod dusk_service;

pub use action_service::{ActionOutcome, ActionService};
pub use config_service::{ConfigService, ReloadReport};
pub use dusk_service::{DuskService, TriggerOutcome};

//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod config_store;
pub mod ledger;
pub mod lighting;
pub mod sun;

pub use config_store::ConfigStore;
pub use ledger::FiringLedger;
pub use lighting::LightingClient;
pub use sun::SunEventProvider;

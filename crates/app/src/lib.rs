//! # twilight-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `LightingClient`: send one state or one cycle to the remote lighting API
//!   - `SunEventProvider`: compute the sunset instant for a place and a day
//!   - `FiringLedger`: persist the "last fired date" per device
//!   - `ConfigStore`: load & save the lighting configuration document
//! - Define **driving/inbound ports** as use-case structs:
//!   - `ConfigService`: hold and reload the immutable config snapshot
//!   - `DuskService`: gate, plan and start a dusk transition
//!   - `ActionService`: one entry point per routed action
//! - Provide **in-process infrastructure** that doesn't need IO:
//!   the `TransitionPlayer`, the per-device `RunTable` and the `SunsetWatcher`
//!   polling driver
//!
//! ## Dependency rule
//! Depends on `twilight-domain` only (plus `tokio` for timers, tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod cancel;
pub mod player;
pub mod ports;
pub mod run_table;
pub mod services;
pub mod sunset_watcher;

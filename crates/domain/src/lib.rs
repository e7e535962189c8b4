//! # twilight-domain
//!
//! Pure domain model for the twilightd lighting scheduler.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error taxonomy, timestamps
//! - Define **Light commands** (power, colour temperature, brightness, duration)
//! - Define **Devices** (a remote selector plus the location used for sunset)
//! - Define **Dusk profiles** and the **Lighting config** snapshot
//! - Build **Transition plans** (stepped, basic and beta strategies)
//! - Decide whether a sunset trigger should fire (**Trigger window gate**)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod color;
pub mod command;
pub mod config;
pub mod device;
pub mod dusk;
pub mod gate;
pub mod plan;
pub mod planner;

//! # twilight-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the bulb control surface: `GET /bulb/{name}/{action}` with the
//!   actions `state`, `toggle`, `on`, `off`, `dusk`, `duskBasic`, `duskBeta`
//!   and an optional `?force=true` for dusk actions
//! - Serve a small JSON API under `/api` for active runs and config reloads
//! - Map application results and [`TwilightError`](twilight_domain::error::TwilightError)s
//!   into HTTP responses
//!
//! Dusk actions answer as soon as the run is started; the transition keeps
//! playing in the background.
//!
//! ## Dependency rule
//! Depends on `twilight-app` (for port traits and services) and
//! `twilight-domain` (for types used in request/response mapping). Never
//! leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

//! Lighting port: the remote lighting-control API.

use std::future::Future;

use twilight_domain::command::{LightCommand, Selector};
use twilight_domain::error::TwilightError;

/// Sends lighting states to the remote API.
///
/// Every call is authenticated with the bearer `token` taken from the
/// configuration snapshot the caller is working from, so a reload that
/// rotates the token applies to the next call.
pub trait LightingClient: Send + Sync {
    /// Apply one state to `command.selector`.
    fn put_state(
        &self,
        token: &str,
        command: &LightCommand,
    ) -> impl Future<Output = Result<(), TwilightError>> + Send;

    /// Submit an ordered list of states the device plays back on its own.
    ///
    /// Callers check the plan against the remote cap before calling.
    fn post_cycle(
        &self,
        token: &str,
        selector: &Selector,
        states: &[LightCommand],
    ) -> impl Future<Output = Result<(), TwilightError>> + Send;

    /// Flip the power state of `selector`.
    fn toggle(
        &self,
        token: &str,
        selector: &Selector,
    ) -> impl Future<Output = Result<(), TwilightError>> + Send;

    /// Current state of the lights matched by `selector`, as returned by the API.
    fn list_lights(
        &self,
        token: &str,
        selector: &Selector,
    ) -> impl Future<Output = Result<serde_json::Value, TwilightError>> + Send;
}

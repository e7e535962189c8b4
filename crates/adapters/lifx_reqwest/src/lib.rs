//! # twilight-adapter-lifx-reqwest
//!
//! [`LightingClient`] implementation for the LIFX HTTP API, built on
//! `reqwest`.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `put_state` | `PUT {base}/lights/{selector}/state`, form encoded |
//! | `post_cycle` | `POST {base}/lights/{selector}/cycle`, JSON `{"states": [..]}` |
//! | `toggle` | `POST {base}/lights/{selector}/toggle` |
//! | `list_lights` | `GET {base}/lights/{selector}` |
//!
//! Every request carries `Authorization: Bearer <token>`. Any non-2xx answer
//! becomes [`LifxError::Status`] with the response body attached.
//!
//! ## Dependency rule
//!
//! Depends on `twilight-app` (port traits) and `twilight-domain` only.

mod wire;

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, header};

use twilight_app::ports::LightingClient;
use twilight_domain::command::{LightCommand, Selector};
use twilight_domain::error::TwilightError;

use crate::wire::{CycleBody, StateForm};

/// Public LIFX endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.lifx.com/v1";

/// Errors raised while talking to the LIFX API.
#[derive(Debug, thiserror::Error)]
pub enum LifxError {
    #[error("http request failed")]
    Http(#[from] reqwest::Error),
    #[error("lifx api answered {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl From<LifxError> for TwilightError {
    fn from(err: LifxError) -> Self {
        TwilightError::Client(Box::new(err))
    }
}

/// HTTP client for the LIFX API.
#[derive(Clone)]
pub struct LifxClient {
    http: Client,
    base_url: String,
}

impl LifxClient {
    /// Build a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LifxError::Http`] if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LifxError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, selector: &Selector, suffix: &str) -> String {
        format!("{}/lights/{}{suffix}", self.base_url, selector.as_str())
    }

    async fn send(request: RequestBuilder, token: &str) -> Result<Response, LifxError> {
        let response = request
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(LifxError::Status { status, body })
    }

    #[tracing::instrument(skip_all, fields(selector = %command.selector, power = %command.power))]
    async fn send_state(&self, token: &str, command: &LightCommand) -> Result<(), LifxError> {
        let request = self
            .http
            .put(self.url(&command.selector, "/state"))
            .form(&StateForm::from(command));
        Self::send(request, token).await?;
        tracing::debug!(color = %command.color, brightness = command.brightness, "state applied");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(%selector, states = states.len()))]
    async fn send_cycle(
        &self,
        token: &str,
        selector: &Selector,
        states: &[LightCommand],
    ) -> Result<(), LifxError> {
        let request = self
            .http
            .post(self.url(selector, "/cycle"))
            .json(&CycleBody::new(states));
        Self::send(request, token).await?;
        tracing::debug!("cycle submitted");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(%selector))]
    async fn send_toggle(&self, token: &str, selector: &Selector) -> Result<(), LifxError> {
        Self::send(self.http.post(self.url(selector, "/toggle")), token).await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(%selector))]
    async fn fetch_lights(
        &self,
        token: &str,
        selector: &Selector,
    ) -> Result<serde_json::Value, LifxError> {
        let response = Self::send(self.http.get(self.url(selector, "")), token).await?;
        Ok(response.json().await?)
    }
}

impl LightingClient for LifxClient {
    fn put_state(
        &self,
        token: &str,
        command: &LightCommand,
    ) -> impl Future<Output = Result<(), TwilightError>> + Send {
        async move { Ok(self.send_state(token, command).await?) }
    }

    fn post_cycle(
        &self,
        token: &str,
        selector: &Selector,
        states: &[LightCommand],
    ) -> impl Future<Output = Result<(), TwilightError>> + Send {
        async move { Ok(self.send_cycle(token, selector, states).await?) }
    }

    fn toggle(
        &self,
        token: &str,
        selector: &Selector,
    ) -> impl Future<Output = Result<(), TwilightError>> + Send {
        async move { Ok(self.send_toggle(token, selector).await?) }
    }

    fn list_lights(
        &self,
        token: &str,
        selector: &Selector,
    ) -> impl Future<Output = Result<serde_json::Value, TwilightError>> + Send {
        async move { Ok(self.fetch_lights(token, selector).await?) }
    }
}

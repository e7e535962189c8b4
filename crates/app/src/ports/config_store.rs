//! Config store port: where the lighting document lives.

use std::future::Future;

use twilight_domain::config::LightingConfig;
use twilight_domain::error::TwilightError;

/// Loads and stores the `{token, defaultColor, dusk, devices}` document.
pub trait ConfigStore: Send + Sync {
    /// Read the document. Validation is the caller's job.
    ///
    /// Returns [`ConfigError::Missing`](twilight_domain::error::ConfigError::Missing)
    /// (wrapped) when no document exists yet.
    fn load(&self) -> impl Future<Output = Result<LightingConfig, TwilightError>> + Send;

    /// Persist the document, replacing the previous one.
    fn save(
        &self,
        config: &LightingConfig,
    ) -> impl Future<Output = Result<(), TwilightError>> + Send;
}

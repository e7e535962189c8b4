//! # twilight-adapter-config-json
//!
//! [`ConfigStore`] that keeps the lighting document in a JSON file.
//!
//! Writes go to a sibling `*.tmp` file which is then renamed over the
//! document, so a reader never observes a half-written file.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use twilight_app::ports::ConfigStore;
use twilight_domain::config::LightingConfig;
use twilight_domain::error::{ConfigError, TwilightError};

/// Errors raised while reading or writing the document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("cannot access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not a valid lighting document")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ConfigFileError> for TwilightError {
    fn from(err: ConfigFileError) -> Self {
        TwilightError::Storage(Box::new(err))
    }
}

/// Lighting document stored at `path`.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> ConfigFileError {
        ConfigFileError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read(&self) -> Result<LightingConfig, TwilightError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing.into());
            }
            Err(err) => return Err(self.io_error(err).into()),
        };
        let config = serde_json::from_slice(&raw).map_err(|source| ConfigFileError::Json {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "lighting document read");
        Ok(config)
    }

    async fn write(&self, config: &LightingConfig) -> Result<(), ConfigFileError> {
        let json = serde_json::to_vec_pretty(config).map_err(|source| ConfigFileError::Json {
            path: self.path.clone(),
            source,
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, json)
            .await
            .map_err(|err| self.io_error(err))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|err| self.io_error(err))?;
        tracing::info!(path = %self.path.display(), devices = config.devices.len(), "lighting document written");
        Ok(())
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> impl Future<Output = Result<LightingConfig, TwilightError>> + Send {
        self.read()
    }

    fn save(
        &self,
        config: &LightingConfig,
    ) -> impl Future<Output = Result<(), TwilightError>> + Send {
        async move { Ok(self.write(config).await?) }
    }
}

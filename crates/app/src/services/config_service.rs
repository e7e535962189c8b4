//! Config service: owns the immutable lighting snapshot and its reloads.

use std::sync::Arc;

use tokio::sync::watch;

use twilight_domain::command::Selector;
use twilight_domain::config::LightingConfig;
use twilight_domain::error::TwilightError;

use crate::ports::ConfigStore;

/// What changed between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Devices whose running transitions no longer match the configuration.
    pub stale: Vec<Selector>,
    pub devices: usize,
    pub profile_changed: bool,
}

/// Publishes the current [`LightingConfig`] through a [`watch`] channel.
///
/// Readers take an `Arc` snapshot and keep working with it even if a reload
/// happens meanwhile.
pub struct ConfigService<S> {
    store: S,
    tx: watch::Sender<Arc<LightingConfig>>,
}

impl<S: ConfigStore> ConfigService<S> {
    /// Load, validate and publish the first snapshot.
    ///
    /// # Errors
    ///
    /// Returns the store's error or [`TwilightError::Config`] when the
    /// document is invalid. The daemon treats both as fatal.
    pub async fn load(store: S) -> Result<Self, TwilightError> {
        let config = store.load().await?;
        config.validate()?;
        report_warnings(&config);
        tracing::info!(devices = config.devices.len(), "lighting configuration loaded");
        let (tx, _) = watch::channel(Arc::new(config));
        Ok(Self { store, tx })
    }

    /// Start from an already validated snapshot.
    #[must_use]
    pub fn with_snapshot(store: S, config: LightingConfig) -> Self {
        let (tx, _) = watch::channel(Arc::new(config));
        Self { store, tx }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<LightingConfig> {
        Arc::clone(&self.tx.borrow())
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<LightingConfig>> {
        self.tx.subscribe()
    }

    /// Read the document again and swap the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the store's error or [`TwilightError::Config`]; the previous
    /// snapshot stays in place in both cases.
    #[tracing::instrument(skip(self))]
    pub async fn reload(&self) -> Result<ReloadReport, TwilightError> {
        let next = self.store.load().await.inspect_err(|err| {
            tracing::warn!(error = %err, "reload failed, keeping previous configuration");
        })?;
        if let Err(err) = next.validate() {
            tracing::warn!(error = %err, "reloaded configuration is invalid, keeping previous one");
            return Err(err.into());
        }
        report_warnings(&next);

        let previous = self.tx.send_replace(Arc::new(next));
        let report = diff(&previous, &self.snapshot());
        tracing::info!(
            devices = report.devices,
            stale = report.stale.len(),
            profile_changed = report.profile_changed,
            "lighting configuration reloaded"
        );
        Ok(report)
    }

    /// Validate, persist and publish `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TwilightError::Config`] when invalid, or the store's error.
    pub async fn save(&self, config: LightingConfig) -> Result<ReloadReport, TwilightError> {
        config.validate()?;
        self.store.save(&config).await?;
        let previous = self.tx.send_replace(Arc::new(config));
        Ok(diff(&previous, &self.snapshot()))
    }
}

fn report_warnings(config: &LightingConfig) {
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }
}

/// Runs become stale when their device is gone, when the device's own
/// settings moved, or when the shared dusk profile changed.
fn diff(previous: &LightingConfig, next: &LightingConfig) -> ReloadReport {
    let profile_changed = previous.dusk != next.dusk || previous.default_color != next.default_color;
    let stale = previous
        .devices
        .iter()
        .filter(|device| {
            profile_changed
                || next
                    .devices
                    .iter()
                    .find(|d| d.id == device.id)
                    .is_none_or(|d| d != *device)
        })
        .map(|device| device.id.clone())
        .collect();

    ReloadReport {
        stale,
        devices: next.devices.len(),
        profile_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Mutex;
    use twilight_domain::color::Kelvin;
    use twilight_domain::device::DeviceTarget;
    use twilight_domain::dusk::DuskProfile;
    use twilight_domain::error::ConfigError;

    #[derive(Default)]
    struct InMemoryConfigStore {
        document: Mutex<Option<LightingConfig>>,
    }

    impl InMemoryConfigStore {
        fn holding(config: LightingConfig) -> Self {
            Self {
                document: Mutex::new(Some(config)),
            }
        }

        fn replace(&self, config: LightingConfig) {
            *self.document.lock().unwrap() = Some(config);
        }
    }

    impl ConfigStore for InMemoryConfigStore {
        fn load(&self) -> impl Future<Output = Result<LightingConfig, TwilightError>> + Send {
            let result = self
                .document
                .lock()
                .unwrap()
                .clone()
                .ok_or(TwilightError::Config(ConfigError::Missing));
            async { result }
        }

        fn save(
            &self,
            config: &LightingConfig,
        ) -> impl Future<Output = Result<(), TwilightError>> + Send {
            self.replace(config.clone());
            async { Ok(()) }
        }
    }

    fn config() -> LightingConfig {
        LightingConfig {
            token: "c0ffee".to_string(),
            default_color: Kelvin::new(3000),
            dusk: DuskProfile {
                color_start: Kelvin::new(2200),
                color_end: Kelvin::new(4000),
                steps: 8,
                duration_minutes: 40,
                turn_off_jitter_minutes: 10,
            },
            devices: vec![
                DeviceTarget::new(Selector::new("id:1"), "Living").with_coordinates(48.85, 2.35),
                DeviceTarget::new(Selector::new("id:2"), "Kitchen").with_coordinates(48.85, 2.35),
            ],
        }
    }

    #[tokio::test]
    async fn should_fail_when_document_is_missing() {
        let result = ConfigService::load(InMemoryConfigStore::default()).await;
        assert!(matches!(
            result,
            Err(TwilightError::Config(ConfigError::Missing))
        ));
    }

    #[tokio::test]
    async fn should_fail_when_document_is_invalid() {
        let mut invalid = config();
        invalid.token = String::new();
        let result = ConfigService::load(InMemoryConfigStore::holding(invalid)).await;
        assert!(matches!(
            result,
            Err(TwilightError::Config(ConfigError::EmptyToken))
        ));
    }

    #[tokio::test]
    async fn should_keep_previous_snapshot_when_reload_is_invalid() {
        let service = ConfigService::load(InMemoryConfigStore::holding(config()))
            .await
            .unwrap();
        let mut broken = config();
        broken.dusk.steps = 0;
        service.store.replace(broken);

        assert!(service.reload().await.is_err());
        assert_eq!(service.snapshot().dusk.steps, 8);
    }

    #[tokio::test]
    async fn should_publish_new_snapshot_to_subscribers_when_reloaded() {
        let service = ConfigService::load(InMemoryConfigStore::holding(config()))
            .await
            .unwrap();
        let mut rx = service.subscribe();
        let held = service.snapshot();

        let mut next = config();
        next.devices.pop();
        service.store.replace(next);
        let report = service.reload().await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().devices.len(), 1);
        assert_eq!(held.devices.len(), 2);
        assert_eq!(report.stale, vec![Selector::new("id:2")]);
        assert!(!report.profile_changed);
    }

    #[tokio::test]
    async fn should_mark_every_device_stale_when_profile_changes() {
        let service = ConfigService::load(InMemoryConfigStore::holding(config()))
            .await
            .unwrap();
        let mut next = config();
        next.dusk.duration_minutes = 60;
        service.store.replace(next);

        let report = service.reload().await.unwrap();
        assert!(report.profile_changed);
        assert_eq!(report.stale.len(), 2);
    }

    #[tokio::test]
    async fn should_mark_device_stale_when_its_location_moves() {
        let service = ConfigService::load(InMemoryConfigStore::holding(config()))
            .await
            .unwrap();
        let mut next = config();
        next.devices[0] = next.devices[0].clone().with_coordinates(51.5, -0.12);
        service.store.replace(next);

        let report = service.reload().await.unwrap();
        assert_eq!(report.stale, vec![Selector::new("id:1")]);
    }

    #[tokio::test]
    async fn should_persist_and_publish_when_saved() {
        let service = ConfigService::load(InMemoryConfigStore::holding(config()))
            .await
            .unwrap();
        let mut next = config();
        next.token = "rotated".to_string();

        service.save(next).await.unwrap();
        assert_eq!(service.snapshot().token, "rotated");
        assert_eq!(service.store.load().await.unwrap().token, "rotated");
    }
}

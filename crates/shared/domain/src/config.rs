use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level core configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoreConfigInner {
    pub signals: SignalsConfig,
    pub remote: RemoteConfig,
    pub settings: SettingsConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct CoreConfig {
    #[serde(flatten, default)]
    inner: Arc<CoreConfigInner>,
}

impl Deref for CoreConfig {
    type Target = CoreConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for CoreConfig {
    fn deref_mut(&mut self) -> &mut CoreConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Buffer sizes for the cache refresh/clear broadcast channels.
///
/// The signals are fire-and-forget: a slow listener that falls behind the
/// buffer drops old signals rather than stalling publishers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    pub capacity: usize,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self { capacity: 16 }
    }
}

/// Parameters for talking to the remote list endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub page_size: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { page_size: 25 }
    }
}

/// Location of the on-disk settings store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub root: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self { root: PathBuf::from("data/settings") }
    }
}

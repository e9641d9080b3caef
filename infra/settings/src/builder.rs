use crate::error::{SettingsError, SettingsErrorExt};
use crate::store::{Settings, SettingsInner};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::info;

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

/// A type-safe fluent builder for the settings store.
#[allow(private_bounds)]
#[derive(Debug)]
pub struct SettingsBuilder<S: Sealed = NoRoot> {
    state: S,
    create: bool,
}

impl Default for SettingsBuilder<NoRoot> {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBuilder<NoRoot> {
    #[must_use = "Creates a new settings builder with default configuration"]
    pub fn new() -> Self {
        Self { state: NoRoot, create: true }
    }

    #[must_use = "Sets the root directory path for the settings store"]
    pub fn root(self, path: impl Into<PathBuf>) -> SettingsBuilder<WithRoot> {
        SettingsBuilder { state: WithRoot(path.into()), create: self.create }
    }
}

#[allow(private_bounds)]
impl<S: Sealed> SettingsBuilder<S> {
    #[must_use = "Sets whether the store root should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.create = enable;
        self
    }
}

impl SettingsBuilder<WithRoot> {
    /// Consumes the configuration and opens the store.
    ///
    /// The boot sequence creates the root if `create(true)` was set,
    /// canonicalizes it, and sweeps orphaned temp files left behind by
    /// earlier crashes. The sweep is non-critical: a failure is logged and
    /// initialization proceeds.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] if the root does not exist and `create`
    /// is false, or if the process lacks permissions to create or resolve it.
    pub async fn connect(self) -> Result<Settings, SettingsError> {
        let root = &self.state.0;

        if self.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap settings root: {}", root.display()))?;
            info!(path = %root.display(), "Bootstrapped settings root directory");
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve settings root: {}", root.display()))?;

        let settings = Settings {
            inner: Arc::new(SettingsInner { root: canonical, tmp_counter: AtomicU64::new(1) }),
        };

        settings.purge_tmp().await;

        Ok(settings)
    }
}

use crate::builder::SettingsBuilder;
use crate::error::{SettingsError, SettingsErrorExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const DOC_SUFFIX: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// A validated settings key.
///
/// Keys map one-to-one onto file names inside the store root, so they are
/// restricted to lowercase alphanumerics plus `_`, `-` and `.`, nothing that
/// could climb out of the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingsKey(pub String);

impl TryFrom<&str> for SettingsKey {
    type Error = SettingsError;

    fn try_from(value: &str) -> Result<Self, SettingsError> {
        let key = value.to_lowercase();

        if key.is_empty() {
            return Err(SettingsError::InvalidKey {
                message: "EMPTY".into(),
                context: Some("Settings key cannot be empty".into()),
            });
        }

        if !key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            || key.starts_with('.')
        {
            return Err(SettingsError::InvalidKey {
                message: key.into(),
                context: Some("Settings key contains illegal characters".into()),
            });
        }

        Ok(Self(key))
    }
}

impl TryFrom<String> for SettingsKey {
    type Error = SettingsError;

    fn try_from(value: String) -> Result<Self, SettingsError> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for SettingsKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct SettingsInner {
    /// The canonicalized root directory holding one JSON document per key.
    pub(crate) root: PathBuf,
    /// A unique counter used to generate temporary file names.
    pub(crate) tmp_counter: AtomicU64,
}

/// A thread-safe handle to the settings store.
///
/// One JSON document per key, written atomically (unique temp file + `sync`
/// + `rename`). The handle is internally reference-counted and can be
/// cheaply cloned across threads or tasks.
#[derive(Debug, Clone)]
pub struct Settings {
    pub(crate) inner: Arc<SettingsInner>,
}

impl Settings {
    #[must_use = "The settings store is not opened until you call .connect()"]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Serializes `value` and atomically replaces the document under `key`.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidKey`] for malformed keys,
    /// [`SettingsError::Serde`] if the value cannot be serialized, or
    /// [`SettingsError::Io`] on filesystem failures.
    pub async fn put<K, V>(&self, key: K, value: &V) -> Result<(), SettingsError>
    where
        K: TryInto<SettingsKey, Error = SettingsError>,
        V: Serialize + ?Sized,
    {
        let key = key.try_into()?;
        let payload = serde_json::to_vec_pretty(value)
            .context(format!("Failed to serialize settings document '{key}'"))?;

        let target = self.document_path(&key);
        let tmp = self.tmp_path(&key);

        let mut file = fs::File::create(&tmp)
            .await
            .context(format!("Failed to create temp file for '{key}'"))?;
        file.write_all(&payload).await.context(format!("Failed to write '{key}'"))?;
        file.sync_all().await.context(format!("Failed to sync '{key}'"))?;
        drop(file);

        // Atomic swap: the document is either the old version or the new one.
        fs::rename(&tmp, &target).await.context(format!("Failed to publish '{key}'"))?;

        debug!(key = %key, bytes = payload.len(), "Settings document written");
        Ok(())
    }

    /// Reads and deserializes the document under `key`.
    ///
    /// Returns `Ok(None)` if the key was never written.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidKey`] for malformed keys,
    /// [`SettingsError::Serde`] if the stored document does not match `V`, or
    /// [`SettingsError::Io`] on filesystem failures.
    pub async fn get<K, V>(&self, key: K) -> Result<Option<V>, SettingsError>
    where
        K: TryInto<SettingsKey, Error = SettingsError>,
        V: DeserializeOwned,
    {
        let key = key.try_into()?;
        let target = self.document_path(&key);

        let raw = match fs::read(&target).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).context(format!("Failed to read settings document '{key}'"));
            },
        };

        let value = serde_json::from_slice(&raw)
            .context(format!("Failed to parse settings document '{key}'"))?;
        Ok(Some(value))
    }

    /// Removes the document under `key`. Returns whether it existed.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidKey`] for malformed keys or
    /// [`SettingsError::Io`] on filesystem failures.
    pub async fn remove<K>(&self, key: K) -> Result<bool, SettingsError>
    where
        K: TryInto<SettingsKey, Error = SettingsError>,
    {
        let key = key.try_into()?;
        let target = self.document_path(&key);

        match fs::remove_file(&target).await {
            Ok(()) => {
                debug!(key = %key, "Settings document removed");
                Ok(true)
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).context(format!("Failed to remove settings document '{key}'")),
        }
    }

    /// Whether a document exists under `key`.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidKey`] for malformed keys.
    pub async fn contains<K>(&self, key: K) -> Result<bool, SettingsError>
    where
        K: TryInto<SettingsKey, Error = SettingsError>,
    {
        let key = key.try_into()?;
        Ok(fs::try_exists(self.document_path(&key)).await.unwrap_or(false))
    }

    /// Lists every stored key, in no particular order.
    ///
    /// # Errors
    /// Returns [`SettingsError::Io`] if the root cannot be read.
    pub async fn keys(&self) -> Result<Vec<String>, SettingsError> {
        let mut entries =
            fs::read_dir(&self.inner.root).await.context("Failed to read settings root")?;

        let mut keys = Vec::new();
        while let Some(entry) =
            entries.next_entry().await.context("Failed to iterate settings root")?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOC_SUFFIX) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_owned());
            }
        }
        Ok(keys)
    }

    /// Removes orphaned temp files left behind by earlier crashes.
    /// Non-critical: failures are logged and ignored.
    pub(crate) async fn purge_tmp(&self) {
        let Ok(mut entries) = fs::read_dir(&self.inner.root).await else {
            warn!(root = %self.inner.root.display(), "Temp sweep skipped: unreadable root");
            return;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(TMP_SUFFIX) {
                continue;
            }
            if let Err(err) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %err, "Failed to sweep orphaned temp file");
            } else {
                debug!(path = %path.display(), "Swept orphaned temp file");
            }
        }
    }

    fn document_path(&self, key: &SettingsKey) -> PathBuf {
        self.inner.root.join(format!("{key}.{DOC_SUFFIX}"))
    }

    fn tmp_path(&self, key: &SettingsKey) -> PathBuf {
        let nonce = self.inner.tmp_counter.fetch_add(1, Ordering::Relaxed);
        self.inner.root.join(format!("{key}.{nonce}.{TMP_SUFFIX}"))
    }
}

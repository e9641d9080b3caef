use crate::error::DashboardError;
use crate::model::{DashboardFilter, FilterQuery, FilterSelection};
use lhub_domain::config::SignalsConfig;
use lhub_repository::{EntityCache, FetchFuture, RepositoryError};
use lhub_settings::Settings;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::debug;

type FetchOne = Arc<dyn Fn(String) -> FetchFuture<DashboardFilter> + Send + Sync>;
type FetchList = Arc<dyn Fn(FilterQuery) -> FetchFuture<Vec<DashboardFilter>> + Send + Sync>;

/// The two remote filter endpoints, injected at construction.
///
/// Unlike the product catalog, the filter listing arrives as a flat array;
/// there is no pagination envelope to unwrap.
#[derive(Clone)]
pub struct FilterClient {
    fetch_one: FetchOne,
    fetch_list: FetchList,
}

impl FilterClient {
    pub fn new<F1, F2>(fetch_one: F1, fetch_list: F2) -> Self
    where
        F1: Fn(String) -> FetchFuture<DashboardFilter> + Send + Sync + 'static,
        F2: Fn(FilterQuery) -> FetchFuture<Vec<DashboardFilter>> + Send + Sync + 'static,
    {
        Self { fetch_one: Arc::new(fetch_one), fetch_list: Arc::new(fetch_list) }
    }
}

impl fmt::Debug for FilterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterClient").finish_non_exhaustive()
    }
}

/// Caching repository facade over the dashboard filters of one surface.
///
/// Several instances coexist behind the same interface, each registered
/// under its own locator instance name and persisting its selected filter
/// under its own `storage_key`, so two dashboards never trample each
/// other's selection.
#[derive(Debug, Clone)]
pub struct FilterRepository {
    cache: EntityCache<DashboardFilter, FilterQuery>,
    settings: Settings,
    storage_key: Cow<'static, str>,
}

impl FilterRepository {
    #[must_use]
    pub fn with_client(
        config: &SignalsConfig,
        settings: Settings,
        storage_key: impl Into<Cow<'static, str>>,
        client: FilterClient,
    ) -> Self {
        let FilterClient { fetch_one, fetch_list } = client;
        let cache = EntityCache::new(
            config,
            move |id| fetch_one(id),
            move |query| fetch_list(query),
        );
        Self { cache, settings, storage_key: storage_key.into() }
    }

    /// Best-effort cached read; a miss warms the cache in the background.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn filter(&self, id: &str) -> Result<Option<DashboardFilter>, RepositoryError> {
        self.cache.cached(&id.to_owned())
    }

    /// Authoritative fetch of one filter, deduplicated per id.
    ///
    /// # Errors
    /// Remote `NotFound`/`Transport` errors pass through unchanged.
    pub async fn fetch_filter(&self, id: &str) -> Result<DashboardFilter, RepositoryError> {
        self.cache.get(id.to_owned()).await
    }

    /// Authoritative list fetch; every filter is merged into the cache.
    ///
    /// # Errors
    /// Remote errors pass through unchanged.
    pub async fn filters(
        &self,
        query: FilterQuery,
    ) -> Result<Vec<DashboardFilter>, RepositoryError> {
        self.cache.get_list(query).await
    }

    /// Watches one filter id: replay-one, then every update.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn watch_filter(
        &self,
        id: &str,
    ) -> Result<watch::Receiver<Option<DashboardFilter>>, RepositoryError> {
        self.cache.subscribe(&id.to_owned())
    }

    /// Persists `id` as this surface's selected filter and signals a refresh
    /// so list consumers re-pull.
    ///
    /// # Errors
    /// Surfaces settings-store failures; the refresh is best-effort on top.
    pub async fn select(&self, id: &str) -> Result<(), DashboardError> {
        self.settings
            .put(self.storage_key.as_ref(), &FilterSelection { filter_id: id.to_owned() })
            .await?;
        debug!(surface = %self.storage_key, filter = id, "Filter selection persisted");
        self.cache.refresh(Some(id.to_owned()))?;
        Ok(())
    }

    /// Reads back this surface's persisted selection, if any.
    ///
    /// # Errors
    /// Surfaces settings-store failures.
    pub async fn selected(&self) -> Result<Option<FilterSelection>, DashboardError> {
        Ok(self.settings.get(self.storage_key.as_ref()).await?)
    }

    /// Drops the persisted selection. Returns whether one existed.
    ///
    /// # Errors
    /// Surfaces settings-store failures.
    pub async fn clear_selection(&self) -> Result<bool, DashboardError> {
        Ok(self.settings.remove(self.storage_key.as_ref()).await?)
    }

    /// Warm-up: loads the persisted selection and eagerly fetches that
    /// filter into the cache. Used as the locator init hook.
    ///
    /// # Errors
    /// Surfaces settings-store failures and fetch failures.
    pub async fn load_selection(&self) -> Result<Option<DashboardFilter>, DashboardError> {
        let Some(selection) =
            self.settings.get::<_, FilterSelection>(self.storage_key.as_ref()).await?
        else {
            return Ok(None);
        };

        debug!(surface = %self.storage_key, filter = %selection.filter_id, "Warming selected filter");
        let filter = self.cache.get(selection.filter_id).await?;
        Ok(Some(filter))
    }

    /// Signals list-level consumers to re-pull; with an id, eagerly
    /// repopulates that row.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn refresh(&self, id: Option<String>) -> Result<(), RepositoryError> {
        self.cache.refresh(id)
    }

    /// Drops every cached filter; subscriber channels stay open. The
    /// persisted selection is untouched.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn clear(&self) -> Result<(), RepositoryError> {
        self.cache.clear()
    }

    /// Terminal teardown of the underlying cache.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] if already disposed.
    pub fn dispose(&self) -> Result<(), RepositoryError> {
        self.cache.dispose()
    }

    /// Subscribes to the refresh broadcast.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn on_refresh(&self) -> Result<broadcast::Receiver<Option<String>>, RepositoryError> {
        self.cache.on_refresh()
    }

    /// Subscribes to the clear broadcast.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn on_clear(&self) -> Result<broadcast::Receiver<()>, RepositoryError> {
        self.cache.on_clear()
    }
}

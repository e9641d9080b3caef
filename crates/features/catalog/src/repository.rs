use crate::model::{Product, ProductQuery};
use lhub_domain::config::SignalsConfig;
use lhub_domain::page::Page;
use lhub_repository::{EntityCache, FetchFuture, RepositoryError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

type FetchOne = Arc<dyn Fn(u64) -> FetchFuture<Product> + Send + Sync>;
type FetchPage = Arc<dyn Fn(ProductQuery) -> FetchFuture<Page<Product>> + Send + Sync>;

/// The two remote catalog endpoints, injected at construction so tests can
/// substitute them directly.
#[derive(Clone)]
pub struct ProductClient {
    fetch_one: FetchOne,
    fetch_page: FetchPage,
}

impl ProductClient {
    pub fn new<F1, F2>(fetch_one: F1, fetch_page: F2) -> Self
    where
        F1: Fn(u64) -> FetchFuture<Product> + Send + Sync + 'static,
        F2: Fn(ProductQuery) -> FetchFuture<Page<Product>> + Send + Sync + 'static,
    {
        Self { fetch_one: Arc::new(fetch_one), fetch_page: Arc::new(fetch_page) }
    }
}

impl fmt::Debug for ProductClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductClient").finish_non_exhaustive()
    }
}

/// Caching repository facade over the remote product catalog.
///
/// A thin composition: every method delegates to the entity cache, and the
/// facade's only added responsibility is unwrapping the remote's pagination
/// envelope into the flat item list the cache expects. No state lives here
/// beyond what the cache owns.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    cache: EntityCache<Product, ProductQuery>,
}

impl ProductRepository {
    #[must_use]
    pub fn with_client(config: &SignalsConfig, client: ProductClient) -> Self {
        let ProductClient { fetch_one, fetch_page } = client;
        let cache = EntityCache::new(
            config,
            move |id| fetch_one(id),
            move |query| {
                let fetch_page = Arc::clone(&fetch_page);
                Box::pin(async move {
                    let page = fetch_page(query).await?;
                    Ok(page.list)
                })
            },
        );
        Self { cache }
    }

    /// Best-effort cached read; a miss warms the cache in the background.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn product(&self, id: u64) -> Result<Option<Product>, RepositoryError> {
        self.cache.cached(&id)
    }

    /// Authoritative fetch of one product, deduplicated per id.
    ///
    /// # Errors
    /// Remote `NotFound`/`Transport` errors pass through unchanged.
    pub async fn fetch_product(&self, id: u64) -> Result<Product, RepositoryError> {
        self.cache.get(id).await
    }

    /// Authoritative page fetch; every returned product is merged into the
    /// cache and published to its subscribers.
    ///
    /// # Errors
    /// Remote errors pass through unchanged.
    pub async fn products(&self, query: ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        self.cache.get_list(query).await
    }

    /// Watches one product id: replay-one, then every update.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn watch_product(
        &self,
        id: u64,
    ) -> Result<watch::Receiver<Option<Product>>, RepositoryError> {
        self.cache.subscribe(&id)
    }

    /// Signals list-level consumers to re-pull; with an id, eagerly
    /// repopulates that row.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn refresh(&self, id: Option<u64>) -> Result<(), RepositoryError> {
        self.cache.refresh(id)
    }

    /// Drops every cached product; subscriber channels stay open.
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
    pub fn on_refresh(&self) -> Result<broadcast::Receiver<Option<u64>>, RepositoryError> {
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

use crate::error::RepositoryError;
use crate::merge::Absorb;
use crate::signals::CacheSignals;
use crate::single_flight::SingleFlight;
use fxhash::FxHashMap;
use lhub_domain::config::SignalsConfig;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace};

/// The future shape both remote-fetch collaborators return.
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send>>;

type FetchOne<T> = Arc<dyn Fn(<T as Absorb>::Key) -> FetchFuture<T> + Send + Sync>;
type FetchList<T, Q> = Arc<dyn Fn(Q) -> FetchFuture<Vec<T>> + Send + Sync>;

/// One cached entity: the watch channel is the value slot, so subscribing
/// replays the current value and every accepted update is pushed.
struct Entry<T> {
    slot: watch::Sender<Option<T>>,
    version: u64,
}

impl<T> Entry<T> {
    fn vacant() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot, version: 0 }
    }
}

struct CacheShared<T: Absorb, Q> {
    entries: RwLock<FxHashMap<T::Key, Entry<T>>>,
    flights: Mutex<FxHashMap<T::Key, Arc<SingleFlight<T>>>>,
    signals: RwLock<Option<CacheSignals<T::Key>>>,
    fetch_one: FetchOne<T>,
    fetch_list: FetchList<T, Q>,
    disposed: AtomicBool,
}

/// A per-entity reactive cache.
///
/// Keyed by entity id and fed by two injected remote closures: a fetch-one
/// for single records and a fetch-list for bulk queries. Single-record
/// fetches are routed through a per-id [`SingleFlight`] so concurrent
/// requests collapse into one remote call; every accepted result is folded
/// into the cached record via [`Absorb`] and republished to subscribers.
///
/// The handle is internally reference-counted and can be cheaply cloned
/// across tasks. `dispose` is terminal: any call after it fails fast with
/// [`RepositoryError::Disposed`].
pub struct EntityCache<T: Absorb, Q> {
    shared: Arc<CacheShared<T, Q>>,
}

impl<T: Absorb, Q> Clone for EntityCache<T, Q> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T, Q> EntityCache<T, Q>
where
    T: Absorb,
    Q: Send + 'static,
{
    pub fn new<F1, F2>(config: &SignalsConfig, fetch_one: F1, fetch_list: F2) -> Self
    where
        F1: Fn(T::Key) -> FetchFuture<T> + Send + Sync + 'static,
        F2: Fn(Q) -> FetchFuture<Vec<T>> + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(CacheShared {
                entries: RwLock::new(FxHashMap::default()),
                flights: Mutex::new(FxHashMap::default()),
                signals: RwLock::new(Some(CacheSignals::new(config.capacity))),
                fetch_one: Arc::new(fetch_one),
                fetch_list: Arc::new(fetch_list),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Synchronous best-effort read of whatever is currently cached.
    ///
    /// A miss opportunistically spawns a background [`EntityCache::get`] so a
    /// subsequent read is warm; failures of that background fetch are logged,
    /// never surfaced here.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn cached(&self, key: &T::Key) -> Result<Option<T>, RepositoryError> {
        self.ensure_live()?;
        let value = {
            let entries = self.shared.entries.read();
            entries.get(key).and_then(|entry| entry.slot.borrow().clone())
        };
        if value.is_none() {
            trace!(key = ?key, "Cache miss, warming in the background");
            self.spawn_background_get(key.clone(), "cache miss");
        }
        Ok(value)
    }

    /// Version of the currently cached record, incremented on every accepted
    /// update. `None` if nothing is cached for the id.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn version(&self, key: &T::Key) -> Result<Option<u64>, RepositoryError> {
        self.ensure_live()?;
        let entries = self.shared.entries.read();
        Ok(entries
            .get(key)
            .filter(|entry| entry.slot.borrow().is_some())
            .map(|entry| entry.version))
    }

    /// Authoritative fetch of one entity.
    ///
    /// Routed through the per-id [`SingleFlight`]; the flight's operation
    /// performs both the remote call and the merge-publish step, so a
    /// deduplicated result is merged exactly once no matter how many callers
    /// joined. On failure the cache is left untouched.
    ///
    /// # Errors
    /// `NotFound`/`Transport` from the remote pass through unchanged;
    /// `Cancelled` if the flight was invalidated; `Disposed` after
    /// `dispose()`.
    pub async fn get(&self, key: T::Key) -> Result<T, RepositoryError> {
        self.ensure_live()?;
        let flight = {
            let mut flights = self.shared.flights.lock();
            Arc::clone(flights.entry(key.clone()).or_default())
        };

        let shared = Arc::clone(&self.shared);
        flight
            .fetch(async move {
                let fetched = (shared.fetch_one)(key).await?;
                Ok(shared.apply_update(fetched))
            })
            .await
    }

    /// Authoritative bulk fetch.
    ///
    /// Each returned item is merged into the cache and published exactly as
    /// in [`EntityCache::get`]. Bulk queries are not routed through the
    /// per-id deduplication; callers dedup them if they need to.
    ///
    /// # Errors
    /// Remote errors pass through unchanged; `Disposed` after `dispose()`.
    pub async fn get_list(&self, query: Q) -> Result<Vec<T>, RepositoryError> {
        self.ensure_live()?;
        let fetched = (self.shared.fetch_list)(query).await?;
        debug!(count = fetched.len(), "List fetched, merging into cache");
        Ok(fetched.into_iter().map(|item| self.shared.apply_update(item)).collect())
    }

    /// Subscribes to one entity id.
    ///
    /// The returned watch receiver replays the current cached value (or
    /// `None` if nothing is cached yet) immediately via `borrow`, then
    /// observes every later update. Dropping the receiver never evicts the
    /// cached value.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn subscribe(&self, key: &T::Key) -> Result<watch::Receiver<Option<T>>, RepositoryError> {
        self.ensure_live()?;
        let mut entries = self.shared.entries.write();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::vacant);
        Ok(entry.slot.subscribe())
    }

    /// Emits a refresh signal; with an identity, additionally spawns an eager
    /// repopulation of that id.
    ///
    /// This models "the list changed, re-pull this row" without forcing a
    /// full list refetch.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn refresh(&self, identity: Option<T::Key>) -> Result<(), RepositoryError> {
        self.ensure_live()?;
        {
            let signals = self.shared.signals.read();
            if let Some(signals) = signals.as_ref() {
                signals.emit_refresh(identity.clone());
            }
        }
        if let Some(key) = identity {
            self.spawn_background_get(key, "refresh");
        }
        Ok(())
    }

    /// Drops every cached value and version, invalidates every per-id
    /// flight, and emits the clear signal.
    ///
    /// Subscriber channels stay open (still-listening consumers observe
    /// `None`); entries nobody subscribes to are pruned outright.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn clear(&self) -> Result<(), RepositoryError> {
        self.ensure_live()?;
        {
            let mut flights = self.shared.flights.lock();
            for flight in flights.values() {
                flight.invalidate();
            }
            flights.clear();
        }
        {
            let mut entries = self.shared.entries.write();
            entries.retain(|_, entry| {
                if entry.slot.receiver_count() == 0 {
                    return false;
                }
                entry.version = 0;
                entry.slot.send_replace(None);
                true
            });
        }
        {
            let signals = self.shared.signals.read();
            if let Some(signals) = signals.as_ref() {
                signals.emit_clear();
            }
        }
        debug!("Entity cache cleared");
        Ok(())
    }

    /// Terminal teardown: closes every subscriber channel and both broadcast
    /// channels, then drops the cache contents. Any later call on this cache
    /// fails fast with [`RepositoryError::Disposed`].
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] if already disposed.
    pub fn dispose(&self) -> Result<(), RepositoryError> {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return Err(disposed());
        }
        {
            let mut flights = self.shared.flights.lock();
            for flight in flights.values() {
                flight.invalidate();
            }
            flights.clear();
        }
        // Dropping the senders closes every subscriber channel.
        self.shared.entries.write().clear();
        // Dropping the signal senders closes both broadcast channels.
        self.shared.signals.write().take();
        debug!("Entity cache disposed");
        Ok(())
    }

    /// Subscribes to the refresh broadcast.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn on_refresh(&self) -> Result<broadcast::Receiver<Option<T::Key>>, RepositoryError> {
        self.ensure_live()?;
        let signals = self.shared.signals.read();
        signals.as_ref().map(CacheSignals::subscribe_refresh).ok_or_else(disposed)
    }

    /// Subscribes to the clear broadcast.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Disposed`] after `dispose()`.
    pub fn on_clear(&self) -> Result<broadcast::Receiver<()>, RepositoryError> {
        self.ensure_live()?;
        let signals = self.shared.signals.read();
        signals.as_ref().map(CacheSignals::subscribe_clear).ok_or_else(disposed)
    }

    fn ensure_live(&self) -> Result<(), RepositoryError> {
        if self.shared.disposed.load(Ordering::Acquire) {
            return Err(disposed());
        }
        Ok(())
    }

    fn spawn_background_get(&self, key: T::Key, reason: &'static str) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            trace!(reason, "Background fetch skipped: no tokio runtime");
            return;
        };
        let cache = self.clone();
        handle.spawn(async move {
            if let Err(err) = cache.get(key).await {
                debug!(error = %err, reason, "Background fetch failed");
            }
        });
    }
}

impl<T: Absorb, Q> CacheShared<T, Q> {
    /// Folds an accepted remote result into the cache and publishes it.
    ///
    /// Runs under one write lock so subscriber observation order per id
    /// matches merge order. Returns the post-merge record.
    fn apply_update(&self, update: T) -> T {
        if self.disposed.load(Ordering::Acquire) {
            // A fetch settling during teardown must not repopulate the map.
            trace!("Discarding fetch result: cache disposed");
            return update;
        }

        let key = update.key();
        let mut entries = self.entries.write();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::vacant);
        let merged = match entry.slot.borrow().clone() {
            Some(mut current) => {
                current.absorb(update);
                current
            },
            None => update,
        };
        entry.version += 1;
        trace!(key = ?key, version = entry.version, "Entity updated");
        entry.slot.send_replace(Some(merged.clone()));
        merged
    }
}

impl<T: Absorb, Q> fmt::Debug for EntityCache<T, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCache")
            .field("entries", &self.shared.entries.read().len())
            .field("disposed", &self.shared.disposed.load(Ordering::Relaxed))
            .finish()
    }
}

fn disposed() -> RepositoryError {
    RepositoryError::Disposed { message: "entity cache is disposed".into(), context: None }
}

use tokio::sync::broadcast;
use tracing::trace;

/// List-level "re-pull" and "drop everything" notifications.
///
/// Fire-and-forget: there is no buffering promise beyond the channel
/// capacity, and a laggard subscriber loses old signals rather than stalling
/// publishers. Signals carry no payload guarantees; consumers re-pull
/// through the cache instead of trusting the event.
pub(crate) struct CacheSignals<K> {
    refresh: broadcast::Sender<Option<K>>,
    clear: broadcast::Sender<()>,
}

impl<K: Clone + Send + 'static> CacheSignals<K> {
    pub(crate) fn new(capacity: usize) -> Self {
        let (refresh, _) = broadcast::channel(capacity.max(1));
        let (clear, _) = broadcast::channel(capacity.max(1));
        Self { refresh, clear }
    }

    pub(crate) fn subscribe_refresh(&self) -> broadcast::Receiver<Option<K>> {
        self.refresh.subscribe()
    }

    pub(crate) fn subscribe_clear(&self) -> broadcast::Receiver<()> {
        self.clear.subscribe()
    }

    pub(crate) fn emit_refresh(&self, identity: Option<K>) {
        match self.refresh.send(identity) {
            Ok(count) => trace!(count, "Refresh signal dispatched"),
            Err(_) => trace!("Refresh signal dropped: no active subscribers"),
        }
    }

    pub(crate) fn emit_clear(&self) {
        match self.clear.send(()) {
            Ok(count) => trace!(count, "Clear signal dispatched"),
            Err(_) => trace!("Clear signal dropped: no active subscribers"),
        }
    }
}

impl<K> std::fmt::Debug for CacheSignals<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSignals")
            .field("refresh_subscribers", &self.refresh.receiver_count())
            .field("clear_subscribers", &self.clear.receiver_count())
            .finish()
    }
}

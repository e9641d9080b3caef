use crate::error::RepositoryError;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

type Outcome<T> = Option<Result<T, RepositoryError>>;

/// Collapses concurrent fetches for one logical key into a single in-flight
/// operation.
///
/// One instance is scoped to exactly one key (one entity id); the cache keeps
/// a map of them. The first caller starts the operation, everyone arriving
/// before it settles joins the same flight and receives a clone of the same
/// result. A failed operation is delivered to every waiter and never cached,
/// so the next `fetch` retries.
///
/// `invalidate` performs real cancellation: the operation future is dropped
/// mid-flight and joined waiters observe [`RepositoryError::Cancelled`]. The
/// next `fetch` always starts fresh.
pub struct SingleFlight<T> {
    state: Arc<Mutex<FlightSlot<T>>>,
}

struct FlightSlot<T> {
    current: Option<Flight<T>>,
    seq: u64,
}

struct Flight<T> {
    outcome: watch::Receiver<Outcome<T>>,
    token: CancellationToken,
    id: u64,
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(FlightSlot { current: None, seq: 0 })) }
    }

    /// Runs `op`, or joins the operation already in flight.
    ///
    /// The operation is spawned as its own task so that a caller dropping its
    /// `fetch` future never tears the shared flight down with it.
    ///
    /// # Errors
    /// Propagates the operation's error to every joined caller, or returns
    /// [`RepositoryError::Cancelled`] if the flight was invalidated first.
    pub async fn fetch<F>(&self, op: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>> + Send + 'static,
    {
        let mut outcome = {
            let mut slot = self.state.lock();
            if let Some(flight) = &slot.current {
                trace!(flight = flight.id, "Joining in-flight fetch");
                flight.outcome.clone()
            } else {
                slot.seq += 1;
                let id = slot.seq;
                let (tx, rx) = watch::channel(None);
                let token = CancellationToken::new();
                slot.current = Some(Flight { outcome: rx.clone(), token: token.clone(), id });
                trace!(flight = id, "Starting fetch");

                let state = Arc::clone(&self.state);
                tokio::spawn(async move {
                    tokio::select! {
                        () = token.cancelled() => {
                            // Dropping `tx` without a send closes the channel;
                            // waiters map that to `Cancelled`.
                            trace!(flight = id, "Fetch cancelled, result discarded");
                        }
                        result = op => {
                            // Clear the slot before publishing so late callers
                            // start a fresh flight instead of reading a settled one.
                            {
                                let mut slot = state.lock();
                                if slot.current.as_ref().is_some_and(|flight| flight.id == id) {
                                    slot.current = None;
                                }
                            }
                            let _ = tx.send(Some(result));
                        }
                    }
                });
                rx
            }
        };

        loop {
            if let Some(result) = outcome.borrow_and_update().clone() {
                return result;
            }
            if outcome.changed().await.is_err() {
                return Err(RepositoryError::Cancelled {
                    message: "fetch invalidated before completion".into(),
                    context: None,
                });
            }
        }
    }

    /// Cancels the in-flight operation, if any, and clears the slot.
    ///
    /// The next `fetch` starts a fresh operation regardless of what was in
    /// flight before.
    pub fn invalidate(&self) {
        let mut slot = self.state.lock();
        if let Some(flight) = slot.current.take() {
            debug!(flight = flight.id, "Invalidating in-flight fetch");
            flight.token.cancel();
        }
    }

    /// Whether an operation is currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.state.lock().current.is_some()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.state.lock();
        f.debug_struct("SingleFlight")
            .field("in_flight", &slot.current.is_some())
            .field("seq", &slot.seq)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    fn gated_op(
        gate: &Arc<Semaphore>,
        calls: &Arc<AtomicUsize>,
        result: Result<u32, RepositoryError>,
    ) -> impl Future<Output = Result<u32, RepositoryError>> + Send + 'static {
        let gate = Arc::clone(gate);
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
            result
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_operation() {
        let flight = SingleFlight::new();
        let gate = Arc::new(Semaphore::new(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = flight.fetch(gated_op(&gate, &calls, Ok(41)));
        let second = flight.fetch(gated_op(&gate, &calls, Ok(42)));
        gate.add_permits(1);

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a.unwrap(), 41, "both callers see the first operation's result");
        assert_eq!(b.unwrap(), 41);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "exactly one underlying call");
    }

    #[tokio::test]
    async fn failure_is_shared_and_not_cached() {
        let flight = SingleFlight::new();
        let gate = Arc::new(Semaphore::new(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = gated_op(
            &gate,
            &calls,
            Err(RepositoryError::Transport { message: "503".into(), context: None }),
        );
        let first = flight.fetch(failing);
        let second = flight.fetch(gated_op(&gate, &calls, Ok(1)));
        gate.add_permits(1);

        let (a, b) = tokio::join!(first, second);
        assert!(matches!(a, Err(RepositoryError::Transport { .. })));
        assert!(matches!(b, Err(RepositoryError::Transport { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The failure was not cached: the next fetch runs a fresh operation.
        gate.add_permits(1);
        let retried = flight.fetch(gated_op(&gate, &calls, Ok(7))).await;
        assert_eq!(retried.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_cancels_waiters_and_allows_a_fresh_fetch() {
        let flight = Arc::new(SingleFlight::new());
        let gate = Arc::new(Semaphore::new(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let stale = tokio::spawn({
            let flight = Arc::clone(&flight);
            let op = gated_op(&gate, &calls, Ok(1));
            async move { flight.fetch(op).await }
        });
        // Let the flight start before cancelling it.
        while !flight.in_flight() {
            tokio::task::yield_now().await;
        }

        flight.invalidate();
        assert!(!flight.in_flight());

        let cancelled = stale.await.unwrap();
        assert!(matches!(cancelled, Err(RepositoryError::Cancelled { .. })));

        gate.add_permits(1);
        let fresh = flight.fetch(gated_op(&gate, &calls, Ok(2))).await;
        assert_eq!(fresh.unwrap(), 2);
    }

    #[tokio::test]
    async fn invalidate_without_flight_is_a_no_op() {
        let flight: SingleFlight<u32> = SingleFlight::new();
        flight.invalidate();
        assert!(!flight.in_flight());
    }

    #[tokio::test]
    async fn settled_flight_is_cleared() {
        let flight = SingleFlight::new();
        let result = flight.fetch(async { Ok(9) }).await;
        assert_eq!(result.unwrap(), 9);
        assert!(!flight.in_flight());
    }
}

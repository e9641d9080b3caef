#![allow(dead_code)] // Not every test binary exercises every fixture.

use lhub_repository::{Absorb, FetchFuture, RepositoryError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// A partially-populated invoice: list endpoints fill some fields, the
/// detail endpoint fills others.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invoice {
    pub id: u64,
    pub number: Option<String>,
    pub total_cents: Option<i64>,
    pub customer: Option<String>,
}

impl Invoice {
    pub fn bare(id: u64) -> Self {
        Self { id, number: None, total_cents: None, customer: None }
    }

    pub fn numbered(id: u64, number: &str) -> Self {
        Self { number: Some(number.to_owned()), ..Self::bare(id) }
    }

    pub fn totalled(id: u64, total_cents: i64) -> Self {
        Self { total_cents: Some(total_cents), ..Self::bare(id) }
    }
}

impl Absorb for Invoice {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }

    fn absorb(&mut self, update: Self) {
        self.id = update.id;
        if update.number.is_some() {
            self.number = update.number;
        }
        if update.total_cents.is_some() {
            self.total_cents = update.total_cents;
        }
        if update.customer.is_some() {
            self.customer = update.customer;
        }
    }
}

/// Scripted remote endpoint: hands out pre-seeded responses in order and
/// counts calls. Optionally gated so a test can hold a call in flight.
pub struct ScriptedRemote {
    responses: Mutex<VecDeque<Result<Invoice, RepositoryError>>>,
    calls: AtomicUsize,
    gate: Semaphore,
    gated: bool,
}

impl ScriptedRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            gated: false,
        })
    }

    /// A remote whose calls block until [`ScriptedRemote::open`] releases them.
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            gated: true,
        })
    }

    pub fn push(&self, response: Result<Invoice, RepositoryError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Releases exactly one gated call.
    pub fn open(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The fetch-one collaborator handed to the cache.
    ///
    /// The scripted response is taken *before* the gate so that a call
    /// cancelled mid-flight has already consumed its response.
    pub fn fetch_one(self: Arc<Self>) -> impl Fn(u64) -> FetchFuture<Invoice> + Send + Sync {
        let remote = self;
        move |id| {
            let remote = Arc::clone(&remote);
            Box::pin(async move {
                remote.calls.fetch_add(1, Ordering::SeqCst);
                let response = remote.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
                    Err(RepositoryError::NotFound {
                        message: format!("invoice {id}").into(),
                        context: None,
                    })
                });
                if remote.gated {
                    let permit = remote.gate.acquire().await.map_err(|_| {
                        RepositoryError::Transport { message: "gate closed".into(), context: None }
                    })?;
                    permit.forget();
                }
                response
            })
        }
    }
}

/// A fetch-list collaborator that returns the same items on every call.
pub fn fixed_list(
    items: Vec<Invoice>,
) -> impl Fn(lhub_domain::page::PageQuery) -> FetchFuture<Vec<Invoice>> + Send + Sync {
    move |_query| {
        let items = items.clone();
        Box::pin(async move { Ok(items) })
    }
}

/// A fetch-list collaborator for caches that never list.
pub fn no_list() -> impl Fn(lhub_domain::page::PageQuery) -> FetchFuture<Vec<Invoice>> + Send + Sync
{
    |_query| {
        Box::pin(async {
            Err(RepositoryError::Transport { message: "list endpoint unused".into(), context: None })
        })
    }
}

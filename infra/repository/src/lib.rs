//! # Reactive Repository Cache
//!
//! The caching layer behind every repository facade: it deduplicates
//! concurrent fetches for the same entity, merges partially-populated
//! results into one cached record per id, and republishes every accepted
//! update to all interested subscribers.
//!
//! ## Overview
//!
//! * [`SingleFlight`] collapses concurrent fetches for one logical key into a
//!   single in-flight operation; `invalidate` cancels the operation outright.
//! * [`EntityCache`] keeps one record per entity id, fed by injected
//!   remote-fetch closures. Reads are synchronous best-effort; `get` and
//!   `get_list` are authoritative and merge-and-publish their results.
//! * Subscriptions are `tokio::sync::watch` channels: the current value is
//!   replayed immediately, then every later update is pushed.
//! * Two `broadcast` signals (refresh and clear) tell list-level consumers
//!   to re-pull without carrying payload guarantees.
//!
//! # Example
//!
//! ```rust
//! use lhub_domain::config::SignalsConfig;
//! use lhub_repository::{Absorb, EntityCache, RepositoryError};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Customer {
//!     id: u64,
//!     name: Option<String>,
//! }
//!
//! impl Absorb for Customer {
//!     type Key = u64;
//!
//!     fn key(&self) -> u64 {
//!         self.id
//!     }
//!
//!     fn absorb(&mut self, update: Self) {
//!         if update.name.is_some() {
//!             self.name = update.name;
//!         }
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), RepositoryError> {
//! let cache = EntityCache::<Customer, ()>::new(
//!     &SignalsConfig::default(),
//!     |id| Box::pin(async move { Ok(Customer { id, name: Some("Ada".into()) }) }),
//!     |()| Box::pin(async { Ok(Vec::new()) }),
//! );
//!
//! let fetched = cache.get(7).await?;
//! assert_eq!(cache.cached(&7)?, Some(fetched));
//! # Ok(())
//! # }
//! ```

mod cache;
mod error;
mod merge;
mod signals;
mod single_flight;

pub use cache::{EntityCache, FetchFuture};
pub use error::{RepositoryError, RepositoryErrorExt};
pub use merge::Absorb;
pub use single_flight::SingleFlight;

use std::fmt;
use std::hash::Hash;

/// Shallow merge for partially-populated entities.
///
/// Partial objects arrive from different endpoints (a summary list endpoint
/// vs. a detail endpoint) and must not clobber fields the other endpoint
/// already populated. `absorb` folds an update into the cached record:
/// populated fields overwrite, absent fields keep their prior values.
///
/// Merging is *shallow* on purpose: an updated `Some` value replaces the
/// previous one wholesale, nested structures included. A stale nested object
/// inside a kept field therefore survives until a later update carries the
/// field again. That is the documented behavior of this layer, not a bug.
pub trait Absorb: Clone + Send + Sync + 'static {
    /// Stable identity of the entity.
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    fn key(&self) -> Self::Key;

    /// Folds `update` into `self` under the shallow-merge policy.
    fn absorb(&mut self, update: Self);
}

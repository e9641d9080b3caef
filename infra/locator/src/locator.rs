use crate::error::LocatorError;
use crate::key::{ServiceKey, TypeKey};
use crate::registration::{Boxed, HookFuture, Registration, Slot};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A typed registry of lazily-constructed singleton services.
///
/// The locator is the one place independent subsystems agree on "the same
/// instance" of a service. Registrations are added at startup, instances
/// materialize on first access, and [`ServiceLocator::reset`] tears
/// everything down again in registration order.
///
/// Mutation (`register`/`reset`) is expected at startup and teardown only;
/// steady-state traffic is `get` calls on the read path.
pub struct ServiceLocator {
    inner: RwLock<LocatorInner>,
}

#[derive(Default)]
struct LocatorInner {
    slots: FxHashMap<ServiceKey, Slot>,
    order: Vec<ServiceKey>,
}

impl ServiceLocator {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: RwLock::new(LocatorInner::default()) }
    }

    /// Stores a registration without invoking its factory.
    ///
    /// # Errors
    /// Returns [`LocatorError::DuplicateRegistration`] if the key already has
    /// a registration; the existing one is left untouched.
    pub fn register<T>(&self, registration: Registration<T>) -> Result<(), LocatorError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let (key, slot) = registration.erase();
        let mut inner = self.inner.write();
        if inner.slots.contains_key(&key) {
            return Err(LocatorError::DuplicateRegistration {
                message: format!("{key:?}").into(),
                context: None,
            });
        }

        debug!(service = ?key, "Service registered");
        inner.order.push(key.clone());
        inner.slots.insert(key, slot);
        Ok(())
    }

    /// Resolves the default instance of `T`, materializing it on first access.
    ///
    /// # Errors
    /// Returns [`LocatorError::NotRegistered`] if `T` was never registered.
    pub fn get<T>(&self) -> Result<Arc<T>, LocatorError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve(&ServiceKey::of::<T>())
    }

    /// Resolves a named instance of `T`, materializing it on first access.
    ///
    /// # Errors
    /// Returns [`LocatorError::NotRegistered`] if the key was never registered.
    pub fn get_named<T>(&self, instance: &str) -> Result<Arc<T>, LocatorError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve(&ServiceKey::named::<T>(instance.to_owned()))
    }

    /// Like [`ServiceLocator::get`] but returns `None` instead of failing.
    #[must_use]
    pub fn get_opt<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>().ok()
    }

    /// Like [`ServiceLocator::get_named`] but returns `None` instead of failing.
    #[must_use]
    pub fn get_opt_named<T>(&self, instance: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_named::<T>(instance).ok()
    }

    /// Resolves every instance registered under `T`, in registration order,
    /// materializing any not yet built.
    ///
    /// # Errors
    /// Propagates the first resolution failure.
    pub fn get_all<T>(&self) -> Result<Vec<Arc<T>>, LocatorError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::of::<T>();
        let keys: Vec<ServiceKey> = {
            let inner = self.inner.read();
            inner.order.iter().filter(|key| key.type_key() == type_key).cloned().collect()
        };
        keys.iter().map(|key| self.resolve::<T>(key)).collect()
    }

    /// Whether the default instance of `T` has a registration.
    #[must_use]
    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.inner.read().slots.contains_key(&ServiceKey::of::<T>())
    }

    /// Number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().slots.is_empty()
    }

    /// Disposes every materialized instance, in registration order, then
    /// clears all registrations.
    ///
    /// Each disposal hook is awaited before the next one runs; a failing hook
    /// is logged and does not block the remaining disposals. Afterwards the
    /// locator behaves as freshly constructed: callers must register again
    /// before `get`.
    pub async fn reset(&self) {
        let (order, mut slots) = {
            let mut inner = self.inner.write();
            (std::mem::take(&mut inner.order), std::mem::take(&mut inner.slots))
        };

        for key in order {
            let Some(slot) = slots.remove(&key) else { continue };
            let (Some(instance), Some(dispose)) = (slot.instance, slot.dispose) else {
                trace!(service = ?key, "Nothing to dispose");
                continue;
            };
            if let Err(err) = dispose(&instance).await {
                warn!(service = ?key, error = %err, "Disposal hook failed, continuing teardown");
            } else {
                debug!(service = ?key, "Service disposed");
            }
        }

        debug!("Service locator reset");
    }

    fn resolve<T>(&self, key: &ServiceKey) -> Result<Arc<T>, LocatorError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let factory = {
            let inner = self.inner.read();
            let slot = inner.slots.get(key).ok_or_else(|| not_registered(key))?;
            if let Some(instance) = &slot.instance {
                trace!(service = ?key, "Service resolved from cache");
                return downcast::<T>(key, instance);
            }
            Arc::clone(&slot.factory)
        };

        // Build outside the lock: factories are allowed to resolve their own
        // dependencies through the locator.
        let built = factory();

        let mut init_future: Option<HookFuture> = None;
        let resolved = {
            let mut inner = self.inner.write();
            let slot = inner.slots.get_mut(key).ok_or_else(|| not_registered(key))?;
            let instance = match &mut slot.instance {
                Some(existing) => {
                    trace!(service = ?key, "Lost materialization race, reusing winner");
                    &*existing
                },
                slot_instance @ None => {
                    debug!(service = ?key, "Service materialized");
                    let instance = slot_instance.insert(built);
                    if let Some(hook) = &slot.init {
                        init_future = Some(hook(instance));
                    }
                    &*instance
                },
            };
            downcast::<T>(key, instance)?
        };

        if let Some(future) = init_future {
            spawn_init(key, future);
        }
        Ok(resolved)
    }
}

impl Default for ServiceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ServiceLocator").field("registrations", &inner.slots.len()).finish()
    }
}

fn not_registered(key: &ServiceKey) -> LocatorError {
    LocatorError::NotRegistered { message: format!("{key:?}").into(), context: None }
}

fn downcast<T>(key: &ServiceKey, instance: &Boxed) -> Result<Arc<T>, LocatorError>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance.downcast_ref::<Arc<T>>().map(Arc::clone).ok_or_else(|| LocatorError::TypeMismatch {
        message: format!("{key:?}").into(),
        context: None,
    })
}

/// Initialization is best-effort: failures are logged, never propagated, and
/// the `get` caller is not made to wait for warm-up.
fn spawn_init(key: &ServiceKey, future: HookFuture) {
    let key = key.clone();
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(err) = future.await {
                    warn!(service = ?key, error = %err, "Initialization hook failed");
                }
            });
        },
        Err(_) => warn!(service = ?key, "Initialization hook skipped: no tokio runtime"),
    }
}

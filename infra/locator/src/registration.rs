use crate::key::ServiceKey;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A stored instance, type-erased. The box holds exactly an `Arc<T>` for the
/// registered interface; downcast on read is cheap.
pub(crate) type Boxed = Box<dyn Any + Send + Sync>;

/// Result type for lifecycle hooks. Hook failures are logged, never propagated.
pub type HookResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub(crate) type HookFuture = Pin<Box<dyn Future<Output = HookResult> + Send>>;
pub(crate) type ErasedFactory = Arc<dyn Fn() -> Boxed + Send + Sync>;
pub(crate) type ErasedHook = Box<dyn Fn(&Boxed) -> HookFuture + Send + Sync>;

/// A pending registration for the interface `T`.
///
/// Built fluently and handed to [`ServiceLocator::register`]; the factory is
/// not invoked until the first `get` for the key.
///
/// [`ServiceLocator::register`]: crate::ServiceLocator::register
pub struct Registration<T: ?Sized + Send + Sync + 'static> {
    key: ServiceKey,
    factory: Arc<dyn Fn() -> Arc<T> + Send + Sync>,
    init: Option<ErasedTypedHook<T>>,
    dispose: Option<ErasedTypedHook<T>>,
}

type ErasedTypedHook<T> = Box<dyn Fn(Arc<T>) -> HookFuture + Send + Sync>;

impl<T: ?Sized + Send + Sync + 'static> Registration<T> {
    /// Registration for the default instance of `T`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        Self { key: ServiceKey::of::<T>(), factory: Arc::new(factory), init: None, dispose: None }
    }

    /// Registers under a named instance instead of the default one.
    #[must_use = "The registration must be handed to the locator to take effect"]
    pub fn named(mut self, instance: impl Into<Cow<'static, str>>) -> Self {
        self.key = ServiceKey::named::<T>(instance);
        self
    }

    /// Attaches a best-effort initialization hook.
    ///
    /// The hook is spawned once, right after the first materialization.
    /// A failure is logged and never propagated to the `get` caller.
    #[must_use = "The registration must be handed to the locator to take effect"]
    pub fn on_init<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.init = Some(Box::new(move |service| Box::pin(hook(service))));
        self
    }

    /// Attaches a disposal hook, awaited during [`ServiceLocator::reset`].
    ///
    /// A failure is logged and does not block the disposal of later
    /// registrations.
    ///
    /// [`ServiceLocator::reset`]: crate::ServiceLocator::reset
    #[must_use = "The registration must be handed to the locator to take effect"]
    pub fn on_dispose<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.dispose = Some(Box::new(move |service| Box::pin(hook(service))));
        self
    }

    /// Erases the interface type so the locator can store heterogeneous slots.
    pub(crate) fn erase(self) -> (ServiceKey, Slot) {
        let factory = self.factory;
        let erased_factory: ErasedFactory = Arc::new(move || -> Boxed { Box::new(factory()) });

        let slot = Slot {
            factory: erased_factory,
            init: self.init.map(erase_hook::<T>),
            dispose: self.dispose.map(erase_hook::<T>),
            instance: None,
        };
        (self.key, slot)
    }
}

fn erase_hook<T: ?Sized + Send + Sync + 'static>(hook: ErasedTypedHook<T>) -> ErasedHook {
    Box::new(move |boxed: &Boxed| {
        // The slot invariant guarantees the box holds an `Arc<T>`.
        boxed.downcast_ref::<Arc<T>>().map_or_else(
            || -> HookFuture {
                Box::pin(async { Err("lifecycle hook saw a foreign instance type".into()) })
            },
            |service| hook(Arc::clone(service)),
        )
    })
}

impl<T: ?Sized + Send + Sync + 'static> fmt::Debug for Registration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("init", &self.init.is_some())
            .field("dispose", &self.dispose.is_some())
            .finish()
    }
}

/// One registered service: its factory, optional hooks, and the lazily
/// materialized instance.
pub(crate) struct Slot {
    pub(crate) factory: ErasedFactory,
    pub(crate) init: Option<ErasedHook>,
    pub(crate) dispose: Option<ErasedHook>,
    pub(crate) instance: Option<Boxed>,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot").field("materialized", &self.instance.is_some()).finish()
    }
}

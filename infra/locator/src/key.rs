use std::borrow::Cow;
use std::fmt;

/// The default (unnamed) instance.
pub const DEFAULT_INSTANCE: &str = "";

/// Stable type key for service interfaces. Uses fully-qualified
/// `type_name::<T>()`, which works for `T = dyn Trait`.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct TypeKey(&'static str);

impl TypeKey {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(std::any::type_name::<T>())
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Full lookup key: interface type plus an optional instance disambiguator.
///
/// The same interface can be registered under several instance names, for
/// example two filter repositories that share a trait but persist to
/// different storage keys. The empty name is the default instance.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ServiceKey {
    type_key: TypeKey,
    instance: Cow<'static, str>,
}

impl ServiceKey {
    /// Key for the default instance of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { type_key: TypeKey::of::<T>(), instance: Cow::Borrowed(DEFAULT_INSTANCE) }
    }

    /// Key for a named instance of `T`.
    #[must_use]
    pub fn named<T: ?Sized + 'static>(instance: impl Into<Cow<'static, str>>) -> Self {
        Self { type_key: TypeKey::of::<T>(), instance: instance.into() }
    }

    #[must_use]
    pub const fn type_key(&self) -> TypeKey {
        self.type_key
    }

    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance.is_empty() {
            write!(f, "{:?}", self.type_key)
        } else {
            write!(f, "{:?}[{}]", self.type_key, self.instance)
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

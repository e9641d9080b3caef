//! # Service Locator
//!
//! A typed, keyed registry of lazily-constructed singleton services with
//! ordered asynchronous disposal.
//!
//! ## Overview
//!
//! Services register a factory under an *interface type* (usually a trait
//! object) plus an optional instance name. Nothing is constructed at
//! registration time; the first `get` materializes the instance, every later
//! `get` returns the same `Arc`. `reset` disposes every materialized instance
//! in registration order and returns the locator to its freshly-constructed
//! state.
//!
//! ## Features
//!
//! * **Type-Safe**: services are resolved by interface type, `dyn Trait` included.
//! * **Lazy**: factories run on first access, so construction order follows
//!   use, not registration.
//! * **Named instances**: the same interface can be registered several times
//!   under different instance names.
//! * **Lifecycle hooks**: optional best-effort init and awaited dispose hooks.
//!
//! # Example
//!
//! ```rust
//! use lhub_locator::{Registration, ServiceLocator};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn hello(&self) -> String;
//! }
//!
//! struct English;
//! impl Greeter for English {
//!     fn hello(&self) -> String {
//!         "hello".to_owned()
//!     }
//! }
//!
//! # fn main() -> Result<(), lhub_locator::LocatorError> {
//! let locator = ServiceLocator::new();
//! locator.register(Registration::<dyn Greeter>::new(|| Arc::new(English)))?;
//!
//! let greeter = locator.get::<dyn Greeter>()?;
//! assert_eq!(greeter.hello(), "hello");
//! # Ok(())
//! # }
//! ```

mod error;
mod key;
mod locator;
mod registration;

pub use error::{LocatorError, LocatorErrorExt};
pub use key::{DEFAULT_INSTANCE, ServiceKey, TypeKey};
pub use locator::ServiceLocator;
pub use registration::{HookResult, Registration};

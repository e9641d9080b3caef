//! Product catalog feature slice.
//!
//! Owns the [`Product`] model and the caching [`ProductRepository`] facade
//! over the remote catalog endpoints. Consumers resolve the repository
//! through the service locator; nothing here is constructed directly.

mod model;
mod repository;

pub use model::{Product, ProductQuery};
pub use repository::{ProductClient, ProductRepository};

use lhub_domain::config::CoreConfig;
use lhub_locator::{LocatorError, Registration, ServiceLocator};
use std::sync::Arc;

/// Registers the product repository (default instance) into the locator.
///
/// The repository materializes lazily on first resolution and disposes its
/// cache during locator reset.
///
/// # Errors
/// Returns an error if the repository is already registered.
pub fn init(
    locator: &ServiceLocator,
    config: &CoreConfig,
    client: ProductClient,
) -> Result<(), LocatorError> {
    let config = config.clone();
    locator.register(
        Registration::<ProductRepository>::new(move || {
            Arc::new(ProductRepository::with_client(&config.signals, client.clone()))
        })
        .on_dispose(|repository| async move {
            repository.dispose()?;
            Ok(())
        }),
    )?;

    tracing::info!("Catalog slice initialized");
    Ok(())
}

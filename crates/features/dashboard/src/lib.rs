//! Dashboard filter feature slice.
//!
//! Owns the [`DashboardFilter`] model and the caching [`FilterRepository`]
//! facade, plus the persisted "selected filter" state of each dashboard
//! surface. The same repository interface is registered once per surface
//! under a locator instance name, with an independent storage key each.

mod error;
mod model;
mod repository;

pub use error::{DashboardError, DashboardErrorExt};
pub use model::{DashboardFilter, FilterQuery, FilterSelection};
pub use repository::{FilterClient, FilterRepository};

use lhub_domain::config::CoreConfig;
use lhub_locator::{LocatorError, Registration, ServiceLocator};
use lhub_settings::Settings;
use std::borrow::Cow;
use std::sync::Arc;

/// One dashboard surface: the locator instance name plus the settings key
/// its selection persists under.
#[derive(Debug, Clone)]
pub struct FilterSurface {
    pub instance: Cow<'static, str>,
    pub storage_key: Cow<'static, str>,
}

impl FilterSurface {
    #[must_use]
    pub fn new(
        instance: impl Into<Cow<'static, str>>,
        storage_key: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self { instance: instance.into(), storage_key: storage_key.into() }
    }
}

/// Registers one filter repository per surface into the locator.
///
/// Each instance warms its persisted selection on first resolution
/// (best-effort) and disposes its cache during locator reset.
///
/// # Errors
/// Returns an error if a surface instance is already registered.
pub fn init(
    locator: &ServiceLocator,
    config: &CoreConfig,
    settings: &Settings,
    client: &FilterClient,
    surfaces: &[FilterSurface],
) -> Result<(), LocatorError> {
    for surface in surfaces {
        let config = config.clone();
        let settings = settings.clone();
        let client = client.clone();
        let storage_key = surface.storage_key.clone();

        locator.register(
            Registration::<FilterRepository>::new(move || {
                Arc::new(FilterRepository::with_client(
                    &config.signals,
                    settings.clone(),
                    storage_key.clone(),
                    client.clone(),
                ))
            })
            .named(surface.instance.clone())
            .on_init(|repository| async move {
                repository.load_selection().await?;
                Ok(())
            })
            .on_dispose(|repository| async move {
                repository.dispose()?;
                Ok(())
            }),
        )?;
    }

    tracing::info!(surfaces = surfaces.len(), "Dashboard slice initialized");
    Ok(())
}

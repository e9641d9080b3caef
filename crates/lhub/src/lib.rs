//! Facade crate for LedgerHub features and shared modules.
//! Re-exports domain/infrastructure primitives and aggregates feature wiring.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Add `lhub` and call [`init`] at startup with the remote clients and the
//!   settings store; resolve repositories through the locator afterwards.
//! - Call [`ServiceLocator::reset`] at teardown to dispose every repository
//!   in registration order.
//!
//! [`ServiceLocator::reset`]: lhub_locator::ServiceLocator::reset

pub use lhub_domain as domain;
pub use lhub_locator as locator;
pub use lhub_logger as logger;
pub use lhub_repository as repository;
pub use lhub_settings as settings;

use lhub_catalog::ProductClient;
use lhub_dashboard::{FilterClient, FilterSurface};
use lhub_domain::config::CoreConfig;
use lhub_locator::{LocatorError, ServiceLocator};
use lhub_settings::Settings;

/// Feature registry for runtime introspection.
pub mod features {
    pub use lhub_catalog as catalog;
    pub use lhub_dashboard as dashboard;

    /// Feature slices wired by [`init`](crate::init).
    pub const ENABLED: &[&str] = &["catalog", "dashboard"];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// The dashboard surfaces wired by default: the locator instance name and
/// the settings key each surface's selection persists under.
#[must_use]
pub fn default_surfaces() -> Vec<FilterSurface> {
    vec![
        FilterSurface::new("sales", "sales_filter"),
        FilterSurface::new("inventory", "inventory_filter"),
    ]
}

/// Initialize all features.
///
/// Registers the product repository (default instance) and one filter
/// repository per default surface. Nothing materializes until first
/// resolution.
///
/// # Errors
/// Returns an error if any feature registration fails.
pub fn init(
    locator: &ServiceLocator,
    config: &CoreConfig,
    settings: &Settings,
    products: ProductClient,
    filters: FilterClient,
) -> Result<(), LocatorError> {
    // Catalog
    lhub_catalog::init(locator, config, products)?;

    // Dashboard surfaces
    lhub_dashboard::init(locator, config, settings, &filters, &default_surfaces())?;

    tracing::info!(features = ?features::ENABLED, "LedgerHub core initialized");
    Ok(())
}

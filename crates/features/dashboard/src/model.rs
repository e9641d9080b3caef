use lhub_repository::Absorb;
use serde::{Deserialize, Serialize};

/// A saved dashboard filter.
///
/// `criteria` is an opaque JSON document owned by the backend; the core
/// never inspects it. Like every cached entity, non-identity fields are
/// optional because list and detail endpoints populate different slices.
/// An updated `criteria` replaces the previous document wholesale; the
/// shallow-merge policy never reaches inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardFilter {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl Default for DashboardFilter {
    fn default() -> Self {
        Self { id: String::new(), label: None, criteria: None, position: None }
    }
}

impl DashboardFilter {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }
}

impl Absorb for DashboardFilter {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn absorb(&mut self, update: Self) {
        self.id = update.id;
        if update.label.is_some() {
            self.label = update.label;
        }
        if update.criteria.is_some() {
            self.criteria = update.criteria;
        }
        if update.position.is_some() {
            self.position = update.position;
        }
    }
}

/// Query parameters for the filter list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterQuery {
    /// Restricts the listing to one dashboard surface (e.g. `sales`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
}

impl FilterQuery {
    #[must_use]
    pub fn surface(surface: impl Into<String>) -> Self {
        Self { surface: Some(surface.into()) }
    }
}

/// The persisted "selected filter" document, one per dashboard surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub filter_id: String,
}

use lhub_domain::page::PageQuery;
use lhub_repository::Absorb;
use serde::{Deserialize, Serialize};

/// A sale product as the dashboard sees it.
///
/// Every non-identity field is optional because different endpoints populate
/// different slices of the record: the list endpoint carries name and price,
/// the detail endpoint adds stock and category. The cache folds them
/// together with [`Absorb`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_on_hand: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Default for Product {
    fn default() -> Self {
        Self {
            id: 0,
            name: None,
            sku: None,
            unit_price_cents: None,
            stock_on_hand: None,
            category: None,
        }
    }
}

impl Product {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self { id, ..Self::default() }
    }
}

impl Absorb for Product {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }

    fn absorb(&mut self, update: Self) {
        self.id = update.id;
        if update.name.is_some() {
            self.name = update.name;
        }
        if update.sku.is_some() {
            self.sku = update.sku;
        }
        if update.unit_price_cents.is_some() {
            self.unit_price_cents = update.unit_price_cents;
        }
        if update.stock_on_hand.is_some() {
            self.stock_on_hand = update.stock_on_hand;
        }
        if update.category.is_some() {
            self.category = update.category;
        }
    }
}

/// Query parameters for the product list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductQuery {
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self { search: Some(term.into()), ..Self::default() }
    }

    #[must_use]
    pub fn in_category(category: impl Into<String>) -> Self {
        Self { category: Some(category.into()), ..Self::default() }
    }
}

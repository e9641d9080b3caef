use lhub_catalog::{Product, ProductClient, ProductQuery, ProductRepository};
use lhub_domain::config::SignalsConfig;
use lhub_domain::page::Page;
use lhub_repository::RepositoryError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An in-memory stand-in for the remote catalog service, with separate
/// payloads for the detail and list endpoints.
struct CatalogStub {
    detail: HashMap<u64, Product>,
    listing: Vec<Product>,
    fetch_calls: AtomicUsize,
    seen_queries: Mutex<Vec<ProductQuery>>,
}

impl CatalogStub {
    fn new(detail: Vec<Product>, listing: Vec<Product>) -> Arc<Self> {
        Arc::new(Self {
            detail: detail.into_iter().map(|product| (product.id, product)).collect(),
            listing,
            fetch_calls: AtomicUsize::new(0),
            seen_queries: Mutex::new(Vec::new()),
        })
    }

    /// Both endpoints serve the same records.
    fn with_products(products: Vec<Product>) -> Arc<Self> {
        Self::new(products.clone(), products)
    }

    fn client(self: &Arc<Self>) -> ProductClient {
        let one = Arc::clone(self);
        let page = Arc::clone(self);
        ProductClient::new(
            move |id| {
                let stub = Arc::clone(&one);
                Box::pin(async move {
                    stub.fetch_calls.fetch_add(1, Ordering::SeqCst);
                    stub.detail.get(&id).cloned().ok_or_else(|| RepositoryError::NotFound {
                        message: format!("product {id}").into(),
                        context: None,
                    })
                })
            },
            move |query| {
                let stub = Arc::clone(&page);
                Box::pin(async move {
                    stub.seen_queries.lock().unwrap().push(query);
                    Ok(Page::single(stub.listing.clone()))
                })
            },
        )
    }
}

fn repository_over(stub: &Arc<CatalogStub>) -> ProductRepository {
    ProductRepository::with_client(&SignalsConfig::default(), stub.client())
}

fn ice() -> Product {
    Product { name: Some("Ice".into()), unit_price_cents: Some(250), ..Product::new(1) }
}

#[tokio::test]
async fn fetch_then_cached_read_then_clear() {
    let stub = CatalogStub::with_products(vec![ice()]);
    let repository = repository_over(&stub);

    // Authoritative fetch resolves the remote record.
    let fetched = repository.fetch_product(1).await.unwrap();
    assert_eq!(fetched.name.as_deref(), Some("Ice"));

    // The synchronous read now returns the same cached object.
    let cached = repository.product(1).unwrap();
    assert_eq!(cached, Some(fetched));

    // After clear, the synchronous read is empty again.
    repository.clear().unwrap();
    assert_eq!(repository.product(1).unwrap(), None);
}

#[tokio::test]
async fn missing_product_propagates_not_found() {
    let stub = CatalogStub::with_products(vec![]);
    let repository = repository_over(&stub);

    let result = repository.fetch_product(404).await;
    assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
}

#[tokio::test]
async fn page_envelope_is_unwrapped_and_merged() {
    let stub = CatalogStub::with_products(vec![
        ice(),
        Product { name: Some("Salt".into()), ..Product::new(2) },
    ]);
    let repository = repository_over(&stub);

    let mut products = repository.products(ProductQuery::default()).await.unwrap();
    products.sort_by_key(|product| product.id);

    assert_eq!(products.len(), 2);
    assert_eq!(products[1].name.as_deref(), Some("Salt"));
    // Every listed product landed in the cache.
    assert_eq!(repository.product(2).unwrap().unwrap().name.as_deref(), Some("Salt"));
    assert_eq!(
        stub.fetch_calls.load(Ordering::SeqCst),
        0,
        "listing must not hit the detail endpoint"
    );
}

#[tokio::test]
async fn domain_queries_reach_the_remote_unchanged() {
    let stub = CatalogStub::with_products(vec![ice()]);
    let repository = repository_over(&stub);

    let query = ProductQuery::in_category("frozen");
    repository.products(query.clone()).await.unwrap();

    let seen = stub.seen_queries.lock().unwrap();
    assert_eq!(seen.as_slice(), [query]);
}

#[tokio::test]
async fn list_and_detail_payloads_merge_per_field() {
    let stub = CatalogStub::new(
        // Detail endpoint: stock, but no name.
        vec![Product { stock_on_hand: Some(42), ..Product::new(1) }],
        // List endpoint: name, but no stock.
        vec![Product { name: Some("Ice".into()), ..Product::new(1) }],
    );
    let repository = repository_over(&stub);

    repository.products(ProductQuery::default()).await.unwrap();
    let listed = repository.product(1).unwrap().unwrap();
    assert_eq!(listed.name.as_deref(), Some("Ice"));
    assert_eq!(listed.stock_on_hand, None);

    // The detail fetch fills the stock without erasing the listed name.
    let merged = repository.fetch_product(1).await.unwrap();
    assert_eq!(merged.name.as_deref(), Some("Ice"));
    assert_eq!(merged.stock_on_hand, Some(42));
}

#[tokio::test]
async fn watch_product_replays_and_pushes() {
    let stub = CatalogStub::with_products(vec![ice()]);
    let repository = repository_over(&stub);

    let mut rx = repository.watch_product(1).unwrap();
    assert!(rx.borrow_and_update().is_none());

    repository.fetch_product(1).await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().as_ref().unwrap().name.as_deref(), Some("Ice"));
}

#[tokio::test]
async fn refresh_signal_reaches_list_consumers() {
    let stub = CatalogStub::with_products(vec![ice()]);
    let repository = repository_over(&stub);

    let mut refreshes = repository.on_refresh().unwrap();
    repository.refresh(Some(1)).unwrap();
    assert_eq!(refreshes.recv().await.unwrap(), Some(1));
}

#[tokio::test]
async fn dispose_makes_the_facade_fail_fast() {
    let stub = CatalogStub::with_products(vec![ice()]);
    let repository = repository_over(&stub);

    repository.dispose().unwrap();
    assert!(matches!(repository.product(1), Err(RepositoryError::Disposed { .. })));
    assert!(matches!(repository.fetch_product(1).await, Err(RepositoryError::Disposed { .. })));
}

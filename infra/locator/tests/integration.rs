use lhub_locator::{LocatorError, Registration, ServiceLocator};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

trait Pricing: Send + Sync {
    fn tax_rate(&self) -> u32;
}

struct FlatPricing {
    rate: u32,
}

impl Pricing for FlatPricing {
    fn tax_rate(&self) -> u32 {
        self.rate
    }
}

trait AuditTrail: Send + Sync {
    fn label(&self) -> &str;
}

struct MemoryAudit(String);

impl AuditTrail for MemoryAudit {
    fn label(&self) -> &str {
        &self.0
    }
}

async fn wait_until(flag: &AtomicBool) {
    for _ in 0..200 {
        if flag.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition was not reached in time");
}

#[test]
fn get_returns_the_same_instance() {
    let locator = ServiceLocator::new();
    locator
        .register(Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 20 })))
        .unwrap();

    let first = locator.get::<dyn Pricing>().unwrap();
    let second = locator.get::<dyn Pricing>().unwrap();

    assert_eq!(first.tax_rate(), 20);
    assert!(Arc::ptr_eq(&first, &second), "both gets must return the identical instance");

    let opt = locator.get_opt::<dyn Pricing>().unwrap();
    assert!(Arc::ptr_eq(&first, &opt));
}

#[test]
fn factory_runs_lazily_and_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let locator = ServiceLocator::new();

    let counter = calls.clone();
    locator
        .register(Registration::<dyn Pricing>::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(FlatPricing { rate: 7 })
        }))
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0, "registration must not build");

    let _ = locator.get::<dyn Pricing>().unwrap();
    let _ = locator.get::<dyn Pricing>().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn duplicate_registration_is_rejected() {
    let locator = ServiceLocator::new();
    locator
        .register(Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 1 })))
        .unwrap();

    let second =
        locator.register(Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 2 })));
    assert!(matches!(second, Err(LocatorError::DuplicateRegistration { .. })));

    // The first registration survives the failed attempt.
    assert_eq!(locator.get::<dyn Pricing>().unwrap().tax_rate(), 1);
}

#[test]
fn unknown_key_fails_and_get_opt_is_empty() {
    let locator = ServiceLocator::new();

    let result = locator.get::<dyn Pricing>();
    assert!(matches!(result, Err(LocatorError::NotRegistered { .. })));
    assert!(locator.get_opt::<dyn Pricing>().is_none());
    assert!(!locator.contains::<dyn Pricing>());
}

#[test]
fn named_instances_are_independent() {
    let locator = ServiceLocator::new();
    locator
        .register(
            Registration::<dyn AuditTrail>::new(|| Arc::new(MemoryAudit("sales".to_owned())))
                .named("sales"),
        )
        .unwrap();
    locator
        .register(
            Registration::<dyn AuditTrail>::new(|| Arc::new(MemoryAudit("inventory".to_owned())))
                .named("inventory"),
        )
        .unwrap();

    assert_eq!(locator.get_named::<dyn AuditTrail>("sales").unwrap().label(), "sales");
    assert_eq!(locator.get_named::<dyn AuditTrail>("inventory").unwrap().label(), "inventory");
    // No default instance was registered.
    assert!(locator.get::<dyn AuditTrail>().is_err());

    let all = locator.get_all::<dyn AuditTrail>().unwrap();
    let labels: Vec<&str> = all.iter().map(|audit| audit.label()).collect();
    assert_eq!(labels, ["sales", "inventory"], "registration order is preserved");
}

#[tokio::test]
async fn init_hook_runs_once_after_materialization() {
    let ran = Arc::new(AtomicUsize::new(0));
    let locator = ServiceLocator::new();

    let counter = ran.clone();
    locator
        .register(
            Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 3 })).on_init(
                move |service| {
                    let counter = counter.clone();
                    async move {
                        assert_eq!(service.tax_rate(), 3);
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
            ),
        )
        .unwrap();

    let _ = locator.get::<dyn Pricing>().unwrap();
    let _ = locator.get::<dyn Pricing>().unwrap();

    let mut observed = 0;
    for _ in 0..200 {
        observed = ran.load(Ordering::SeqCst);
        if observed > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(observed, 1, "init hook must run exactly once");
}

#[tokio::test]
async fn init_failure_is_swallowed() {
    let attempted = Arc::new(AtomicBool::new(false));
    let locator = ServiceLocator::new();

    let marker = attempted.clone();
    locator
        .register(
            Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 9 })).on_init(
                move |_service| {
                    let marker = marker.clone();
                    async move {
                        marker.store(true, Ordering::SeqCst);
                        Err("warm-up endpoint unreachable".into())
                    }
                },
            ),
        )
        .unwrap();

    // Construction succeeds even though warm-up fails.
    let service = locator.get::<dyn Pricing>().unwrap();
    assert_eq!(service.tax_rate(), 9);

    wait_until(&attempted).await;
    assert_eq!(locator.get::<dyn Pricing>().unwrap().tax_rate(), 9);
}

#[tokio::test]
async fn reset_disposes_in_registration_order() {
    let disposed: Arc<std::sync::Mutex<Vec<&'static str>>> =
        Arc::new(std::sync::Mutex::new(Vec::new()));
    let locator = ServiceLocator::new();

    let log = disposed.clone();
    locator
        .register(
            Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 1 })).on_dispose(
                move |_service| {
                    let log = log.clone();
                    async move {
                        log.lock().unwrap().push("pricing");
                        Ok(())
                    }
                },
            ),
        )
        .unwrap();

    let log = disposed.clone();
    locator
        .register(
            Registration::<dyn AuditTrail>::new(|| Arc::new(MemoryAudit("a".to_owned())))
                .on_dispose(move |_service| {
                    let log = log.clone();
                    async move {
                        log.lock().unwrap().push("audit");
                        Ok(())
                    }
                }),
        )
        .unwrap();

    let _ = locator.get::<dyn Pricing>().unwrap();
    let _ = locator.get::<dyn AuditTrail>().unwrap();

    locator.reset().await;

    assert_eq!(*disposed.lock().unwrap(), ["pricing", "audit"]);
    assert!(locator.is_empty());
    assert!(matches!(locator.get::<dyn Pricing>(), Err(LocatorError::NotRegistered { .. })));
}

#[tokio::test]
async fn reset_skips_never_materialized_services() {
    let disposed = Arc::new(AtomicBool::new(false));
    let locator = ServiceLocator::new();

    let marker = disposed.clone();
    locator
        .register(
            Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 1 })).on_dispose(
                move |_service| {
                    let marker = marker.clone();
                    async move {
                        marker.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                },
            ),
        )
        .unwrap();

    // Never resolved, so there is nothing to dispose.
    locator.reset().await;
    assert!(!disposed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn failing_disposal_does_not_block_the_rest() {
    let survivor = Arc::new(AtomicBool::new(false));
    let locator = ServiceLocator::new();

    locator
        .register(
            Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 1 }))
                .on_dispose(|_service| async { Err("flush failed".into()) }),
        )
        .unwrap();

    let marker = survivor.clone();
    locator
        .register(
            Registration::<dyn AuditTrail>::new(|| Arc::new(MemoryAudit("b".to_owned())))
                .on_dispose(move |_service| {
                    let marker = marker.clone();
                    async move {
                        marker.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                }),
        )
        .unwrap();

    let _ = locator.get::<dyn Pricing>().unwrap();
    let _ = locator.get::<dyn AuditTrail>().unwrap();

    locator.reset().await;
    assert!(survivor.load(Ordering::SeqCst), "later disposals must still run");
}

#[tokio::test]
async fn registry_is_reusable_after_reset() {
    let locator = ServiceLocator::new();
    locator
        .register(Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 5 })))
        .unwrap();
    let _ = locator.get::<dyn Pricing>().unwrap();

    locator.reset().await;

    locator
        .register(Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 6 })))
        .unwrap();
    assert_eq!(locator.get::<dyn Pricing>().unwrap().tax_rate(), 6);
}

#[test]
fn factories_may_resolve_their_dependencies() {
    let locator = Arc::new(ServiceLocator::new());

    locator
        .register(Registration::<dyn Pricing>::new(|| Arc::new(FlatPricing { rate: 21 })))
        .unwrap();

    let inner = locator.clone();
    locator
        .register(Registration::<dyn AuditTrail>::new(move || {
            // Materializing the audit trail pulls in its pricing dependency.
            let pricing = inner.get::<dyn Pricing>().expect("pricing must be registered first");
            Arc::new(MemoryAudit(format!("rate-{}", pricing.tax_rate())))
        }))
        .unwrap();

    assert_eq!(locator.get::<dyn AuditTrail>().unwrap().label(), "rate-21");
}

//! Registry behaviour across threads and tasks.

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};

fn registry_with_ab() -> LockRegistry {
    let registry = LockRegistry::default();
    registry.register("a", 1, "first").unwrap();
    registry.register("b", 2, "second").unwrap();
    registry
}

#[test]
fn test_duplicate_registration_leaves_existing_untouched() {
    let registry = registry_with_ab();

    let by_name = registry.register("a", 99, "again");
    assert!(matches!(by_name, Err(Error::DuplicateName { .. })));

    let by_order = registry.register("c", 2, "clash");
    match by_order {
        Err(Error::DuplicateOrder {
            order,
            existing,
            requested,
        }) => {
            assert_eq!(order, 2);
            assert_eq!(existing, "b");
            assert_eq!(requested, "c");
        }
        other => panic!("expected DuplicateOrder, got {other:?}"),
    }

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("a").unwrap().order(), 1);
    assert_eq!(registry.get("a").unwrap().description(), "first");
    assert!(!registry.contains("c"));
}

#[test]
fn test_acquires_in_ascending_order_regardless_of_request_order() {
    let registry = registry_with_ab();
    let guard = registry.acquire(&["b", "a"], None).unwrap();
    assert_eq!(guard.locked_names(), vec!["a", "b"]);
    assert_eq!(guard.orders(), vec![1, 2]);
    assert_eq!(registry.held_orders(), vec![1, 2]);
    drop(guard);
    assert!(registry.held_orders().is_empty());
}

#[test]
fn test_duplicate_names_in_one_request_lock_once() {
    let registry = registry_with_ab();
    let guard = registry.acquire(&["a", "a", "b"], None).unwrap();
    assert_eq!(guard.len(), 2);
}

#[test]
fn test_holding_lower_then_requesting_higher_is_allowed() {
    let registry = registry_with_ab();
    let _a = registry.acquire(&["a"], None).unwrap();
    let b = registry.acquire(&["b"], None).unwrap();
    assert_eq!(b.locked_names(), vec!["b"]);
}

#[test]
fn test_holding_higher_then_requesting_lower_is_rejected() {
    let registry = registry_with_ab();
    let _b = registry.acquire(&["b"], None).unwrap();

    let result = registry.acquire(&["a"], Some(Duration::from_secs(5)));
    match result {
        Err(Error::LockOrderViolation {
            name,
            order,
            held_order,
        }) => {
            assert_eq!(name, "a");
            assert_eq!(order, 1);
            assert_eq!(held_order, 2);
        }
        other => panic!("expected LockOrderViolation, got {other:?}"),
    }
    // Rejected up front: `a` was never touched.
    assert!(!registry.get("a").unwrap().is_locked());
}

#[test]
fn test_requesting_same_order_again_is_rejected() {
    let registry = registry_with_ab();
    let _a = registry.acquire(&["a"], None).unwrap();
    assert!(matches!(
        registry.try_acquire(&["a"]),
        Err(Error::LockOrderViolation { .. })
    ));
}

#[test]
fn test_unknown_lock() {
    let registry = registry_with_ab();
    assert!(matches!(
        registry.acquire(&["a", "missing"], None),
        Err(Error::UnknownLock { name }) if name == "missing"
    ));
    assert!(!registry.get("a").unwrap().is_locked());
}

#[test]
fn test_timeout_releases_partial_set() {
    let registry = registry_with_ab();

    // Another thread holds `b`.
    let holder = registry.clone();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel();
    let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
    let handle = std::thread::spawn(move || {
        let _b = holder.acquire(&["b"], None).unwrap();
        ready_tx.send(()).unwrap();
        let _ = done_rx.recv();
    });
    ready_rx.recv().unwrap();

    let result = registry.acquire(&["a", "b"], Some(Duration::from_millis(50)));
    assert!(matches!(result, Err(Error::LockTimeout { ref name, .. }) if name == "b"));
    assert!(!registry.get("a").unwrap().is_locked());
    assert!(registry.held_orders().is_empty());

    done_tx.send(()).unwrap();
    handle.join().unwrap();
    assert!(registry.acquire(&["a", "b"], Some(Duration::from_secs(1))).is_ok());
}

#[test]
fn test_try_acquire_is_all_or_nothing() {
    let registry = registry_with_ab();
    let b = registry.get("b").unwrap();
    let _held = b.inner().try_lock().unwrap();

    assert!(matches!(
        registry.try_acquire(&["a", "b"]),
        Err(Error::LockTimeout { waited, .. }) if waited.is_zero()
    ));
    assert!(!registry.get("a").unwrap().is_locked());
}

#[test]
fn test_threads_contending_in_opposite_orders_never_deadlock() {
    let registry = registry_with_ab();
    let inside = std::sync::Arc::new(AtomicBool::new(false));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            let inside = std::sync::Arc::clone(&inside);
            std::thread::spawn(move || {
                let names: &[&str] = if i % 2 == 0 { &["a", "b"] } else { &["b", "a"] };
                for _ in 0..20 {
                    let _guard = registry.acquire(names, Some(Duration::from_secs(10))).unwrap();
                    assert!(!inside.swap(true, Ordering::SeqCst));
                    inside.store(false, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_status_reports_owner_while_held() {
    let registry = registry_with_ab();
    let guard = registry.acquire(&["b"], None).unwrap();

    let status = registry.get_lock_status();
    assert_eq!(status.len(), 2);
    assert_eq!(status[0].name, "a");
    assert!(status[0].owner.is_none());
    assert!(status[0].acquired_at.is_none());
    assert_eq!(status[1].name, "b");
    assert_eq!(status[1].owner, Some(CallerId::current().to_string()));
    assert!(status[1].acquired_at.is_some());

    drop(guard);
    assert!(registry.get_lock_status().iter().all(|d| !d.is_held()));
}

#[test]
fn test_detect_potential_deadlocks_reports_long_holds() {
    let registry = registry_with_ab();
    assert!(registry.detect_potential_deadlocks(None).is_empty());

    let _guard = registry.acquire(&["a"], None).unwrap();
    std::thread::sleep(Duration::from_millis(20));
    let warnings = registry.detect_potential_deadlocks(Some(Duration::from_millis(5)));
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("'a'"));
    assert!(registry
        .detect_potential_deadlocks(Some(Duration::from_secs(3600)))
        .is_empty());
}

#[test]
fn test_unregister_and_reset() {
    let registry = registry_with_ab();
    assert!(registry.unregister("a").is_ok());
    assert!(matches!(
        registry.unregister("a"),
        Err(Error::UnknownLock { .. })
    ));
    // The order is free again once unregistered.
    assert!(registry.register("a2", 1, "").is_ok());

    registry.reset();
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_async_acquire_tracks_task_held_orders() {
    let registry = registry_with_ab();
    let holder = registry.clone();
    // The test body itself is not a task, so hold from a spawned one.
    let (guard, violation) = tokio::spawn(async move {
        let guard = holder.acquire_async(&["b", "a"], None).await.unwrap();
        let violation = holder.acquire_async(&["a"], None).await.map(|_| ());
        (guard, violation)
    })
    .await
    .unwrap();
    assert!(guard.caller().is_task());
    assert_eq!(guard.locked_names(), vec!["a", "b"]);
    assert!(matches!(violation, Err(Error::LockOrderViolation { .. })));

    // A different task has its own held stack.
    let other = registry.clone();
    let blocked = tokio::spawn(async move {
        other
            .acquire_async(&["a"], Some(Duration::from_millis(20)))
            .await
            .map(|_| ())
    })
    .await
    .unwrap();
    assert!(matches!(blocked, Err(Error::LockTimeout { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_and_blocking_callers_exclude_each_other() {
    let registry = registry_with_ab();
    let guard = registry.acquire_async(&["a"], None).await.unwrap();

    let blocking = registry.clone();
    let contender = std::thread::spawn(move || {
        blocking
            .acquire(&["a"], Some(Duration::from_millis(50)))
            .map(|_| ())
    });
    assert!(matches!(
        contender.join().unwrap(),
        Err(Error::LockTimeout { .. })
    ));
    drop(guard);

    let blocking = registry.clone();
    let contender = std::thread::spawn(move || {
        blocking
            .acquire(&["a"], Some(Duration::from_secs(5)))
            .map(|_| ())
    });
    assert!(contender.join().unwrap().is_ok());
}

#[tokio::test]
async fn test_cancelled_async_acquire_releases_partial_set() {
    let registry = registry_with_ab();
    let b = registry.get("b").unwrap();
    let held_b = b.inner().try_lock().unwrap();

    let pending = registry.acquire_async(&["a", "b"], Some(Duration::from_secs(60)));
    let outcome = tokio::time::timeout(Duration::from_millis(30), pending).await;
    assert!(outcome.is_err());

    assert!(!registry.get("a").unwrap().is_locked());
    assert!(registry.held_orders().is_empty());
    drop(held_b);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unbounded_timeout_waits_instead_of_overflowing() {
    let registry = registry_with_ab();
    let guard = registry.acquire(&["a", "b"], Some(Duration::MAX)).unwrap();
    drop(guard);

    let held = registry.acquire(&["b"], None).unwrap();
    let contender = registry.clone();
    let waiting = tokio::spawn(async move {
        contender
            .acquire_async(&["a", "b"], Some(Duration::MAX))
            .await
            .map(|guard| guard.locked_names().len())
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!waiting.is_finished());

    drop(held);
    assert_eq!(waiting.await.unwrap().unwrap(), 2);
}

//! Circuit breaker behaviour through the public call API.

use super::{circuit_breaker, CircuitBreaker, CircuitBreakerConfig, CircuitState};
use rampart_core::{CallError, Error};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Upstream(&'static str);

async fn fail(cb: &CircuitBreaker) -> Result<(), CallError<Upstream>> {
    cb.call(|| async { Err(Upstream("boom")) }).await
}

#[tokio::test]
async fn test_circuit_breaker_opens_on_failures() {
    let cb = circuit_breaker("db", 3, Duration::from_secs(60), None).unwrap();

    for _ in 0..3 {
        let result = fail(&cb).await;
        assert_eq!(result, Err(CallError::Inner(Upstream("boom"))));
    }
    assert_eq!(cb.state(), CircuitState::Open);

    let invoked = AtomicUsize::new(0);
    let result: Result<(), CallError<Upstream>> = cb
        .call(|| async {
            invoked.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;
    assert!(matches!(
        result,
        Err(CallError::Rejected(Error::CircuitOpen { ref name, .. })) if name == "db"
    ));
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_success_resets_failure_count() {
    let cb = circuit_breaker("db", 3, Duration::from_secs(60), None).unwrap();
    let _ = fail(&cb).await;
    let _ = fail(&cb).await;
    let ok: Result<u8, CallError<Upstream>> = cb.call(|| async { Ok(7) }).await;
    assert_eq!(ok, Ok(7));
    assert_eq!(cb.snapshot().failure_count, 0);

    let _ = fail(&cb).await;
    let _ = fail(&cb).await;
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_recovery_on_success() {
    let cb = circuit_breaker("api", 2, Duration::from_secs(30), None).unwrap();
    let _ = fail(&cb).await;
    let _ = fail(&cb).await;
    assert_eq!(cb.state(), CircuitState::Open);

    tokio::time::advance(Duration::from_secs(10)).await;
    let stats = cb.stats();
    assert_eq!(stats.retry_after, Some(Duration::from_secs(20)));
    assert!(fail(&cb).await.unwrap_err().is_rejected());

    tokio::time::advance(Duration::from_secs(20)).await;
    let result: Result<&str, CallError<Upstream>> = cb.call(|| async { Ok("up") }).await;
    assert_eq!(result, Ok("up"));
    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.snapshot().failure_count, 0);
    assert_eq!(cb.snapshot().next_attempt_time, None);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_failure_reopens() {
    let cb = circuit_breaker("api", 1, Duration::from_secs(5), None).unwrap();
    let _ = fail(&cb).await;
    let first_open = cb.snapshot().next_attempt_time.unwrap();

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(fail(&cb).await, Err(CallError::Inner(Upstream("boom"))));
    assert_eq!(cb.state(), CircuitState::Open);
    let reopened = cb.snapshot().next_attempt_time.unwrap();
    assert_eq!(reopened, first_open + Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_only_one_probe_while_half_open() {
    let cb = Arc::new(circuit_breaker("api", 1, Duration::from_secs(1), None).unwrap());
    let _ = fail(&cb).await;
    tokio::time::advance(Duration::from_secs(1)).await;

    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let probe = {
        let cb = Arc::clone(&cb);
        tokio::spawn(async move {
            cb.call(|| async move {
                let _ = release_rx.await;
                Ok::<_, Upstream>(())
            })
            .await
        })
    };
    tokio::task::yield_now().await;
    assert_eq!(cb.state(), CircuitState::HalfOpen);

    let second: Result<(), CallError<Upstream>> = cb.call(|| async { Ok(()) }).await;
    assert!(matches!(
        second,
        Err(CallError::Rejected(Error::CircuitOpen { .. }))
    ));

    release_tx.send(()).unwrap();
    assert!(probe.await.unwrap().is_ok());
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_probe_returns_slot() {
    let cb = circuit_breaker("api", 1, Duration::from_secs(1), None).unwrap();
    let _ = fail(&cb).await;
    tokio::time::advance(Duration::from_secs(1)).await;

    let pending = cb.call(|| std::future::pending::<Result<(), Upstream>>());
    assert!(tokio::time::timeout(Duration::from_millis(10), pending)
        .await
        .is_err());
    assert_eq!(cb.state(), CircuitState::HalfOpen);
    assert_eq!(cb.snapshot().half_open_calls, 0);

    let ok: Result<(), CallError<Upstream>> = cb.call(|| async { Ok(()) }).await;
    assert!(ok.is_ok());
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_call_with_ignores_uncounted_errors() {
    let cb = circuit_breaker("search", 2, Duration::from_secs(60), None).unwrap();
    for _ in 0..5 {
        let result: Result<(), CallError<Upstream>> = cb
            .call_with(
                |e: &Upstream| e.0 != "not found",
                || async { Err(Upstream("not found")) },
            )
            .await;
        assert_eq!(result, Err(CallError::Inner(Upstream("not found"))));
    }
    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.snapshot().failure_count, 0);
}

#[test]
fn test_classified_calls_count_only_listed_kinds() {
    let cb = circuit_breaker("net", 1, Duration::from_secs(60), Some(&["TimedOut"][..])).unwrap();
    let not_found = cb.call_blocking_classified(|| {
        Err::<(), _>(std::io::Error::from(std::io::ErrorKind::NotFound))
    });
    assert!(matches!(not_found, Err(CallError::Inner(_))));
    assert_eq!(cb.state(), CircuitState::Closed);

    let timed_out = cb.call_blocking_classified(|| {
        Err::<(), _>(std::io::Error::from(std::io::ErrorKind::TimedOut))
    });
    assert!(matches!(timed_out, Err(CallError::Inner(_))));
    assert_eq!(cb.state(), CircuitState::Open);
}

#[test]
fn test_call_blocking_shares_state() {
    let cb = circuit_breaker("fs", 2, Duration::from_secs(60), None).unwrap();
    for _ in 0..2 {
        let result = cb.call_blocking(|| Err::<(), _>(std::io::Error::other("disk")));
        assert!(matches!(result, Err(CallError::Inner(_))));
    }
    assert_eq!(cb.state(), CircuitState::Open);
    let rejected = cb.call_blocking(|| Ok::<_, std::io::Error>(()));
    assert!(rejected.unwrap_err().is_rejected());

    cb.reset();
    assert_eq!(cb.state(), CircuitState::Closed);
    assert!(cb.call_blocking(|| Ok::<_, std::io::Error>(())).is_ok());
}

#[test]
fn test_unbounded_recovery_timeout_opens_without_overflow() {
    let cb = CircuitBreaker::new("vault", CircuitBreakerConfig::new(1, Duration::MAX)).unwrap();
    let failed = cb.call_blocking(|| Err::<(), _>(Upstream("sealed")));
    assert!(matches!(failed, Err(CallError::Inner(Upstream("sealed")))));
    assert_eq!(cb.state(), CircuitState::Open);

    let rejected = cb.call_blocking(|| Ok::<_, Upstream>(()));
    assert!(matches!(
        rejected,
        Err(CallError::Rejected(Error::CircuitOpen { remaining, .. })) if remaining == Duration::MAX
    ));
    assert_eq!(cb.stats().retry_after, Some(Duration::MAX));

    cb.reset();
    assert!(cb.call_blocking(|| Ok::<_, Upstream>(())).is_ok());
}

#[test]
fn test_panicking_probe_releases_slot() {
    let cb = CircuitBreaker::new(
        "fs",
        CircuitBreakerConfig::new(1, Duration::ZERO),
    )
    .unwrap();
    let _ = cb.call_blocking(|| Err::<(), _>(Upstream("boom")));
    assert_eq!(cb.state(), CircuitState::Open);

    let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = cb.call_blocking(|| -> Result<(), Upstream> { panic!("probe panicked") });
    }));
    assert!(caught.is_err());
    assert_eq!(cb.state(), CircuitState::HalfOpen);
    assert_eq!(cb.snapshot().half_open_calls, 0);
}

#[test]
fn test_invalid_config_rejected() {
    assert!(matches!(
        circuit_breaker("bad", 0, Duration::from_secs(1), None),
        Err(Error::Configuration { .. })
    ));
}

#[tokio::test]
async fn test_stats_serialize() {
    let cb = circuit_breaker("db", 3, Duration::from_secs(60), None).unwrap();
    let _ = fail(&cb).await;
    let json = serde_json::to_value(cb.stats()).unwrap();
    assert_eq!(json["name"], "db");
    assert_eq!(json["state"], "Closed");
    assert_eq!(json["failure_count"], 1);
}

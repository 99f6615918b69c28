//! Integration tests for composed resilience primitives.
//!
//! These tests exercise the primitives together the way an application
//! would: admission first, then the breaker, with retries around both.

use rampart::{
    circuit_breaker, retry, Backoff, Bulkhead, BulkheadConfig, CallError, CircuitState, Error,
    NoopSleeper, RateLimitConfig, Resilience, ResilienceConfig, RetryPolicy,
    TokenBucketRateLimiter,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ServiceError(&'static str);

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "service error: {}", self.0)
    }
}

impl std::error::Error for ServiceError {}

impl rampart::ErrorKind for ServiceError {
    fn kind(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed(self.0)
    }
}

#[tokio::test]
async fn test_retry_around_breaker_stops_once_circuit_opens() {
    let breaker = circuit_breaker("inventory", 2, Duration::from_secs(60), None).unwrap();
    let executor = retry(
        RetryPolicy::new(5, Duration::from_millis(10), Backoff::Fixed)
            .with_retryable_errors(["unavailable"]),
    )
    .unwrap()
    .with_sleeper(Arc::new(NoopSleeper));

    let calls = AtomicUsize::new(0);
    let result: Result<(), CallError<ServiceError>> = executor
        .execute(|| {
            breaker.call(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ServiceError("unavailable"))
            })
        })
        .await;

    // Two real failures open the circuit; the third attempt is rejected
    // with CircuitOpen, which this policy does not retry.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(matches!(
        result,
        Err(CallError::Rejected(Error::CircuitOpen { .. }))
    ));
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test]
async fn test_retry_recovers_through_breaker() {
    let breaker = circuit_breaker("inventory", 5, Duration::from_secs(60), None).unwrap();
    let executor = retry(RetryPolicy::new(4, Duration::from_millis(1), Backoff::Linear))
        .unwrap()
        .with_sleeper(Arc::new(NoopSleeper));

    let calls = AtomicUsize::new(0);
    let result: Result<&str, CallError<ServiceError>> = executor
        .execute(|| {
            breaker.call(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ServiceError("flaky"))
                } else {
                    Ok("in stock")
                }
            })
        })
        .await;

    assert_eq!(result.unwrap(), "in stock");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.snapshot().failure_count, 0);
}

#[tokio::test]
async fn test_bulkhead_around_breaker_flattens_errors() {
    let bulkhead = Bulkhead::new("db", BulkheadConfig::new(1, 0, Duration::from_secs(1))).unwrap();
    let breaker = circuit_breaker("db", 1, Duration::from_secs(60), None).unwrap();

    let first = bulkhead
        .execute(|| breaker.call(|| async { Err::<(), _>(ServiceError("down")) }))
        .await
        .map_err(CallError::flatten);
    assert_eq!(first, Err(CallError::Inner(ServiceError("down"))));

    let second = bulkhead
        .execute(|| breaker.call(|| async { Ok::<_, ServiceError>(()) }))
        .await
        .map_err(CallError::flatten);
    assert!(matches!(
        second,
        Err(CallError::Rejected(Error::CircuitOpen { .. }))
    ));
    assert_eq!(bulkhead.get_status().active, 0);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limiter_then_bulkhead_admission() {
    let limiter = TokenBucketRateLimiter::new(2.0, 1.0).unwrap();
    let bulkhead = Bulkhead::new("api", BulkheadConfig::new(4, 4, Duration::from_secs(1))).unwrap();

    let mut served = 0;
    for _ in 0..4 {
        if !limiter.is_allowed() {
            continue;
        }
        let result: Result<(), CallError<ServiceError>> =
            bulkhead.execute(|| async { Ok(()) }).await;
        assert!(result.is_ok());
        served += 1;
    }
    assert_eq!(served, 2);

    limiter.acquire(Some(Duration::from_secs(2))).await.unwrap();
    assert!(limiter.get_current_tokens() < 1.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_context_shares_primitives_across_tasks() {
    let mut config = ResilienceConfig::default();
    config
        .bulkheads
        .insert("db".into(), BulkheadConfig::new(2, 16, Duration::from_secs(10)));
    let resilience = Arc::new(Resilience::new(config).unwrap());
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let resilience = Arc::clone(&resilience);
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            tokio::spawn(async move {
                let db = resilience.bulkheads().get("db").unwrap();
                let breaker = resilience.circuit_breaker("db").unwrap();
                db.execute(|| {
                    breaker.call(|| async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, ServiceError>(())
                    })
                })
                .await
                .map_err(CallError::flatten)
            })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap().is_ok());
    }
    assert!(peak.load(Ordering::SeqCst) <= 2);

    let status = resilience.status();
    assert_eq!(status.bulkheads[0].active, 0);
    assert_eq!(status.circuit_breakers[0].state, CircuitState::Closed);
}

#[tokio::test]
async fn test_configured_rate_limiter_is_shared() {
    let mut config = ResilienceConfig::default();
    config
        .rate_limits
        .insert("uploads".into(), RateLimitConfig::new(3.0, 0.0));
    let resilience = Resilience::new(config).unwrap();

    let first = resilience.rate_limiter("uploads").unwrap();
    let second = resilience.rate_limiter("uploads").unwrap();
    assert!(first.is_allowed());
    assert!(second.is_allowed());
    assert!(first.is_allowed());
    assert!(!second.is_allowed());
}

#[test]
fn test_global_context_is_a_single_instance() {
    let a = rampart::global();
    let b = rampart::global();
    assert!(std::ptr::eq(a, b));
    assert!(matches!(
        rampart::init_global(ResilienceConfig::default()),
        Err(Error::Configuration { .. })
    ));
}

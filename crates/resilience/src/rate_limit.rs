//! Token bucket rate limiting.
//!
//! The bucket holds up to `capacity` fractional tokens and gains
//! `refill_rate` tokens per second. Each admitted operation spends one
//! whole token; a denied check spends nothing.

use parking_lot::Mutex;
use rampart_core::{Error, Result, DEFAULT_BUCKET_CAPACITY, DEFAULT_REFILL_RATE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Configuration for rate limiting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum tokens the bucket holds; also the largest possible burst
    pub capacity: f64,
    /// Tokens added per second
    pub refill_rate: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUCKET_CAPACITY,
            refill_rate: DEFAULT_REFILL_RATE,
        }
    }
}

impl RateLimitConfig {
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            capacity,
            refill_rate,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(Error::configuration(format!(
                "rate limit capacity must be a positive number, got {}",
                self.capacity
            )));
        }
        if !self.refill_rate.is_finite() || self.refill_rate < 0.0 {
            return Err(Error::configuration(format!(
                "rate limit refill_rate must be zero or positive, got {}",
                self.refill_rate
            )));
        }
        Ok(())
    }
}

/// Point-in-time view of a limiter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimiterStatus {
    pub name: String,
    pub capacity: f64,
    pub refill_rate: f64,
    pub tokens: f64,
}

/// Token bucket state
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn refill(&mut self, capacity: f64, refill_rate: f64) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_refill = now;
    }
}

#[derive(Debug)]
pub struct TokenBucketRateLimiter {
    name: String,
    config: RateLimitConfig,
    bucket: Mutex<TokenBucket>,
}

impl TokenBucketRateLimiter {
    /// Create a full bucket
    pub fn new(capacity: f64, refill_rate: f64) -> Result<Self> {
        Self::with_config("default", RateLimitConfig::new(capacity, refill_rate))
    }

    pub fn with_config(name: impl Into<String>, config: RateLimitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            bucket: Mutex::new(TokenBucket {
                tokens: config.capacity,
                last_refill: Instant::now(),
            }),
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Spend one token if one is available
    pub fn is_allowed(&self) -> bool {
        let mut bucket = self.bucket.lock();
        bucket.refill(self.config.capacity, self.config.refill_rate);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            tracing::trace!(limiter = %self.name, tokens = bucket.tokens, "rate limited");
            false
        }
    }

    /// Tokens available right now, including any accrued since the last
    /// check
    pub fn get_current_tokens(&self) -> f64 {
        let mut bucket = self.bucket.lock();
        bucket.refill(self.config.capacity, self.config.refill_rate);
        bucket.tokens
    }

    pub fn status(&self) -> RateLimiterStatus {
        RateLimiterStatus {
            name: self.name.clone(),
            capacity: self.config.capacity,
            refill_rate: self.config.refill_rate,
            tokens: self.get_current_tokens(),
        }
    }

    /// Wait until a token is available and spend it. Sleeps exactly until
    /// the next token is due instead of polling. Gives up early, without
    /// waiting out the budget, when the next token cannot arrive within
    /// `timeout` (or at all, with a zero refill rate).
    pub async fn acquire(&self, timeout: Option<Duration>) -> Result<()> {
        let start = Instant::now();
        let deadline = timeout.and_then(|t| start.checked_add(t));
        loop {
            let shortfall = {
                let mut bucket = self.bucket.lock();
                bucket.refill(self.config.capacity, self.config.refill_rate);
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return Ok(());
                }
                1.0 - bucket.tokens
            };

            let now = Instant::now();
            let Some(wake_at) = self
                .time_to_accrue(shortfall)
                .and_then(|wait| now.checked_add(wait))
            else {
                return Err(self.limited(start));
            };
            if deadline.is_some_and(|deadline| wake_at > deadline) {
                return Err(self.limited(start));
            }
            tokio::time::sleep_until(wake_at).await;
        }
    }

    /// Time for `shortfall` tokens to accrue, rounded up to the next
    /// nanosecond. `None` if tokens never accrue.
    fn time_to_accrue(&self, shortfall: f64) -> Option<Duration> {
        if self.config.refill_rate <= 0.0 {
            return None;
        }
        let nanos = (shortfall / self.config.refill_rate * 1e9).ceil().max(1.0);
        Some(Duration::from_nanos(nanos as u64))
    }

    fn limited(&self, start: Instant) -> Error {
        let waited = start.elapsed();
        tracing::debug!(limiter = %self.name, ?waited, "no token within budget");
        Error::rate_limited(&self.name, waited)
    }
}

// In-memory rate limiter for the lineup suggestion endpoint.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::request::Parts;

/// Error returned when a rate limit is exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitError {
    pub max: usize,
    pub window: Duration,
}

impl std::fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "max {} lineup requests per {} seconds",
            self.max,
            self.window.as_secs()
        )
    }
}

/// Thread-safe sliding-window limiter keyed by client.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max: usize,
    window: Duration,
    trust_forwarded_for: bool,
    inner: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
}

impl RateLimiter {
    /// `max == 0` disables limiting.
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            trust_forwarded_for: false,
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Key clients by the first `X-Forwarded-For` hop instead of the peer
    /// address. Only enable behind a proxy that overwrites the header.
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Limiter allowing `max` events per client per hour.
    pub fn per_hour(max: usize) -> Self {
        Self::new(max, Duration::from_secs(3600))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check if the client is within the limit.
    /// If within limits, records the event and returns Ok(()).
    pub fn check_limit(&self, client: &str) -> Result<(), RateLimitError> {
        if self.max == 0 {
            return Ok(());
        }
        let mut map = self.lock();
        let now = Instant::now();
        let window = self.window;

        // Drop clients whose events have all expired.
        map.retain(|_, entries| {
            entries.retain(|t| now.duration_since(*t) < window);
            !entries.is_empty()
        });

        let entries = map.entry(client.to_string()).or_default();
        if entries.len() >= self.max {
            return Err(RateLimitError {
                max: self.max,
                window,
            });
        }

        entries.push(now);
        Ok(())
    }

    #[cfg(test)]
    fn current_count(&self, client: &str) -> usize {
        let mut map = self.lock();
        let now = Instant::now();
        let window = self.window;

        if let Some(entries) = map.get_mut(client) {
            entries.retain(|t| now.duration_since(*t) < window);
            entries.len()
        } else {
            0
        }
    }
}

/// Identifies the caller for rate limiting: the peer address, or the first
/// `X-Forwarded-For` hop when the limiter trusts the proxy in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl<S> FromRequestParts<S> for ClientKey
where
    RateLimiter: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if RateLimiter::from_ref(state).trust_forwarded_for {
            let forwarded = parts
                .headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(ip) = forwarded {
                return Ok(ClientKey(ip.to_string()));
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientKey(peer))
    }
}

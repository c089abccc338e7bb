use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::Mutex;

use crate::error::{Result, ShopError};

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window request counter keyed by client address.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    pub fn check(&self, key: &str) -> Result<()> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<()> {
        let mut windows = self.windows.lock();

        // prune expired windows once the map grows
        if windows.len() > 1024 {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window { count: 0, started: now });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window { count: 0, started: now };
        }

        entry.count += 1;
        if entry.count > self.max_requests {
            let retry_after = self.window.saturating_sub(now.duration_since(entry.started));
            return Err(ShopError::RateLimited { retry_after });
        }
        Ok(())
    }
}

/// Client identity for limiting: peer address, then the first
/// `X-Forwarded-For` hop, then `unknown`.
pub fn client_key(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    if let Some(addr) = peer {
        return addr.ip().to_string();
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn limit_by_client(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(peer, request.headers());

    if let Err(err) = limiter.check(&key) {
        tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        return Err(err);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::per_minute(3);
        let t0 = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at("10.0.0.1", t0).is_ok());
        }
        match limiter.check_at("10.0.0.1", t0 + Duration::from_secs(20)) {
            Err(ShopError::RateLimited { retry_after }) => assert_eq!(retry_after, Duration::from_secs(40)),
            other => panic!("expected rate limit, got {other:?}"),
        }
        assert!(limiter.check_at("10.0.0.2", t0).is_ok());
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let t0 = Instant::now();
        assert!(limiter.check_at("k", t0).is_ok());
        assert!(limiter.check_at("k", t0 + Duration::from_secs(5)).is_err());
        assert!(limiter.check_at("k", t0 + Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn client_key_prefers_peer_then_forwarded_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(None, &headers), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_key(None, &headers), "203.0.113.9");

        let peer: SocketAddr = "192.0.2.4:5555".parse().unwrap();
        assert_eq!(client_key(Some(peer), &headers), "192.0.2.4");
    }
}

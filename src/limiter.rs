// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for the public API prefix.
//!
//! Each client address gets a hit counter that resets once the window
//! elapses. Every request counts, including rejected ones. Responses carry
//! the standard `RateLimit-*` headers so clients can back off.

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::handlers::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
pub const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Hit counter for one client.
#[derive(Debug)]
struct Window {
    hits: u32,
    started: Instant,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            hits: 0,
            started: now,
        }
    }

    fn expired(&self, now: Instant, length: Duration) -> bool {
        now.saturating_duration_since(self.started) >= length
    }

    fn reset_in(&self, now: Instant, length: Duration) -> Duration {
        length.saturating_sub(now.saturating_duration_since(self.started))
    }
}

/// Thread-safe per-client rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: RwLock<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Count a request from `ip` and decide whether it may proceed.
    pub async fn check_ip(&self, ip: IpAddr) -> RateLimitResult {
        self.check_ip_at(ip, Instant::now()).await
    }

    async fn check_ip_at(&self, ip: IpAddr, now: Instant) -> RateLimitResult {
        let length = self.config.window_duration();

        let mut windows = self.windows.write().await;
        let window = windows.entry(ip).or_insert_with(|| Window::new(now));
        if window.expired(now, length) {
            *window = Window::new(now);
        }

        window.hits = window.hits.saturating_add(1);
        let reset_in = window.reset_in(now, length);

        if window.hits > self.config.max_requests {
            debug!(%ip, hits = window.hits, ?reset_in, "IP rate limit exceeded");
            RateLimitResult::Limited {
                retry_after: reset_in,
            }
        } else {
            RateLimitResult::Allowed {
                remaining: self.config.max_requests - window.hits,
                reset_in,
            }
        }
    }

    /// Drop windows that have already elapsed (called periodically).
    pub async fn cleanup(&self) {
        self.cleanup_at(Instant::now()).await;
    }

    async fn cleanup_at(&self, now: Instant) {
        let length = self.config.window_duration();
        let mut windows = self.windows.write().await;
        windows.retain(|_, window| !window.expired(now, length));
    }

    /// Number of clients currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.windows.read().await.len()
    }

    /// Write the `RateLimit-*` headers for `result`.
    pub fn apply_headers(&self, headers: &mut HeaderMap, result: &RateLimitResult) {
        let (remaining, reset) = match result {
            RateLimitResult::Allowed {
                remaining,
                reset_in,
            } => (*remaining, *reset_in),
            RateLimitResult::Limited { retry_after } => (0, *retry_after),
        };
        let reset_secs = ceil_secs(reset);
        let window_secs = ceil_secs(self.config.window_duration());

        headers.insert(
            RATELIMIT_POLICY,
            header_value(format!("{};w={}", self.config.max_requests, window_secs)),
        );
        headers.insert(RATELIMIT_LIMIT, header_value(self.config.max_requests));
        headers.insert(RATELIMIT_REMAINING, header_value(remaining));
        headers.insert(RATELIMIT_RESET, header_value(reset_secs));

        if let RateLimitResult::Limited { .. } = result {
            headers.insert(header::RETRY_AFTER, header_value(reset_secs));
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

fn header_value(value: impl ToString) -> HeaderValue {
    // Only ever called with numbers and `<n>;w=<n>`, which are valid.
    HeaderValue::from_str(&value.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

/// Client key for a request: the peer address, or the unspecified address
/// when the connection info is unavailable.
pub fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware applying the limiter to the routes it wraps.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    let result = state.limiter.check_ip(ip).await;

    let mut response = match &result {
        RateLimitResult::Allowed { remaining, .. } => {
            debug!(%ip, remaining, "Request allowed");
            next.run(request).await
        }
        RateLimitResult::Limited { retry_after } => {
            info!(
                %ip,
                path = %request.uri().path(),
                retry_after_secs = retry_after.as_secs(),
                "Request rate limited"
            );
            AppError::RateLimited {
                retry_after: *retry_after,
            }
            .into_response()
        }
    };

    state.limiter.apply_headers(response.headers_mut(), &result);
    response
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Cross-origin policy.
//!
//! [`OriginPolicy::decide`] answers whether a browser origin may call the
//! API. [`enforce_origin`] turns a denial into a 403 before anything else
//! runs, and [`cors_layer`] emits the CORS response headers for origins the
//! policy accepts.

use crate::config::OriginConfig;
use crate::error::AppError;
use crate::handlers::AppState;
use axum::{
    extract::{Request, State},
    http::{header, request, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};

/// Substring that marks a local development origin.
const LOCAL_DEVELOPMENT_HOST: &str = "localhost";

/// Outcome of an origin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginDecision {
    /// No `Origin` header: same-origin or non-browser client
    NoOrigin,
    /// Origin is on the allow-list
    Listed,
    /// Allow-list contains `*`
    Wildcard,
    /// Localhost origin outside production
    LocalDevelopment,
    /// Not permitted
    Denied,
}

impl OriginDecision {
    pub fn is_allowed(self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// Static allow-list plus deployment mode. Read-only after startup.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed_origins: Vec<String>,
    production: bool,
}

impl OriginPolicy {
    pub fn new(config: &OriginConfig) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            production: config.production,
        }
    }

    /// Decide whether `origin` may make a cross-origin call.
    pub fn decide(&self, origin: Option<&str>) -> OriginDecision {
        let origin = match origin {
            Some(o) if !o.is_empty() => o,
            _ => return OriginDecision::NoOrigin,
        };

        if self.allowed_origins.iter().any(|o| o == origin) {
            OriginDecision::Listed
        } else if self.allowed_origins.iter().any(|o| o == "*") {
            OriginDecision::Wildcard
        } else if !self.production && origin.contains(LOCAL_DEVELOPMENT_HOST) {
            OriginDecision::LocalDevelopment
        } else {
            OriginDecision::Denied
        }
    }
}

/// Reject requests from origins the policy denies with `403 CORS blocked`.
pub async fn enforce_origin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = match request.headers().get(header::ORIGIN) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(s) => Some(s.to_string()),
            Err(_) => {
                warn!("CORS blocked origin with non-ASCII header value");
                return AppError::OriginDenied {
                    origin: String::from_utf8_lossy(value.as_bytes()).into_owned(),
                }
                .into_response();
            }
        },
    };

    match state.origin_policy.decide(origin.as_deref()) {
        OriginDecision::Denied => {
            let origin = origin.unwrap_or_default();
            warn!(origin = %origin, "CORS blocked origin");
            AppError::OriginDenied { origin }.into_response()
        }
        decision => {
            debug!(origin = ?origin, ?decision, "Origin allowed");
            next.run(request).await
        }
    }
}

/// CORS headers for origins accepted by `policy`, with credentials.
pub fn cors_layer(policy: Arc<OriginPolicy>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &request::Parts| {
                policy.decide(origin.to_str().ok()).is_allowed()
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

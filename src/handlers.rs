// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact relay service.

use crate::config::Config;
use crate::contact::{ContactService, ContactSubmission};
use crate::error::AppError;
use crate::limiter::RateLimiter;
use crate::mailer::MailDispatcher;
use crate::origin::OriginPolicy;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::Uri,
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub origin_policy: Arc<OriginPolicy>,
    pub contact: ContactService,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, dispatcher: Arc<dyn MailDispatcher>) -> Self {
        Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            origin_policy: Arc::new(OriginPolicy::new(&config.origin)),
            contact: ContactService::new(&config.mail, dispatcher),
            config,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// Accepted submission response.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Accept a contact form submission and relay it by email.
///
/// Mounted on both `/api/contact` and `/contact` so that a reverse proxy
/// stripping the `/api` prefix still reaches it.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<Json<ContactResponse>, AppError> {
    let submission = match payload {
        Ok(Json(submission)) => submission,
        // A form post without a JSON content type carries no fields.
        Err(JsonRejection::MissingJsonContentType(rejection)) => {
            debug!(error = %rejection, "Contact request body is not JSON");
            ContactSubmission::default()
        }
        Err(rejection) => {
            warn!(error = %rejection, "Rejected contact request body");
            return Err(AppError::from(rejection));
        }
    };

    debug!(
        has_interest = submission.interest.is_some(),
        "Received contact submission"
    );

    state.contact.handle(&submission).await?;
    Ok(Json(ContactResponse { success: true }))
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types and their HTTP representation.
//!
//! Every variant renders as `{"error": "..."}`. Dispatch and internal
//! failures render a fixed message; their cause is only logged.

use crate::mailer::DispatchError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const DISPATCH_FAILED_MESSAGE: &str = "Failed to send message. Please try again later.";
pub const ORIGIN_DENIED_MESSAGE: &str = "CORS blocked";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later.";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Client-facing validation failures, in the order they are checked.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name, email, and message are required.")]
    MissingFields,

    #[error("Invalid email format.")]
    InvalidEmail,

    #[error("Invalid input. Please check your entries.")]
    EmptyAfterSanitize,
}

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("origin not allowed: {origin}")]
    OriginDenied { origin: String },

    #[error("rate limit exceeded, retry in {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("mail dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("rejected request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("no route for {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::OriginDenied { .. } => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Dispatch(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Body(rejection) => rejection.status(),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message safe to show to the client.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::OriginDenied { .. } => ORIGIN_DENIED_MESSAGE.to_string(),
            Self::RateLimited { .. } => RATE_LIMITED_MESSAGE.to_string(),
            Self::Dispatch(_) => DISPATCH_FAILED_MESSAGE.to_string(),
            Self::Body(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "Request body too large.".to_string()
            }
            Self::Body(_) => "Invalid request body.".to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! Accepts contact form submissions from a public website and relays them
//! by email to a fixed recipient:
//!
//! - Origin allow-list enforcement (403 on denial)
//! - Per-IP fixed-window rate limiting on the API prefix (100 per 15 min)
//! - Presence and email format validation
//! - HTML escaping of every field before composition
//! - SMTP dispatch with client-safe error mapping

pub mod config;
pub mod contact;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod origin;
pub mod routes;
pub mod sanitizer;

pub use config::Config;
pub use contact::{ContactService, ContactSubmission, SanitizedSubmission};
pub use error::{AppError, ValidationError};
pub use handlers::AppState;
pub use limiter::{RateLimitResult, RateLimiter};
pub use mailer::{DispatchError, MailDispatcher, OutboundMessage, SmtpDispatcher};
pub use origin::{OriginDecision, OriginPolicy};
pub use routes::router;

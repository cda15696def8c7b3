// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Receives the website contact form and forwards it by email.
//!
//! ## Endpoints
//!
//! - `GET /api/health`: liveness with server time
//! - `POST /api/contact`: submit the form (rate limited)
//! - `POST /contact`: same handler, for proxies that strip `/api`
//!
//! ## Configuration
//!
//! Loaded from environment variables (and `.env` if present):
//!
//! - `EMAIL`, `PASS`: sender address and SMTP credentials (required)
//! - `CONTACT_TO`: recipient (default: `EMAIL`)
//! - `CORS_ORIGIN`: comma-separated allowed origins
//! - `ENVIRONMENT`: `production` disables the localhost allowance
//! - `SMTP_HOST`: relay host (default: smtp.gmail.com)
//! - `SITE_NAME`: label for subject and sender (default: HTA+)
//! - `BIND_ADDR`: server bind address (default: 0.0.0.0:3002)
//! - `RATE_LIMIT_WINDOW_MS`, `RATE_LIMIT_MAX`: window length and cap

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{config::Config, handlers::AppState, mailer::SmtpDispatcher, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the variables may come from the environment.
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        bind_addr = %config.bind_addr,
        recipient = %config.mail.recipient(),
        smtp_host = %config.mail.smtp_host,
        allowed_origins = ?config.origin.allowed_origins,
        production = config.origin.production,
        window_ms = config.rate_limit.window_ms,
        max_requests = config.rate_limit.max_requests,
        "Starting contact relay"
    );

    let dispatcher = Arc::new(SmtpDispatcher::new(&config.mail)?);
    let state = Arc::new(AppState::new(config, dispatcher));

    // Spawn cleanup task
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup().await;
        }
    });

    let app = routes::router(state.clone());

    // Start server
    let addr: SocketAddr = state.config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

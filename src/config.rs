// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay.
//!
//! Everything is read from the process environment once at startup (a `.env`
//! file is honoured by the binary). `EMAIL` and `PASS` are mandatory; every
//! other setting has a default suitable for local development.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Variables that must be present before the service accepts traffic.
pub const REQUIRED_VARS: &[&str] = &["EMAIL", "PASS"];

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Configuration for the contact relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:3002)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Outbound mail settings
    pub mail: MailConfig,

    /// Cross-origin policy
    #[serde(default)]
    pub origin: OriginConfig,

    /// Rate limiting for the public API prefix
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Maximum accepted JSON body in bytes (default: 200 KiB)
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

/// Sender identity, credentials and recipient.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Sender address, also the SMTP login
    pub sender: String,

    #[serde(skip_serializing)]
    pub password: String,

    /// Distinct recipient; falls back to the sender
    #[serde(default)]
    pub recipient: Option<String>,

    /// SMTP relay host (default: smtp.gmail.com)
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// Label used in the subject line and sender display name
    #[serde(default = "default_site_name")]
    pub site_name: String,
}

/// Origin allow-list and deployment mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Production mode disables the localhost allowance
    #[serde(default)]
    pub production: bool,
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds (default: 900000, i.e. 15 minutes)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Requests allowed per client per window (default: 100)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:3002".to_string()
}

fn default_body_limit() -> usize {
    200 * 1024
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_site_name() -> String {
    "HTA+".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8080".to_string(),
    ]
}

fn default_window_ms() -> u64 {
    15 * 60 * 1000
}

fn default_max_requests() -> u32 {
    100
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            production: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("smtp_host", &self.smtp_host)
            .field("site_name", &self.site_name)
            .finish()
    }
}

impl MailConfig {
    /// Mail settings with defaults for everything except the credentials.
    pub fn new(sender: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            password: password.into(),
            recipient: None,
            smtp_host: default_smtp_host(),
            site_name: default_site_name(),
        }
    }

    /// Where submissions are delivered.
    pub fn recipient(&self) -> &str {
        self.recipient.as_deref().unwrap_or(&self.sender)
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Config {
    /// Configuration with the given mail credentials and defaults elsewhere.
    pub fn new(mail: MailConfig) -> Self {
        Self {
            bind_addr: default_bind_addr(),
            mail,
            origin: OriginConfig::default(),
            rate_limit: RateLimitConfig::default(),
            body_limit_bytes: default_body_limit(),
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&'static str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let mut mail = MailConfig::new(
            get("EMAIL").unwrap_or_default(),
            get("PASS").unwrap_or_default(),
        );
        mail.recipient = get("CONTACT_TO");
        if let Some(host) = get("SMTP_HOST") {
            mail.smtp_host = host;
        }
        if let Some(site) = get("SITE_NAME") {
            mail.site_name = site;
        }

        let mut config = Config::new(mail);

        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(origins) = get("CORS_ORIGIN") {
            config.origin.allowed_origins = parse_origin_list(&origins);
        }
        config.origin.production = get("ENVIRONMENT")
            .map(|v| v.trim().eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        if let Some(v) = get("RATE_LIMIT_WINDOW_MS") {
            config.rate_limit.window_ms = parse_number("RATE_LIMIT_WINDOW_MS", &v)?;
        }
        if let Some(v) = get("RATE_LIMIT_MAX") {
            config.rate_limit.max_requests = parse_number("RATE_LIMIT_MAX", &v)?;
        }

        Ok(config)
    }
}

/// Split a comma-separated origin list, trimming each entry.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .inspect(|o| {
            if *o != "*" && url::Url::parse(o).is_err() {
                warn!(origin = %o, "Allow-listed origin is not a valid URL and will only match verbatim");
            }
        })
        .map(String::from)
        .collect()
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}

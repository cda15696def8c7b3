// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Router construction and request helpers.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use contact_relay::{
    config::{Config, MailConfig},
    handlers::AppState,
    mailer::MailDispatcher,
    routes,
};
use serde_json::Value;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower::ServiceExt;

pub const SENDER: &str = "site@example.com";
pub const RECIPIENT: &str = "inbox@example.com";

/// Configuration used by the tests unless overridden.
pub fn test_config() -> Config {
    let mut mail = MailConfig::new(SENDER, "secret");
    mail.recipient = Some(RECIPIENT.to_string());
    Config::new(mail)
}

/// A router plus handles on its shared state.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new(config: Config, dispatcher: Arc<dyn MailDispatcher>) -> Self {
        let state = Arc::new(AppState::new(config, dispatcher));
        Self {
            router: routes::router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Builder for requests arriving from a given peer address.
pub struct RequestSpec {
    method: Method,
    uri: String,
    ip: IpAddr,
    origin: Option<String>,
    content_type: &'static str,
    body: Option<String>,
}

impl RequestSpec {
    pub fn get(uri: &str) -> Self {
        Self {
            method: Method::GET,
            uri: uri.to_string(),
            ip: "203.0.113.7".parse().unwrap(),
            origin: None,
            content_type: "application/json",
            body: None,
        }
    }

    pub fn post_json(uri: &str, body: &Value) -> Self {
        Self::post_raw(uri, body.to_string())
    }

    pub fn post_raw(uri: &str, body: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            body: Some(body.into()),
            ..Self::get(uri)
        }
    }

    pub fn options(uri: &str) -> Self {
        Self {
            method: Method::OPTIONS,
            ..Self::get(uri)
        }
    }

    pub fn from_ip(mut self, ip: IpAddr) -> Self {
        self.ip = ip;
        self
    }

    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(origin) = &self.origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        let mut request = match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, self.content_type)
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(self.ip, 40000)));
        request
    }
}

/// Helper to extract JSON response
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Helper to extract the raw response body
pub async fn text_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

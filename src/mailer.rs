// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound mail dispatch.
//!
//! The contact handler only sees [`MailDispatcher`]; the SMTP transport
//! behind it is built once at startup and shared by all requests.

use crate::config::MailConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Mail dispatch failures. Never shown to clients.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid {field} address {value:?}: {reason}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Fixed sender identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.address)
    }
}

/// A composed, ready-to-send contact message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from: Sender,
    pub reply_to: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Something that can deliver an [`OutboundMessage`].
#[async_trait]
pub trait MailDispatcher: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError>;
}

/// SMTP relay with login credentials, over TLS.
pub struct SmtpDispatcher {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpDispatcher {
    /// Build the transport. Fails if the sender address is unusable or the
    /// relay host cannot be configured.
    pub fn new(config: &MailConfig) -> Result<Self, DispatchError> {
        parse_address("sender", &config.sender)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| DispatchError::Transport(e.to_string()))?
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl MailDispatcher for SmtpDispatcher {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError> {
        let email = build_message(message)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        debug!(code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }
}

/// Convert an [`OutboundMessage`] into a plain-text MIME message.
///
/// The reply-to address comes from the visitor and has been HTML-escaped,
/// so it may no longer parse (`o'brien@` becomes `o&#x27;brien@`). The
/// message is still sent in that case, without a `Reply-To` header; the
/// address remains in the body.
pub fn build_message(message: &OutboundMessage) -> Result<Message, DispatchError> {
    let from = Mailbox::new(
        Some(message.from.name.clone()),
        parse_address("from", &message.from.address)?,
    );
    let to = Mailbox::new(None, parse_address("to", &message.to)?);

    let mut builder = Message::builder().from(from).to(to);
    match parse_address("reply-to", &message.reply_to) {
        Ok(address) => builder = builder.reply_to(Mailbox::new(None, address)),
        Err(err) => warn!(error = %err, "Omitting Reply-To header"),
    }

    builder
        .subject(message.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| DispatchError::Build(e.to_string()))
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, DispatchError> {
    value
        .parse::<Address>()
        .map_err(|e| DispatchError::InvalidAddress {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The contact submission pipeline.
//!
//! A submission moves through validation, sanitization and composition
//! synchronously; dispatch is the only step that waits on anything. There
//! are no retries: a failed send is reported and forgotten.

use crate::config::MailConfig;
use crate::error::{AppError, ValidationError};
use crate::mailer::{MailDispatcher, OutboundMessage, Sender};
use crate::sanitizer::{capitalize, is_truthy, is_valid_email, js_string, sanitize};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Form fields as posted. Values are kept loosely typed: anything that is
/// not a string is treated as empty once sanitized.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub interest: Option<Value>,
}

impl ContactSubmission {
    /// Submission with plain string fields.
    pub fn new(name: &str, email: &str, message: &str) -> Self {
        Self {
            name: Some(Value::from(name)),
            email: Some(Value::from(email)),
            message: Some(Value::from(message)),
            interest: None,
        }
    }

    pub fn with_interest(mut self, interest: &str) -> Self {
        self.interest = Some(Value::from(interest));
        self
    }

    /// Presence and email format checks, in that order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(is_truthy(self.name.as_ref())
            && is_truthy(self.email.as_ref())
            && is_truthy(self.message.as_ref()))
        {
            return Err(ValidationError::MissingFields);
        }

        // Non-string values are checked in their string form, so `["a@b.com"]`
        // passes here and is rejected once sanitized.
        match &self.email {
            Some(email) if is_valid_email(&js_string(email)) => Ok(()),
            _ => Err(ValidationError::InvalidEmail),
        }
    }

    /// Escape every field. Fails if a required field is empty afterwards.
    pub fn sanitize(&self) -> Result<SanitizedSubmission, ValidationError> {
        let field = |v: &Option<Value>| v.as_ref().map(sanitize).unwrap_or_default();

        let sanitized = SanitizedSubmission {
            name: field(&self.name),
            email: field(&self.email),
            message: field(&self.message),
            interest: if is_truthy(self.interest.as_ref()) {
                field(&self.interest)
            } else {
                String::new()
            },
        };

        if sanitized.name.is_empty() || sanitized.email.is_empty() || sanitized.message.is_empty()
        {
            return Err(ValidationError::EmptyAfterSanitize);
        }
        Ok(sanitized)
    }
}

/// Escaped, trimmed form fields. `interest` is empty when not given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSubmission {
    name: String,
    email: String,
    message: String,
    interest: String,
}

impl SanitizedSubmission {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn interest(&self) -> Option<&str> {
        (!self.interest.is_empty()).then_some(self.interest.as_str())
    }

    /// Plain-text body: optional interest line, sender, then the message.
    pub fn body(&self) -> String {
        let main = format!(
            "From: {} ({})\n\nMessage:\n{}",
            self.name, self.email, self.message
        );
        match self.interest() {
            Some(interest) => format!("Interested in: {}\n\n{}", capitalize(interest), main),
            None => main,
        }
    }
}

/// Successful delivery, carrying the sanitized submitter address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub reply_to: String,
}

/// Validates, composes and dispatches contact submissions.
pub struct ContactService {
    sender: Sender,
    recipient: String,
    site_name: String,
    dispatcher: Arc<dyn MailDispatcher>,
}

impl ContactService {
    pub fn new(config: &MailConfig, dispatcher: Arc<dyn MailDispatcher>) -> Self {
        Self {
            sender: Sender {
                name: format!("{} Website", config.site_name),
                address: config.sender.clone(),
            },
            recipient: config.recipient().to_string(),
            site_name: config.site_name.clone(),
            dispatcher,
        }
    }

    /// Build the outbound message for an accepted submission.
    pub fn compose(&self, submission: &SanitizedSubmission) -> OutboundMessage {
        OutboundMessage {
            from: self.sender.clone(),
            reply_to: submission.email().to_string(),
            to: self.recipient.clone(),
            subject: format!("{} Inquiry from {}", self.site_name, submission.name()),
            body: submission.body(),
        }
    }

    /// Run a submission through the whole pipeline.
    pub async fn handle(&self, submission: &ContactSubmission) -> Result<Delivered, AppError> {
        debug!("Validating contact submission");
        submission.validate()?;

        debug!("Sanitizing contact submission");
        let sanitized = submission.sanitize()?;

        debug!("Composing contact message");
        let message = self.compose(&sanitized);

        debug!(to = %message.to, "Dispatching contact message");
        match self.dispatcher.send(&message).await {
            Ok(()) => {
                info!(email = %sanitized.email(), "Contact form submitted successfully");
                Ok(Delivered {
                    reply_to: message.reply_to,
                })
            }
            Err(err) => {
                error!(error = %err, "Error sending email");
                Err(AppError::Dispatch(err))
            }
        }
    }
}

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! In-memory mail dispatchers.

use async_trait::async_trait;
use contact_relay::mailer::{DispatchError, MailDispatcher, OutboundMessage};
use std::sync::Mutex;

/// Records every message it is asked to send.
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailDispatcher for RecordingDispatcher {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DispatchError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Rejects every message with a fixed transport error.
pub struct FailingDispatcher {
    pub reason: String,
}

#[async_trait]
impl MailDispatcher for FailingDispatcher {
    async fn send(&self, _message: &OutboundMessage) -> Result<(), DispatchError> {
        Err(DispatchError::Transport(self.reason.clone()))
    }
}

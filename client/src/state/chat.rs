//! Chat channel state machine.
//!
//! DESIGN
//! ======
//! `ChatState` owns the connection status, the message log and the reconnect
//! backoff, and knows nothing about sockets. The driver in `net::channel`
//! feeds it transport events and writes whatever outbound frames it returns,
//! which keeps every transition testable without a server.
//!
//! The log is append-only except for two operations: a `history` frame
//! replaces it wholesale, and a local delete removes one entry optimistically.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use std::time::Duration;

use frames::{ChatMessage, InboundFrame, OutboundFrame};
use tracing::{debug, warn};

use crate::config::ReconnectPolicy;

/// Connection status of the chat channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    /// Locale dictionary key for a connectivity indicator.
    #[must_use]
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Disconnected => "chat.disconnected",
            Self::Connecting => "chat.connecting",
            Self::Connected => "chat.connected",
        }
    }
}

/// Reconnect delay schedule. The attempt counter is incremented before the
/// delay is computed, so the first retry waits `base * 2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempt: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Advance the attempt counter and return `min(base * 2^attempt, max)`.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        let factor = 2_u64.checked_pow(self.attempt).unwrap_or(u64::MAX);
        let ms = self.policy.base_ms.saturating_mul(factor).min(self.policy.max_ms);
        Duration::from_millis(ms)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// What applying an inbound frame did to the log.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    HistoryReplaced(usize),
    Appended(ChatMessage),
    /// A `message` frame whose id is already in the log.
    Duplicate(String),
    /// Non-fatal server error text; the connection stays open.
    Notice(String),
}

#[derive(Clone, Debug)]
pub struct ChatState {
    status: ConnectionStatus,
    messages: Vec<ChatMessage>,
    backoff: Backoff,
}

impl ChatState {
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { status: ConnectionStatus::Disconnected, messages: Vec::new(), backoff: Backoff::new(policy) }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn reconnect_attempt(&self) -> u32 {
        self.backoff.attempt()
    }

    /// Start a connection attempt. Returns `false` (and changes nothing)
    /// when already connected.
    pub fn begin_connect(&mut self) -> bool {
        if self.status == ConnectionStatus::Connected {
            return false;
        }
        self.status = ConnectionStatus::Connecting;
        true
    }

    pub fn on_open(&mut self) {
        self.status = ConnectionStatus::Connected;
        self.backoff.reset();
    }

    /// Transport closed, failed, or never opened. Returns the reconnect delay.
    pub fn on_close(&mut self) -> Duration {
        self.status = ConnectionStatus::Disconnected;
        self.backoff.next_delay()
    }

    /// Explicit teardown: disconnected, no reconnect scheduled.
    pub fn on_teardown(&mut self) {
        self.status = ConnectionStatus::Disconnected;
    }

    pub fn apply(&mut self, frame: InboundFrame) -> ChatEvent {
        match frame {
            InboundFrame::History(messages) => {
                let count = messages.len();
                self.messages = messages;
                ChatEvent::HistoryReplaced(count)
            }
            InboundFrame::Message(message) => {
                if self.messages.iter().any(|m| m.id == message.id) {
                    debug!(id = %message.id, "duplicate chat message ignored");
                    ChatEvent::Duplicate(message.id)
                } else {
                    self.messages.push(message.clone());
                    ChatEvent::Appended(message)
                }
            }
            InboundFrame::Error(text) => {
                warn!(error = %text, "chat server error");
                ChatEvent::Notice(text)
            }
        }
    }

    /// Outbound frame for `text`, or `None` when not connected. Nothing is queued.
    #[must_use]
    pub fn send(&self, text: &str) -> Option<OutboundFrame> {
        if self.status != ConnectionStatus::Connected {
            warn!(status = ?self.status, "chat not connected; message dropped");
            return None;
        }
        Some(OutboundFrame::Message { text: text.to_owned() })
    }

    /// Outbound delete frame for `id`, removing the message locally at once.
    /// Returns `None` and leaves the log untouched when not connected.
    pub fn delete(&mut self, id: &str) -> Option<OutboundFrame> {
        if self.status != ConnectionStatus::Connected {
            warn!(status = ?self.status, id, "chat not connected; delete dropped");
            return None;
        }
        self.messages.retain(|m| m.id != id);
        Some(OutboundFrame::Delete { message_id: id.to_owned() })
    }
}

//! Shared wire model for the realtime chat channel and the REST backend.
//!
//! This crate owns every JSON shape the client exchanges with the backend.
//! Wire payloads are loosely typed (camelCase keys, optional fields that may be
//! absent or `null`, timestamps as RFC 3339 strings or epoch milliseconds), so
//! all "might be missing" handling lives here and callers only ever see the
//! normalized entities.

mod report;
mod timestamp;
mod user;

pub use report::{
    Category, Origin, PriceReport, ReportDraft, VoteCounts, VoteDirection, encode_draft, parse_report,
    parse_report_list, parse_vote_counts, vote_body,
};
pub use timestamp::{format_rfc3339, parse_rfc3339};
pub use user::{AuthSession, User, parse_auth_response, parse_user};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use timestamp::WireTimestamp;

/// Error returned by the decode/normalize helpers.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The payload was not valid JSON or did not match the expected shape.
    #[error("failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),
    /// A timestamp string could not be parsed as RFC 3339.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// A required field was absent, `null`, or empty.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

/// A single chat message as held in the channel client's log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// A decoded server-to-client frame.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundFrame {
    /// Full ordered history; replaces the local log.
    History(Vec<ChatMessage>),
    /// One live message to append.
    Message(ChatMessage),
    /// Non-fatal server notice.
    Error(String),
}

/// A client-to-server frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    Message {
        text: String,
    },
    Delete {
        #[serde(rename = "messageId")]
        message_id: String,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireInbound {
    History {
        #[serde(default)]
        messages: Option<Vec<Value>>,
    },
    Message {
        #[serde(default)]
        message: Option<Value>,
    },
    Error {
        #[serde(default)]
        message: Option<Value>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChatMessage {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, alias = "user_id")]
    user_id: Option<String>,
    #[serde(default, alias = "user_name")]
    user_name: Option<String>,
    #[serde(default, alias = "text", alias = "content")]
    message: Option<String>,
    #[serde(default)]
    timestamp: Option<WireTimestamp>,
}

/// Decode one text frame received from the chat channel.
///
/// `received_at_ms` stands in for messages that arrive without a timestamp.
/// Returns `Ok(None)` for frames that carry nothing actionable (unknown
/// `type`, or a `message` frame without a payload).
///
/// # Errors
///
/// Returns [`WireError::Decode`] when the text is not a JSON object with a
/// `type` tag, and propagates normalization errors for a `message` payload.
pub fn decode_inbound(text: &str, received_at_ms: i64) -> Result<Option<InboundFrame>, WireError> {
    let wire: WireInbound = serde_json::from_str(text)?;
    let frame = match wire {
        WireInbound::History { messages } => {
            let list = messages
                .unwrap_or_default()
                .into_iter()
                .filter_map(|item| parse_chat_message(item, received_at_ms).ok())
                .collect();
            Some(InboundFrame::History(list))
        }
        WireInbound::Message { message: Some(value) } => {
            Some(InboundFrame::Message(parse_chat_message(value, received_at_ms)?))
        }
        WireInbound::Message { message: None } | WireInbound::Unknown => None,
        WireInbound::Error { message } => {
            let text = match message {
                Some(Value::String(s)) => s,
                Some(Value::Null) | None => "unknown server error".to_owned(),
                Some(other) => other.to_string(),
            };
            Some(InboundFrame::Error(text))
        }
    };
    Ok(frame)
}

/// Encode an outbound frame as a JSON text payload.
///
/// # Errors
///
/// Returns [`WireError::Decode`] only if serialization fails, which does not
/// happen for the string-only payloads of [`OutboundFrame`].
pub fn encode_outbound(frame: &OutboundFrame) -> Result<String, WireError> {
    Ok(serde_json::to_string(frame)?)
}

/// Normalize one wire chat message.
///
/// # Errors
///
/// Returns [`WireError::MissingField`] when `id` or the message text is absent.
pub fn parse_chat_message(value: Value, received_at_ms: i64) -> Result<ChatMessage, WireError> {
    let wire: WireChatMessage = serde_json::from_value(value)?;
    let id = wire.id.as_ref().and_then(id_string).ok_or(WireError::MissingField("id"))?;
    let message = wire.message.ok_or(WireError::MissingField("message"))?;
    let timestamp = match wire.timestamp {
        Some(ts) => ts.into_millis()?,
        None => received_at_ms,
    };
    Ok(ChatMessage {
        id,
        user_id: non_empty(wire.user_id).unwrap_or_else(|| "unknown".to_owned()),
        user_name: non_empty(wire.user_name).unwrap_or_else(|| "Anonyme".to_owned()),
        message,
        timestamp,
    })
}

/// Accept string or numeric identities; anything else is treated as absent.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) }
    })
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod lib_test;

//! Message model for the conversation.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

/// Text shown while a query is in flight.
pub const PLACEHOLDER_TEXT: &str = "Analyzing your query...";

/// Prefix for every failed query.
pub const ERROR_PREFIX: &str = "Network error: ";

/// Substitute for fields the classifier left out.
pub const NOT_AVAILABLE: &str = "Not available";

/// Bot message seeded into every new conversation.
pub const WELCOME_TEXT: &str = "Justice AI - Legal Rights Assistant

Welcome! I’m your AI-powered assistant for Indian legal rights.
Ask me about laws, rights, or procedures.

1\u{fe0f}\u{20e3} My salary hasn’t been paid — what can I do?
2\u{fe0f}\u{20e3} Someone is harassing me online — how to report?";

/// Identifier of a message, unique within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Fixed id of the seeded welcome message.
    pub const WELCOME: Self = Self(1);

    /// Wrap a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.parse().map(Self)
    }
}

/// Time-based id source.
///
/// Ids follow the wall clock in milliseconds but never repeat: two ids
/// requested within the same millisecond are bumped by one.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    last: AtomicU64,
}

impl MessageIdGenerator {
    /// Create a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Next id, strictly greater than every previous one.
    #[must_use]
    pub fn next_id(&self) -> MessageId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let step = |last: u64| now.max(last.saturating_add(1));
        let previous = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(step(last)))
        {
            Ok(prev) | Err(prev) => prev,
        };
        MessageId(step(previous))
    }
}

/// Author of a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The person typing queries.
    User,
    /// The assistant.
    Bot,
}

impl Sender {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single chat bubble.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id.
    pub id: MessageId,
    /// Who wrote it.
    pub sender: Sender,
    /// Raw text; bot text is formatted at render time.
    pub text: String,
    /// True while this is an unresolved placeholder.
    pub pending: bool,
}

impl Message {
    /// Build a user message.
    #[must_use]
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::User,
            text: text.into(),
            pending: false,
        }
    }

    /// Build a settled bot message.
    #[must_use]
    pub fn bot(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::Bot,
            text: text.into(),
            pending: false,
        }
    }

    /// Build the bot placeholder shown while a query is in flight.
    #[must_use]
    pub fn placeholder(id: MessageId) -> Self {
        Self {
            pending: true,
            ..Self::bot(id, PLACEHOLDER_TEXT)
        }
    }

    /// Build the seeded welcome message.
    #[must_use]
    pub fn welcome() -> Self {
        Self::bot(MessageId::WELCOME, WELCOME_TEXT)
    }

    /// Whether the bot wrote this message.
    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

/// Body posted to the classifier.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct IncidentRequest {
    /// The user's raw description of what happened.
    pub incident: String,
}

/// Structured classification returned by the service.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteReply {
    /// Matched legal section.
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub section: String,
    /// Offense name.
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub offense: String,
    /// Description of the section.
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub description: String,
    /// Prescribed punishment.
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub punishment: String,
    /// Longer generated explanation.
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub more_details: String,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Accept strings, numbers, booleans and null for a text field.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => not_available(),
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_strictly_increasing() {
        let ids = MessageIdGenerator::new();
        let mut last = ids.next_id();
        for _ in 0..1000 {
            let next = ids.next_id();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_ids_follow_the_clock() {
        let ids = MessageIdGenerator::new();
        let before = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        assert!(ids.next_id().0 >= before);
    }

    #[test]
    fn test_message_id_round_trips_as_string() {
        let id = MessageId::new(1_700_000_000_123);
        assert_eq!(id.to_string().parse::<MessageId>().ok(), Some(id));
    }

    #[test]
    fn test_welcome_text_keeps_typographic_apostrophes() {
        assert!(WELCOME_TEXT.contains("I\u{2019}m your AI-powered assistant"));
        assert!(WELCOME_TEXT.contains("hasn\u{2019}t been paid"));
        assert!(!WELCOME_TEXT.contains('\''));
    }

    #[test]
    fn test_placeholder_is_pending_bot_message() {
        let msg = Message::placeholder(MessageId::new(7));
        assert!(msg.pending);
        assert!(msg.is_bot());
        assert_eq!(msg.text, PLACEHOLDER_TEXT);
    }

    #[test]
    fn test_reply_missing_and_null_fields() {
        let reply: Result<RemoteReply, _> = serde_json::from_str(
            r#"{"section": 406, "offense": null, "description": "Breach of trust", "punishment": "3 years"}"#,
        );
        let reply = reply.ok();
        assert_eq!(reply.as_ref().map(|r| r.section.as_str()), Some("406"));
        assert_eq!(reply.as_ref().map(|r| r.offense.as_str()), Some(NOT_AVAILABLE));
        assert_eq!(reply.as_ref().map(|r| r.more_details.as_str()), Some(NOT_AVAILABLE));
    }

    #[test]
    fn test_reply_reads_camel_case() {
        let reply: Result<RemoteReply, _> =
            serde_json::from_str(r#"{"moreDetails": "- point one"}"#);
        assert_eq!(
            reply.ok().map(|r| r.more_details),
            Some("- point one".to_string())
        );
    }

    #[test]
    fn test_incident_request_shape() {
        let body = serde_json::to_string(&IncidentRequest {
            incident: "My boss didn't pay me".to_string(),
        })
        .ok();
        assert_eq!(
            body.as_deref(),
            Some(r#"{"incident":"My boss didn't pay me"}"#)
        );
    }
}

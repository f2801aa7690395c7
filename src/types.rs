use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A chat message previously recorded by the embedding application's storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub group_id: String,
    pub user_name: String,
    pub content: String,
    pub message_id: String,
    pub time_stamp: i64,
}

impl StoredMessage {
    /// Permalink to this message under `base`.
    ///
    /// The numeric chat segment is taken from `group_id` with its two-character
    /// prefix removed (`-1001234567` -> `1234567`). Returns `None` when no
    /// digits follow the prefix.
    pub fn link(&self, base: &str) -> Option<String> {
        let rest = self.group_id.get(2..)?;
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        let chat: u64 = digits.parse().ok()?;
        Some(format!(
            "{}/c/{}/{}",
            base.trim_end_matches('/'),
            chat,
            self.message_id
        ))
    }
}

/// Something a handler wants sent back to the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundReply {
    Text { text: String },
    Query { payload: Vec<StoredMessage> },
}

impl OutboundReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn query(payload: Vec<StoredMessage>) -> Self {
        Self::Query { payload }
    }
}

impl From<&str> for OutboundReply {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for OutboundReply {
    fn from(text: String) -> Self {
        Self::Text { text }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoReference {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub file_id: PhotoReference,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    #[default]
    Message,
    Photo,
    Command,
}

/// Only group chats exist in the simulated platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    #[default]
    Group,
}

/// Platform ids arrive as strings or bare integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chat {
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sender {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
}

/// The chat message inside an update. Every field may be absent: scheduled
/// events carry no message at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomingMessage {
    pub photo: Vec<Photo>,
    pub from: Sender,
    pub chat: Chat,
    pub text: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub message_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Update {
    pub message: IncomingMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    #[serde(default)]
    pub api: String,
}

/// Decoded `payload` of an inbound request: one simulated chat-platform update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomingUpdate {
    pub update_type: UpdateType,
    pub update: Update,
    pub bot: BotInfo,
}

impl IncomingUpdate {
    /// Decode a raw request payload. A missing (`null`) payload is an empty update;
    /// fields that are present must still have the right shape.
    pub fn from_payload(payload: serde_json::Value) -> serde_json::Result<Self> {
        if payload.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(payload)
    }
}

/// Request body envelope. The payload is kept raw until the event is routed.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<OutboundReply>,
}

/// Target of a reply in a platform-style direct send. `-1` on the wire means none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyTarget {
    #[default]
    None,
    Message(i64),
}

impl Serialize for ReplyTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReplyTarget::None => serializer.serialize_i64(-1),
            ReplyTarget::Message(id) => serializer.serialize_str(&id.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for ReplyTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = match RawId::deserialize(deserializer)? {
            RawId::Number(n) => n,
            RawId::Text(s) => s.parse().map_err(serde::de::Error::custom)?,
        };
        Ok(if id == -1 {
            ReplyTarget::None
        } else {
            ReplyTarget::Message(id)
        })
    }
}

/// Message shape accepted by `api().send_message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub chat_id: String,
    #[serde(default)]
    pub parse_mode: String,
    pub text: String,
    #[serde(default)]
    pub reply_to_message_id: ReplyTarget,
}

impl OutgoingMessage {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            parse_mode: String::new(),
            text: text.into(),
            reply_to_message_id: ReplyTarget::None,
        }
    }

    pub fn parse_mode(mut self, mode: impl Into<String>) -> Self {
        self.parse_mode = mode.into();
        self
    }
}

/// The fixed set of events a handler can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Status,
    Query,
    Ask,
    Summary,
    Message,
    Schedule,
}

impl EventName {
    pub const ALL: [EventName; 6] = [
        EventName::Status,
        EventName::Query,
        EventName::Ask,
        EventName::Summary,
        EventName::Message,
        EventName::Schedule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Status => "status",
            EventName::Query => "query",
            EventName::Ask => "ask",
            EventName::Summary => "summary",
            EventName::Message => ":message",
            EventName::Schedule => ":schedule",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventName::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown event: {}", s))
    }
}

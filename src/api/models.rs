use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One chat thread as listed by `GET /api/chats`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "avatar", default)]
    pub avatar_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "last_message", default)]
    pub last_message_preview: Option<String>,
    #[serde(rename = "last_message_time", default, deserialize_with = "opt_timestamp")]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(rename = "last_seen", default)]
    pub presence: Presence,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(rename = "ai_personality", default)]
    pub personality: Option<String>,
}

impl Conversation {
    pub fn is_unread(&self) -> bool {
        self.unread_count > 0
    }

    /// Badge count, absent when nothing is unread.
    pub fn unread_badge(&self) -> Option<u32> {
        self.is_unread().then_some(self.unread_count)
    }

    /// Second line of a list row: the last message, else the description.
    pub fn preview_text(&self) -> &str {
        self.last_message_preview
            .as_deref()
            .unwrap_or(&self.description)
    }

    /// `needle` must already be lowercased.
    pub(crate) fn matches_search(&self, needle: &str) -> bool {
        self.display_name.to_lowercase().contains(needle)
            || self
                .last_message_preview
                .as_deref()
                .is_some_and(|preview| preview.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Presence {
    Online,
    #[default]
    Offline,
}

impl From<String> for Presence {
    // The server sends either the literal token "online" or a free-form
    // "last seen" phrase.
    fn from(last_seen: String) -> Self {
        if last_seen == "online" {
            Presence::Online
        } else {
            Presence::Offline
        }
    }
}

/// One entry of `GET /api/chats/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "chat_id")]
    pub conversation_id: String,
    #[serde(rename = "sender_type")]
    pub sender_kind: SenderKind,
    pub sender_name: String,
    #[serde(rename = "content")]
    pub text: String,
    #[serde(rename = "timestamp", deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "message_status", default)]
    pub delivery_status: DeliveryStatus,
    #[serde(rename = "message_type", default)]
    pub kind: MessageKind,
}

impl Message {
    pub fn is_own(&self) -> bool {
        self.sender_kind == SenderKind::User
    }

    /// Delivery ticks for the user's own messages; counterpart messages have none.
    pub fn status_glyph(&self) -> Option<StatusGlyph> {
        self.is_own().then(|| self.delivery_status.glyph())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SenderKind {
    User,
    Counterpart,
}

impl From<String> for SenderKind {
    fn from(raw: String) -> Self {
        if raw == "user" {
            SenderKind::User
        } else {
            SenderKind::Counterpart
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum DeliveryStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl From<String> for DeliveryStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "delivered" => DeliveryStatus::Delivered,
            "read" => DeliveryStatus::Read,
            _ => DeliveryStatus::Sent,
        }
    }
}

impl DeliveryStatus {
    pub fn glyph(self) -> StatusGlyph {
        match self {
            DeliveryStatus::Sent => StatusGlyph {
                ticks: Ticks::Single,
                highlighted: false,
            },
            DeliveryStatus::Delivered => StatusGlyph {
                ticks: Ticks::Double,
                highlighted: false,
            },
            DeliveryStatus::Read => StatusGlyph {
                ticks: Ticks::Double,
                highlighted: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ticks {
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusGlyph {
    pub ticks: Ticks,
    /// Drawn in the "read" color.
    pub highlighted: bool,
}

impl StatusGlyph {
    pub fn as_str(&self) -> &'static str {
        match self.ticks {
            Ticks::Single => "✓",
            Ticks::Double => "✓✓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Audio,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageBody<'a> {
    pub chat_id: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Banner {
    #[serde(default)]
    pub message: String,
}

// The backend writes naive UTC datetimes (no offset); accept RFC 3339 too.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()),
    }
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse_timestamp(&s).map_err(serde::de::Error::custom))
        .transpose()
}
